//! Nested object dependencies.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::builder::{NestedRequest, Scope};
use super::overrides::Overrides;
use super::registry::Registry;
use crate::error::FactoryResult;
use crate::model::Model;

/// How an instance leaves the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
	/// Construct only.
	Build,
	/// Construct, then hand the instance to the storage callback.
	#[default]
	Create,
}

impl fmt::Display for Strategy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Strategy::Build => write!(f, "build"),
			Strategy::Create => write!(f, "create"),
		}
	}
}

/// Type-erased access to the factory of an associated model.
trait AssociationTarget: Send + Sync {
	fn model_name(&self) -> &'static str;

	fn produce(&self, registry: &Registry, request: NestedRequest) -> FactoryResult<Value>;
}

struct TypedTarget<M>(PhantomData<fn() -> M>);

impl<M: Model> AssociationTarget for TypedTarget<M> {
	fn model_name(&self) -> &'static str {
		M::model_name()
	}

	fn produce(&self, registry: &Registry, request: NestedRequest) -> FactoryResult<Value> {
		let instance: M = registry.produce_nested(request)?;
		Ok(serde_json::to_value(&instance)?)
	}
}

/// Attribute whose value is an instance produced by another factory.
///
/// ```
/// use genuine_factory::{Association, Model, Overrides, Strategy};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct User {
///     name: String,
/// }
///
/// impl Model for User {}
///
/// let author = Association::to::<User>()
///     .with_alias("author")
///     .with_traits(["admin"])
///     .with_overrides(Overrides::new().set("name", "Gary"))
///     .with_strategy(Strategy::Build);
/// assert_eq!(author.alias(), Some("author"));
/// ```
#[derive(Clone)]
pub struct Association {
	target: Arc<dyn AssociationTarget>,
	alias: Option<String>,
	traits: Vec<String>,
	overrides: Overrides,
	strategy: Option<Strategy>,
}

impl Association {
	/// Associates the default factory of `M`.
	pub fn to<M: Model>() -> Self {
		Self {
			target: Arc::new(TypedTarget::<M>(PhantomData)),
			alias: None,
			traits: Vec::new(),
			overrides: Overrides::new(),
			strategy: None,
		}
	}

	/// Targets the factory registered under `alias`.
	pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
		self.alias = Some(alias.into());
		self
	}

	/// Traits applied to the associated factory.
	pub fn with_traits<I, S>(mut self, traits: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.traits.extend(traits.into_iter().map(Into::into));
		self
	}

	/// Overrides applied to the associated factory.
	pub fn with_overrides(mut self, overrides: Overrides) -> Self {
		self.overrides.layer(&overrides);
		self
	}

	/// Build or create the associated instance.
	///
	/// Without an explicit strategy the registry default applies, which is
	/// [`Strategy::Create`] unless configured otherwise.
	pub fn with_strategy(mut self, strategy: Strategy) -> Self {
		self.strategy = Some(strategy);
		self
	}

	/// Name of the associated model.
	pub fn model_name(&self) -> &'static str {
		self.target.model_name()
	}

	/// Alias of the associated factory.
	pub fn alias(&self) -> Option<&str> {
		self.alias.as_deref()
	}

	/// Declared strategy.
	pub fn strategy(&self) -> Option<Strategy> {
		self.strategy
	}

	/// Overrides forwarded to the associated factory.
	pub fn overrides(&self) -> &Overrides {
		&self.overrides
	}

	pub(crate) fn lookups(&self) -> Vec<String> {
		self.overrides.lookups()
	}

	/// Layers caller overrides for this association level.
	pub(crate) fn apply_overrides(&mut self, overrides: &Overrides) {
		self.overrides.layer(overrides);
		if let Some(strategy) = overrides.strategy() {
			self.strategy = Some(strategy);
		}
	}

	/// Produces the associated instance as an attribute value.
	///
	/// `resolve` reads values of the enclosing context for lookups.
	pub(crate) fn produce<'a, F>(
		&self,
		registry: &Registry,
		resolve: F,
		scope: Scope,
	) -> FactoryResult<Value>
	where
		F: Fn(&str) -> Option<&'a Value>,
	{
		let overrides = self.overrides.bind_lookups(resolve)?;
		let strategy = self
			.strategy
			.unwrap_or(registry.settings().default_association_strategy);
		self.target.produce(
			registry,
			NestedRequest {
				alias: self.alias.clone(),
				traits: self.traits.clone(),
				overrides,
				strategy,
				scope: scope.descend(),
			},
		)
	}
}

impl fmt::Debug for Association {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Association")
			.field("model", &self.model_name())
			.field("alias", &self.alias)
			.field("traits", &self.traits)
			.field("overrides", &self.overrides)
			.field("strategy", &self.strategy)
			.finish()
	}
}
