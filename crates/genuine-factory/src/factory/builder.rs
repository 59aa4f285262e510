//! Build pipeline.
//!
//! Every request walks the same states: attributes are resolved, the instance
//! is constructed and `after_build` hooks run, then for `create` the storage
//! step runs between `before_create` and `after_create` hooks, and finally the
//! refinement callback may replace the instance.

use std::fmt;
use std::sync::Arc;

use super::association::Strategy;
use super::definition::{HookPoint, RefineFn, StorageFn};
use super::overrides::{Override, Overrides};
use super::registry::Registry;
use super::resolver::Plan;
use crate::context::Context;
use crate::error::{FactoryError, FactoryResult};
use crate::model::{Model, instantiate};

/// Parameters of one `build`, `create` or `attributes_for` call.
///
/// ```
/// use genuine_factory::{BuildRequest, Model, Overrides};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct User {
///     name: String,
/// }
///
/// impl Model for User {}
///
/// let request = BuildRequest::<User>::new()
///     .with_alias("admin")
///     .with_traits(["active", "verified"])
///     .with_override("name", "Gary")
///     .with_refine(|user, _| {
///         user.name.push('!');
///         Ok(None)
///     });
/// assert_eq!(request.traits(), ["active", "verified"]);
/// ```
pub struct BuildRequest<M: Model> {
	alias: Option<String>,
	traits: Vec<String>,
	overrides: Overrides,
	refine: Option<RefineFn<M>>,
	storage: Option<StorageFn<M>>,
}

impl<M: Model> BuildRequest<M> {
	/// Request for the default factory, without traits or overrides.
	pub fn new() -> Self {
		Self {
			alias: None,
			traits: Vec::new(),
			overrides: Overrides::new(),
			refine: None,
			storage: None,
		}
	}

	/// Targets the factory registered under `alias`.
	pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
		self.alias = Some(alias.into());
		self
	}

	/// Requests one more trait.
	pub fn with_trait(mut self, name: impl Into<String>) -> Self {
		self.traits.push(name.into());
		self
	}

	/// Requests several traits, applied in iteration order.
	pub fn with_traits<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.traits.extend(names.into_iter().map(Into::into));
		self
	}

	/// Overrides one attribute.
	pub fn with_override(mut self, name: impl Into<String>, value: impl Into<Override>) -> Self {
		self.overrides.insert(name, value);
		self
	}

	/// Layers `overrides` on top of the current ones.
	pub fn with_overrides(mut self, overrides: Overrides) -> Self {
		self.overrides.layer(&overrides);
		self
	}

	/// Sets the callback applied last. Returning `Some` replaces the instance.
	pub fn with_refine<F>(mut self, refine: F) -> Self
	where
		F: Fn(&mut M, &Context) -> anyhow::Result<Option<M>> + Send + Sync + 'static,
	{
		self.refine = Some(Arc::new(refine));
		self
	}

	/// Replaces the factory storage for this request.
	///
	/// Only the requested instance is affected; associations keep the storage
	/// of their own factories.
	pub fn with_storage<F>(mut self, storage: F) -> Self
	where
		F: Fn(&mut M, &Context) -> anyhow::Result<()> + Send + Sync + 'static,
	{
		self.storage = Some(Arc::new(storage));
		self
	}

	/// Requested alias.
	pub fn alias(&self) -> Option<&str> {
		self.alias.as_deref()
	}

	/// Requested traits, in order.
	pub fn traits(&self) -> &[String] {
		&self.traits
	}

	/// Caller overrides.
	pub fn overrides(&self) -> &Overrides {
		&self.overrides
	}
}

impl<M: Model> Default for BuildRequest<M> {
	fn default() -> Self {
		Self::new()
	}
}

impl<M: Model> Clone for BuildRequest<M> {
	fn clone(&self) -> Self {
		Self {
			alias: self.alias.clone(),
			traits: self.traits.clone(),
			overrides: self.overrides.clone(),
			refine: self.refine.clone(),
			storage: self.storage.clone(),
		}
	}
}

impl<M: Model> fmt::Debug for BuildRequest<M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BuildRequest")
			.field("model", &M::model_name())
			.field("alias", &self.alias)
			.field("traits", &self.traits)
			.field("overrides", &self.overrides)
			.field("refine", &self.refine.is_some())
			.field("storage", &self.storage.is_some())
			.finish()
	}
}

/// Position of a pipeline run in the association tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Scope {
	pub(crate) depth: usize,
	pub(crate) storage_allowed: bool,
}

impl Scope {
	pub(crate) fn root() -> Self {
		Self {
			depth: 0,
			storage_allowed: true,
		}
	}

	/// Root scope of `attributes_for`: nothing below it is stored.
	pub(crate) fn detached() -> Self {
		Self {
			depth: 0,
			storage_allowed: false,
		}
	}

	pub(crate) fn descend(self) -> Self {
		Self {
			depth: self.depth + 1,
			..self
		}
	}
}

/// Request issued by an association to the factory of its target.
pub(crate) struct NestedRequest {
	pub(crate) alias: Option<String>,
	pub(crate) traits: Vec<String>,
	pub(crate) overrides: Overrides,
	pub(crate) strategy: Strategy,
	pub(crate) scope: Scope,
}

#[derive(Debug, Clone, Copy)]
enum Stage {
	Init,
	AttributesResolved,
	Instantiated,
	Stored,
	Refined,
	Done,
}

impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Stage::Init => "init",
			Stage::AttributesResolved => "attributes_resolved",
			Stage::Instantiated => "instantiated",
			Stage::Stored => "stored",
			Stage::Refined => "refined",
			Stage::Done => "done",
		};
		f.write_str(name)
	}
}

struct Pipeline<'r, M: Model> {
	registry: &'r Registry,
	plan: Plan<M>,
	strategy: Strategy,
	scope: Scope,
	refine: Option<RefineFn<M>>,
	storage: Option<StorageFn<M>>,
}

impl<'r, M: Model> Pipeline<'r, M> {
	#[allow(clippy::too_many_arguments)]
	fn prepare(
		registry: &'r Registry,
		alias: Option<&str>,
		traits: &[String],
		overrides: &Overrides,
		strategy: Strategy,
		scope: Scope,
		refine: Option<RefineFn<M>>,
		storage: Option<StorageFn<M>>,
	) -> FactoryResult<Self> {
		let factory = registry.resolve_factory::<M>(alias)?;
		let plan = Plan::prepare(&factory, traits, overrides, registry.settings())?;
		let storage = storage.or_else(|| plan.storage.clone());
		Ok(Self {
			registry,
			plan,
			strategy,
			scope,
			refine,
			storage,
		})
	}

	fn from_request(
		registry: &'r Registry,
		request: &BuildRequest<M>,
		strategy: Strategy,
		scope: Scope,
	) -> FactoryResult<Self> {
		Self::prepare(
			registry,
			request.alias(),
			request.traits(),
			request.overrides(),
			strategy,
			scope,
			request.refine.clone(),
			request.storage.clone(),
		)
	}

	fn transition(&self, stage: Stage) {
		tracing::trace!(
			model = M::model_name(),
			strategy = %self.strategy,
			depth = self.scope.depth,
			stage = %stage,
			"factory pipeline transition"
		);
	}

	fn context(&self) -> FactoryResult<Context> {
		self.transition(Stage::Init);
		let context = self.plan.resolve(self.registry, self.scope)?;
		self.transition(Stage::AttributesResolved);
		Ok(context)
	}

	fn run_hooks(&self, point: HookPoint, instance: &mut M, context: &Context) -> FactoryResult<()> {
		for hook in self.plan.hooks.get(point) {
			hook(&mut *instance, context).map_err(|source| FactoryError::Hook {
				model: M::model_name().to_string(),
				point,
				source,
			})?;
		}
		Ok(())
	}

	fn store(&self, instance: &mut M, context: &Context) -> FactoryResult<()> {
		self.run_hooks(HookPoint::BeforeCreate, instance, context)?;
		match &self.storage {
			Some(storage) => storage(&mut *instance, context).map_err(|source| FactoryError::Storage {
				model: M::model_name().to_string(),
				source,
			})?,
			None => tracing::debug!(
				model = M::model_name(),
				"no storage configured, instance is not persisted"
			),
		}
		self.run_hooks(HookPoint::AfterCreate, instance, context)
	}

	fn run(&self) -> FactoryResult<M> {
		let context = self.context()?;

		let mut instance: M = instantiate(context.attributes())?;
		self.run_hooks(HookPoint::AfterBuild, &mut instance, &context)?;
		self.transition(Stage::Instantiated);

		if self.strategy == Strategy::Create {
			self.store(&mut instance, &context)?;
			self.transition(Stage::Stored);
		}

		if let Some(refine) = &self.refine {
			let replacement = refine(&mut instance, &context).map_err(|source| {
				FactoryError::Refine {
					model: M::model_name().to_string(),
					source,
				}
			})?;
			if let Some(replacement) = replacement {
				instance = replacement;
			}
			self.transition(Stage::Refined);
		}

		self.transition(Stage::Done);
		Ok(instance)
	}
}

impl Registry {
	/// Builds an instance without storing it.
	///
	/// Associations still follow their own strategy, which is `create` unless
	/// declared otherwise.
	pub fn build<M: Model>(&self, request: BuildRequest<M>) -> FactoryResult<M> {
		Pipeline::from_request(self, &request, Strategy::Build, Scope::root())?.run()
	}

	/// Builds `count` instances.
	///
	/// The definition is layered once; generator state advances across the
	/// instances exactly as for `count` separate `build` calls.
	pub fn build_many<M: Model>(
		&self,
		count: usize,
		request: BuildRequest<M>,
	) -> FactoryResult<Vec<M>> {
		let pipeline = Pipeline::from_request(self, &request, Strategy::Build, Scope::root())?;
		(0..count).map(|_| pipeline.run()).collect()
	}

	/// Builds an instance and hands it to the storage callback.
	pub fn create<M: Model>(&self, request: BuildRequest<M>) -> FactoryResult<M> {
		Pipeline::from_request(self, &request, Strategy::Create, Scope::root())?.run()
	}

	/// Creates `count` instances.
	pub fn create_many<M: Model>(
		&self,
		count: usize,
		request: BuildRequest<M>,
	) -> FactoryResult<Vec<M>> {
		let pipeline = Pipeline::from_request(self, &request, Strategy::Create, Scope::root())?;
		(0..count).map(|_| pipeline.run()).collect()
	}

	/// Resolves attributes without constructing an instance.
	///
	/// Associations are built, never stored, and no hook runs for the
	/// requested model.
	pub fn attributes_for<M: Model>(&self, request: BuildRequest<M>) -> FactoryResult<Context> {
		Pipeline::from_request(self, &request, Strategy::Build, Scope::detached())?.context()
	}

	pub(crate) fn produce_nested<M: Model>(&self, request: NestedRequest) -> FactoryResult<M> {
		let max_depth = self.settings().max_association_depth;
		if request.scope.depth > max_depth {
			return Err(FactoryError::AssociationDepthExceeded(max_depth));
		}
		let strategy = if request.scope.storage_allowed {
			request.strategy
		} else {
			Strategy::Build
		};
		Pipeline::prepare(
			self,
			request.alias.as_deref(),
			&request.traits,
			&request.overrides,
			strategy,
			request.scope,
			None,
			None,
		)?
		.run()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde::{Deserialize, Serialize};
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
	struct Ticket {
		code: String,
		stored: bool,
	}

	impl Model for Ticket {}

	fn registry() -> Registry {
		let registry = Registry::new();
		registry
			.define_factory::<Ticket, _>(None, |factory| {
				factory.set("code", "T-1").set("stored", false);
				factory.storage(|ticket, _| {
					ticket.stored = true;
					Ok(())
				});
				Ok(())
			})
			.unwrap();
		registry
	}

	#[rstest]
	fn test_scope_descend_keeps_storage_flag() {
		let scope = Scope::detached().descend().descend();

		assert_eq!(scope.depth, 2);
		assert!(!scope.storage_allowed);
	}

	#[rstest]
	fn test_build_skips_storage() {
		let ticket = registry().build(BuildRequest::<Ticket>::new()).unwrap();

		assert!(!ticket.stored);
	}

	#[rstest]
	fn test_create_runs_storage() {
		let ticket = registry().create(BuildRequest::<Ticket>::new()).unwrap();

		assert!(ticket.stored);
	}

	#[rstest]
	fn test_request_storage_replaces_factory_storage() {
		// Arrange
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&calls);
		let request = BuildRequest::<Ticket>::new().with_storage(move |_, _| {
			counter.fetch_add(1, Ordering::SeqCst);
			Ok(())
		});

		// Act
		let tickets = registry().create_many(2, request).unwrap();

		// Assert
		assert_eq!(calls.load(Ordering::SeqCst), 2);
		assert!(tickets.iter().all(|ticket| !ticket.stored));
	}

	#[rstest]
	fn test_refine_replaces_instance() {
		let request = BuildRequest::<Ticket>::new().with_refine(|ticket, _| {
			Ok(Some(Ticket {
				code: format!("{}-refined", ticket.code),
				stored: ticket.stored,
			}))
		});

		let ticket = registry().build(request).unwrap();

		assert_eq!(ticket.code, "T-1-refined");
	}

	#[rstest]
	fn test_storage_failure_propagates() {
		let request =
			BuildRequest::<Ticket>::new().with_storage(|_, _| Err(anyhow::anyhow!("disk full")));

		let result = registry().create(request);

		assert!(matches!(result, Err(FactoryError::Storage { model, .. }) if model == "Ticket"));
	}

	#[rstest]
	fn test_request_builder_layers_overrides() {
		let request = BuildRequest::<Ticket>::new()
			.with_override("code", "A")
			.with_overrides(Overrides::new().set("code", "B"))
			.with_trait("x");

		assert_eq!(request.overrides().len(), 1);
		assert_eq!(request.traits(), ["x".to_string()]);
		assert_eq!(request.alias(), None);
	}
}
