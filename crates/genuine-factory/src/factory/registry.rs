//! Factory registry.
//!
//! Factories are keyed by model type and alias. A [`Registry`] can be created
//! and injected explicitly; the free functions of this module operate on a
//! process-wide instance.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use super::builder::BuildRequest;
use super::definition::{Factory, FactoryDefinition};
use crate::context::Context;
use crate::error::{FactoryError, FactoryResult};
use crate::model::Model;
use crate::settings::FactorySettings;

type FactoryKey = (TypeId, Option<String>);

/// Mapping of (model type, alias) to [`Factory`].
///
/// # Example
///
/// ```
/// use genuine_factory::{BuildRequest, Model, Registry};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct User {
///     given_name: String,
///     family_name: String,
/// }
///
/// impl Model for User {}
///
/// let registry = Registry::new();
/// registry
///     .define_factory::<User, _>(None, |factory| {
///         factory.set("given_name", "John");
///         Ok(())
///     })
///     .unwrap();
/// registry
///     .define_factory::<User, _>(None, |factory| {
///         factory.set("family_name", "Smith");
///         Ok(())
///     })
///     .unwrap();
///
/// let user: User = registry.build(BuildRequest::new()).unwrap();
/// assert_eq!(user.given_name, "John");
/// assert_eq!(user.family_name, "Smith");
/// ```
pub struct Registry {
	factories: RwLock<HashMap<FactoryKey, Arc<dyn Any + Send + Sync>>>,
	settings: FactorySettings,
}

impl Registry {
	/// Creates an empty registry with default settings.
	pub fn new() -> Self {
		Self::with_settings(FactorySettings::default())
	}

	/// Creates an empty registry.
	pub fn with_settings(settings: FactorySettings) -> Self {
		Self {
			factories: RwLock::new(HashMap::new()),
			settings,
		}
	}

	/// Settings of this registry.
	pub fn settings(&self) -> &FactorySettings {
		&self.settings
	}

	fn key<M: Model>(alias: Option<&str>) -> FactoryKey {
		(TypeId::of::<M>(), alias.map(str::to_string))
	}

	fn downcast<M: Model>(
		entry: &Arc<dyn Any + Send + Sync>,
		alias: Option<&str>,
	) -> FactoryResult<Arc<Factory<M>>> {
		Arc::clone(entry)
			.downcast::<Factory<M>>()
			.map_err(|_| not_found::<M>(alias))
	}

	/// Returns the factory registered for `M` under `alias`.
	pub fn resolve_factory<M: Model>(&self, alias: Option<&str>) -> FactoryResult<Arc<Factory<M>>> {
		let factories = self.factories.read();
		let entry = factories
			.get(&Self::key::<M>(alias))
			.ok_or_else(|| not_found::<M>(alias))?;
		Self::downcast(entry, alias)
	}

	/// Returns true if a factory is registered for `M` under `alias`.
	pub fn has_factory<M: Model>(&self, alias: Option<&str>) -> bool {
		self.factories.read().contains_key(&Self::key::<M>(alias))
	}

	/// Acquires the factory of `M` under `alias` and configures it.
	///
	/// The first call for a (model, alias) pair registers the factory, later
	/// calls return the same instance and accumulate their mutations. An
	/// aliased factory derives from the default factory of `M`, which is
	/// registered on the way if needed.
	///
	/// Mutations applied before `configure` fails are kept.
	pub fn define_factory<M, F>(
		&self,
		alias: Option<&str>,
		configure: F,
	) -> FactoryResult<Arc<Factory<M>>>
	where
		M: Model,
		F: FnOnce(&FactoryDefinition<'_, M>) -> FactoryResult<()>,
	{
		let factory = self.get_or_define::<M>(alias)?;
		configure(&FactoryDefinition::new(self, Arc::clone(&factory)))?;
		Ok(factory)
	}

	/// Applies one configuration to the factories of several aliases.
	///
	/// `configure` runs once per alias. A [`Cycle`](super::Cycle) or
	/// [`Sequence`](super::Sequence) constructed inside it therefore gets its
	/// own counter for every alias. Construct the generator outside and clone
	/// it in to share one counter across all of them.
	pub fn define_factories<'a, M, I, F>(
		&self,
		aliases: I,
		configure: F,
	) -> FactoryResult<Vec<Arc<Factory<M>>>>
	where
		M: Model,
		I: IntoIterator<Item = Option<&'a str>>,
		F: Fn(&FactoryDefinition<'_, M>) -> FactoryResult<()>,
	{
		aliases
			.into_iter()
			.map(|alias| self.define_factory(alias, &configure))
			.collect()
	}

	fn get_or_define<M: Model>(&self, alias: Option<&str>) -> FactoryResult<Arc<Factory<M>>> {
		if alias == Some("") {
			return Err(FactoryError::InvalidDefinition(format!(
				"empty alias for {}",
				M::model_name()
			)));
		}

		let mut factories = self.factories.write();
		let default = match factories.get(&Self::key::<M>(None)) {
			Some(entry) => Self::downcast::<M>(entry, None)?,
			None => {
				tracing::debug!(model = M::model_name(), "registering default factory");
				let factory = Arc::new(Factory::<M>::new(None, None));
				let entry: Arc<dyn Any + Send + Sync> = factory.clone();
				factories.insert(Self::key::<M>(None), entry);
				factory
			}
		};

		let Some(alias) = alias else {
			return Ok(default);
		};
		if let Some(entry) = factories.get(&Self::key::<M>(Some(alias))) {
			return Self::downcast(entry, Some(alias));
		}

		tracing::debug!(
			model = M::model_name(),
			alias,
			"registering aliased factory derived from default"
		);
		let factory = Arc::new(Factory::new(Some(alias.to_string()), Some(&default)));
		let entry: Arc<dyn Any + Send + Sync> = factory.clone();
		factories.insert(Self::key::<M>(Some(alias)), entry);
		Ok(factory)
	}

	/// Returns the factory `name` derived from `parent`, registering it on
	/// first use.
	pub(crate) fn derive_factory<M: Model>(
		&self,
		parent: &Arc<Factory<M>>,
		name: &str,
	) -> FactoryResult<Arc<Factory<M>>> {
		if name.is_empty() {
			return Err(FactoryError::InvalidDefinition(format!(
				"derived factory of {} needs a name",
				M::model_name()
			)));
		}

		let mut factories = self.factories.write();
		let key = Self::key::<M>(Some(name));
		if let Some(entry) = factories.get(&key) {
			let existing = Self::downcast::<M>(entry, Some(name))?;
			if existing.is_derived_from(parent) {
				return Ok(existing);
			}
			let current = existing
				.parent()
				.and_then(|factory| factory.alias().map(str::to_string))
				.unwrap_or_else(|| "<default>".to_string());
			return Err(FactoryError::DuplicateDefinition {
				model: M::model_name().to_string(),
				alias: name.to_string(),
				message: format!(
					"cannot derive from {}, already derived from {}",
					parent.alias().unwrap_or("<default>"),
					current
				),
			});
		}

		tracing::debug!(
			model = M::model_name(),
			alias = name,
			parent = parent.alias().unwrap_or("<default>"),
			"registering derived factory"
		);
		let factory = Arc::new(Factory::new(Some(name.to_string()), Some(parent)));
		let entry: Arc<dyn Any + Send + Sync> = factory.clone();
		factories.insert(key, entry);
		Ok(factory)
	}

	/// Number of registered factories.
	pub fn len(&self) -> usize {
		self.factories.read().len()
	}

	/// Returns true if nothing is registered.
	pub fn is_empty(&self) -> bool {
		self.factories.read().is_empty()
	}

	/// Drops every registered factory.
	///
	/// This is primarily useful for testing.
	pub fn clear(&self) {
		self.factories.write().clear();
	}
}

impl Default for Registry {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for Registry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Registry")
			.field("factories", &self.len())
			.field("settings", &self.settings)
			.finish()
	}
}

fn not_found<M: Model>(alias: Option<&str>) -> FactoryError {
	FactoryError::FactoryNotFound {
		model: M::model_name().to_string(),
		alias: alias.map(str::to_string),
	}
}

/// Process-wide registry.
static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// The process-wide registry used by the free functions.
pub fn global_registry() -> &'static Registry {
	&GLOBAL_REGISTRY
}

/// Defines a factory on the process-wide registry.
///
/// See [`Registry::define_factory`].
pub fn define_factory<M, F>(alias: Option<&str>, configure: F) -> FactoryResult<Arc<Factory<M>>>
where
	M: Model,
	F: FnOnce(&FactoryDefinition<'_, M>) -> FactoryResult<()>,
{
	GLOBAL_REGISTRY.define_factory(alias, configure)
}

/// Defines several factories on the process-wide registry.
pub fn define_factories<'a, M, I, F>(aliases: I, configure: F) -> FactoryResult<Vec<Arc<Factory<M>>>>
where
	M: Model,
	I: IntoIterator<Item = Option<&'a str>>,
	F: Fn(&FactoryDefinition<'_, M>) -> FactoryResult<()>,
{
	GLOBAL_REGISTRY.define_factories(aliases, configure)
}

/// Looks up a factory on the process-wide registry.
pub fn resolve_factory<M: Model>(alias: Option<&str>) -> FactoryResult<Arc<Factory<M>>> {
	GLOBAL_REGISTRY.resolve_factory(alias)
}

/// Builds an instance with the process-wide registry.
pub fn build<M: Model>(request: BuildRequest<M>) -> FactoryResult<M> {
	GLOBAL_REGISTRY.build(request)
}

/// Builds `count` instances with the process-wide registry.
pub fn build_many<M: Model>(count: usize, request: BuildRequest<M>) -> FactoryResult<Vec<M>> {
	GLOBAL_REGISTRY.build_many(count, request)
}

/// Creates an instance with the process-wide registry.
pub fn create<M: Model>(request: BuildRequest<M>) -> FactoryResult<M> {
	GLOBAL_REGISTRY.create(request)
}

/// Creates `count` instances with the process-wide registry.
pub fn create_many<M: Model>(count: usize, request: BuildRequest<M>) -> FactoryResult<Vec<M>> {
	GLOBAL_REGISTRY.create_many(count, request)
}

/// Resolves attributes with the process-wide registry.
pub fn attributes_for<M: Model>(request: BuildRequest<M>) -> FactoryResult<Context> {
	GLOBAL_REGISTRY.attributes_for(request)
}

/// Clears the process-wide registry.
///
/// This is primarily useful for testing.
pub fn clear_factories() {
	GLOBAL_REGISTRY.clear();
}
