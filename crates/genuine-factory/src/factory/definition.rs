//! Factory definitions.
//!
//! A [`Factory`] accumulates attributes, transients, traits, hooks and a
//! storage callback for one (model, alias) pair. It is mutated through the
//! definition handles handed out by [`Registry::define_factory`] and read by
//! the resolver, which snapshots it before every run so that user callbacks
//! never execute while a factory lock is held.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;

use super::association::Association;
use super::attributes::AttributeSet;
use super::generator::ValueGenerator;
use super::registry::Registry;
use crate::context::Context;
use crate::error::{FactoryError, FactoryResult};
use crate::model::Model;

/// Lifecycle hook callback.
pub type HookFn<M> = Arc<dyn Fn(&mut M, &Context) -> anyhow::Result<()> + Send + Sync>;

/// Storage callback, invoked by the `create` strategy.
pub type StorageFn<M> = Arc<dyn Fn(&mut M, &Context) -> anyhow::Result<()> + Send + Sync>;

/// Refinement callback, applied last. Returning `Some` replaces the instance.
pub type RefineFn<M> = Arc<dyn Fn(&mut M, &Context) -> anyhow::Result<Option<M>> + Send + Sync>;

/// Points of the build pipeline hooks attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
	/// Right after the instance is constructed.
	AfterBuild,
	/// Before the storage callback runs.
	BeforeCreate,
	/// After the storage callback ran.
	AfterCreate,
}

impl HookPoint {
	/// Snake-case name of the hook point.
	pub fn as_str(&self) -> &'static str {
		match self {
			HookPoint::AfterBuild => "after_build",
			HookPoint::BeforeCreate => "before_create",
			HookPoint::AfterCreate => "after_create",
		}
	}
}

impl fmt::Display for HookPoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for HookPoint {
	type Err = FactoryError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"after_build" => Ok(HookPoint::AfterBuild),
			"before_create" => Ok(HookPoint::BeforeCreate),
			"after_create" => Ok(HookPoint::AfterCreate),
			other => Err(FactoryError::InvalidDefinition(format!(
				"unknown hook point `{}`",
				other
			))),
		}
	}
}

/// Hooks grouped by point, in registration order.
pub struct Hooks<M> {
	after_build: Vec<HookFn<M>>,
	before_create: Vec<HookFn<M>>,
	after_create: Vec<HookFn<M>>,
}

impl<M> Hooks<M> {
	fn slot_mut(&mut self, point: HookPoint) -> &mut Vec<HookFn<M>> {
		match point {
			HookPoint::AfterBuild => &mut self.after_build,
			HookPoint::BeforeCreate => &mut self.before_create,
			HookPoint::AfterCreate => &mut self.after_create,
		}
	}

	pub(crate) fn push(&mut self, point: HookPoint, hook: HookFn<M>) {
		self.slot_mut(point).push(hook);
	}

	/// Appends every hook of `other` after the current ones.
	pub(crate) fn extend(&mut self, other: &Hooks<M>) {
		self.after_build.extend(other.after_build.iter().cloned());
		self.before_create.extend(other.before_create.iter().cloned());
		self.after_create.extend(other.after_create.iter().cloned());
	}

	/// Hooks registered for `point`.
	pub fn get(&self, point: HookPoint) -> &[HookFn<M>] {
		match point {
			HookPoint::AfterBuild => &self.after_build,
			HookPoint::BeforeCreate => &self.before_create,
			HookPoint::AfterCreate => &self.after_create,
		}
	}

	/// Total number of hooks.
	pub fn len(&self) -> usize {
		self.after_build.len() + self.before_create.len() + self.after_create.len()
	}

	/// Returns true if no hook is registered.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl<M> Default for Hooks<M> {
	fn default() -> Self {
		Self {
			after_build: Vec::new(),
			before_create: Vec::new(),
			after_create: Vec::new(),
		}
	}
}

impl<M> Clone for Hooks<M> {
	fn clone(&self) -> Self {
		Self {
			after_build: self.after_build.clone(),
			before_create: self.before_create.clone(),
			after_create: self.after_create.clone(),
		}
	}
}

/// Attributes, transients and hooks defined together, either as the base of
/// a factory or as a trait.
pub(crate) struct Layer<M> {
	pub(crate) attributes: AttributeSet,
	pub(crate) transients: AttributeSet,
	pub(crate) hooks: Hooks<M>,
}

impl<M> Default for Layer<M> {
	fn default() -> Self {
		Self {
			attributes: AttributeSet::new(),
			transients: AttributeSet::new(),
			hooks: Hooks::default(),
		}
	}
}

impl<M> Clone for Layer<M> {
	fn clone(&self) -> Self {
		Self {
			attributes: self.attributes.clone(),
			transients: self.transients.clone(),
			hooks: self.hooks.clone(),
		}
	}
}

pub(crate) struct FactoryState<M> {
	pub(crate) base: Layer<M>,
	pub(crate) traits: IndexMap<String, Layer<M>>,
	pub(crate) storage: Option<StorageFn<M>>,
}

impl<M> FactoryState<M> {
	fn layer_mut(&mut self, trait_name: Option<&str>) -> &mut Layer<M> {
		match trait_name {
			Some(name) => self.traits.entry(name.to_string()).or_default(),
			None => &mut self.base,
		}
	}
}

impl<M> Clone for FactoryState<M> {
	fn clone(&self) -> Self {
		Self {
			base: self.base.clone(),
			traits: self.traits.clone(),
			storage: self.storage.clone(),
		}
	}
}

struct ParentRef<M: Model> {
	alias: Option<String>,
	factory: Weak<Factory<M>>,
}

/// Registered recipe for one model type and alias.
pub struct Factory<M: Model> {
	alias: Option<String>,
	parent: Option<ParentRef<M>>,
	state: Mutex<FactoryState<M>>,
}

impl<M: Model> Factory<M> {
	pub(crate) fn new(alias: Option<String>, parent: Option<&Arc<Factory<M>>>) -> Self {
		Self {
			alias,
			parent: parent.map(|parent| ParentRef {
				alias: parent.alias.clone(),
				factory: Arc::downgrade(parent),
			}),
			state: Mutex::new(FactoryState {
				base: Layer::default(),
				traits: IndexMap::new(),
				storage: None,
			}),
		}
	}

	/// Alias of this factory, `None` for the default one.
	pub fn alias(&self) -> Option<&str> {
		self.alias.as_deref()
	}

	/// Name of the produced model.
	pub fn model_name(&self) -> &'static str {
		M::model_name()
	}

	/// The factory this one derives from.
	pub fn parent(&self) -> Option<Arc<Factory<M>>> {
		self.parent
			.as_ref()
			.and_then(|parent| parent.factory.upgrade())
	}

	pub(crate) fn is_derived_from(&self, candidate: &Arc<Factory<M>>) -> bool {
		self.parent
			.as_ref()
			.is_some_and(|parent| Weak::ptr_eq(&parent.factory, &Arc::downgrade(candidate)))
	}

	/// Derivation chain from the root-most ancestor down to `factory`.
	pub fn chain(factory: &Arc<Factory<M>>) -> FactoryResult<Vec<Arc<Factory<M>>>> {
		let mut chain = vec![Arc::clone(factory)];
		let mut current = Arc::clone(factory);
		while let Some(parent) = &current.parent {
			let next = parent
				.factory
				.upgrade()
				.ok_or_else(|| FactoryError::FactoryNotFound {
					model: M::model_name().to_string(),
					alias: parent.alias.clone(),
				})?;
			chain.push(Arc::clone(&next));
			current = next;
		}
		chain.reverse();
		Ok(chain)
	}

	/// Names of the base attributes, in definition order.
	pub fn attribute_names(&self) -> Vec<String> {
		self.state
			.lock()
			.base
			.attributes
			.names()
			.map(str::to_string)
			.collect()
	}

	/// Names of the traits defined directly on this factory.
	pub fn trait_names(&self) -> Vec<String> {
		self.state.lock().traits.keys().cloned().collect()
	}

	pub(crate) fn snapshot(&self) -> FactoryState<M> {
		self.state.lock().clone()
	}

	fn update<R>(&self, f: impl FnOnce(&mut FactoryState<M>) -> R) -> R {
		f(&mut self.state.lock())
	}
}

impl<M: Model> fmt::Debug for Factory<M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Factory")
			.field("model", &M::model_name())
			.field("alias", &self.alias)
			.field(
				"parent",
				&self.parent.as_ref().map(|parent| parent.alias.clone()),
			)
			.field("attributes", &self.attribute_names())
			.field("traits", &self.trait_names())
			.finish()
	}
}

/// Mutation handle over a registered [`Factory`].
///
/// Every call is applied immediately to the shared factory, so mutations made
/// before a failure are kept.
pub struct FactoryDefinition<'r, M: Model> {
	registry: &'r Registry,
	factory: Arc<Factory<M>>,
}

impl<'r, M: Model> FactoryDefinition<'r, M> {
	pub(crate) fn new(registry: &'r Registry, factory: Arc<Factory<M>>) -> Self {
		Self { registry, factory }
	}

	/// The factory being defined.
	pub fn factory(&self) -> &Arc<Factory<M>> {
		&self.factory
	}

	/// Sets the generator of an attribute.
	pub fn set(&self, name: impl Into<String>, generator: impl Into<ValueGenerator>) -> &Self {
		let (name, generator) = (name.into(), generator.into());
		self.factory
			.update(|state| state.base.attributes.set(name, generator));
		self
	}

	/// Declares an association attribute.
	pub fn associate(&self, name: impl Into<String>, association: Association) -> &Self {
		self.set(name, association)
	}

	/// Handle for transient attributes.
	pub fn transient(&self) -> TransientDefinition<'_, M> {
		TransientDefinition {
			factory: &self.factory,
			trait_name: None,
		}
	}

	/// Handle for the trait `name`, created on first use.
	pub fn define_trait(&self, name: impl Into<String>) -> TraitDefinition<'_, M> {
		let name = name.into();
		self.factory.update(|state| {
			state.traits.entry(name.clone()).or_default();
		});
		TraitDefinition {
			factory: &self.factory,
			name,
		}
	}

	/// Registers a hook.
	pub fn add_hook<F>(&self, point: HookPoint, hook: F) -> &Self
	where
		F: Fn(&mut M, &Context) -> anyhow::Result<()> + Send + Sync + 'static,
	{
		let hook: HookFn<M> = Arc::new(hook);
		self.factory
			.update(|state| state.base.hooks.push(point, hook));
		self
	}

	/// Sets how instances of this factory, and of factories deriving from it,
	/// are persisted by `create`.
	pub fn storage<F>(&self, storage: F) -> &Self
	where
		F: Fn(&mut M, &Context) -> anyhow::Result<()> + Send + Sync + 'static,
	{
		let storage: StorageFn<M> = Arc::new(storage);
		self.factory.update(|state| state.storage = Some(storage));
		self
	}

	/// Defines a factory inheriting from this one and configures it.
	///
	/// The derived factory is registered under this factory's model with
	/// `name` as alias. Deriving the same name again from the same parent
	/// returns the existing factory.
	pub fn derived_factory<F>(&self, name: &str, configure: F) -> FactoryResult<Arc<Factory<M>>>
	where
		F: FnOnce(&FactoryDefinition<'r, M>) -> FactoryResult<()>,
	{
		let derived = self.registry.derive_factory(&self.factory, name)?;
		let definition = FactoryDefinition::new(self.registry, Arc::clone(&derived));
		configure(&definition)?;
		Ok(derived)
	}
}

/// Mutation handle over a trait of a factory.
pub struct TraitDefinition<'a, M: Model> {
	factory: &'a Arc<Factory<M>>,
	name: String,
}

impl<'a, M: Model> TraitDefinition<'a, M> {
	/// Trait name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Sets an attribute applied when the trait is requested.
	pub fn set(&self, name: impl Into<String>, generator: impl Into<ValueGenerator>) -> &Self {
		let (name, generator) = (name.into(), generator.into());
		self.factory.update(|state| {
			state
				.layer_mut(Some(&self.name))
				.attributes
				.set(name, generator)
		});
		self
	}

	/// Declares an association applied when the trait is requested.
	pub fn associate(&self, name: impl Into<String>, association: Association) -> &Self {
		self.set(name, association)
	}

	/// Handle for transient attributes of this trait.
	pub fn transient(&self) -> TransientDefinition<'a, M> {
		TransientDefinition {
			factory: self.factory,
			trait_name: Some(self.name.clone()),
		}
	}

	/// Registers a hook run only when the trait is requested.
	pub fn add_hook<F>(&self, point: HookPoint, hook: F) -> &Self
	where
		F: Fn(&mut M, &Context) -> anyhow::Result<()> + Send + Sync + 'static,
	{
		let hook: HookFn<M> = Arc::new(hook);
		self.factory
			.update(|state| state.layer_mut(Some(&self.name)).hooks.push(point, hook));
		self
	}
}

/// Mutation handle over transient attributes.
pub struct TransientDefinition<'a, M: Model> {
	factory: &'a Arc<Factory<M>>,
	trait_name: Option<String>,
}

impl<M: Model> TransientDefinition<'_, M> {
	/// Sets a transient attribute.
	pub fn set(&self, name: impl Into<String>, generator: impl Into<ValueGenerator>) -> &Self {
		let (name, generator) = (name.into(), generator.into());
		self.factory.update(|state| {
			state
				.layer_mut(self.trait_name.as_deref())
				.transients
				.set(name, generator)
		});
		self
	}
}
