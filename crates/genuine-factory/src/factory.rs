//! Factory definitions, resolution and the build pipeline.
//!
//! ## Layering
//!
//! Attributes are layered in a fixed order, later layers winning by name:
//!
//! 1. `null` stubs for [`Model::field_names`](crate::Model::field_names)
//! 2. base attributes of every ancestor, root first, then the factory's own
//! 3. each requested trait in request order, as defined by every member of the
//!    chain, ancestors first
//! 4. caller overrides
//!
//! Transient attributes follow the same order and are visible to generators
//! and callbacks but never reach the instance.

pub mod association;
pub mod attributes;
pub mod builder;
pub mod definition;
pub mod generator;
pub mod overrides;
pub mod registry;

pub(crate) mod resolver;

pub use association::{Association, Strategy};
pub use attributes::AttributeSet;
pub use builder::BuildRequest;
pub use definition::{
	Factory, FactoryDefinition, HookFn, HookPoint, Hooks, RefineFn, StorageFn, TraitDefinition,
	TransientDefinition,
};
pub use generator::{
	ComputeFn, Computed, Cycle, Inputs, RandomChoice, Sequence, SequenceFn, ValueGenerator,
};
pub use overrides::{Override, Overrides, lookup};
pub use registry::{
	Registry, attributes_for, build, build_many, clear_factories, create, create_many,
	define_factories, define_factory, global_registry, resolve_factory,
};
