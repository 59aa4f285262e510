//! Convenience re-exports for common usage.
//!
//! # Example
//!
//! ```
//! use genuine_factory::prelude::*;
//!
//! let registry = Registry::new();
//! assert!(registry.is_empty());
//! ```

// Error types
pub use crate::error::{FactoryError, FactoryResult};

// Definition and resolution
pub use crate::context::Context;
pub use crate::factory::{
	Association, BuildRequest, Computed, Cycle, HookPoint, Inputs, Overrides, RandomChoice,
	Registry, Sequence, Strategy, ValueGenerator, lookup,
};
pub use crate::model::Model;
pub use crate::settings::FactorySettings;

// Process-wide registry
pub use crate::factory::{
	attributes_for, build, build_many, clear_factories, create, create_many, define_factories,
	define_factory, resolve_factory,
};
