//! Test-fixture factories.
//!
//! This crate produces populated model instances from reusable, composable
//! definitions:
//!
//! - **Factories** bound to a model type and an optional alias
//! - **Derivation** of factories from other factories
//! - **Traits**: optional attribute layers applied on request
//! - **Transient attributes** visible during resolution only
//! - **Associations** building or creating nested instances
//! - **Hooks** at `after_build`, `before_create` and `after_create`
//!
//! # Quick Start
//!
//! ```
//! use genuine_factory::prelude::*;
//! use serde::{Deserialize, Serialize};
//! use serde_json::json;
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct User {
//!     given_name: String,
//!     family_name: String,
//!     email: String,
//!     admin: bool,
//! }
//!
//! impl Model for User {}
//!
//! let registry = Registry::new();
//! registry
//!     .define_factory::<User, _>(None, |factory| {
//!         factory
//!             .set("given_name", Cycle::new(["John", "Jane"]))
//!             .set("family_name", "Smith")
//!             .set("admin", false)
//!             .set(
//!                 "email",
//!                 Computed::new(["given_name", "family_name"], |inputs| {
//!                     json!(format!(
//!                         "{}.{}@example.com",
//!                         inputs.str("given_name").unwrap_or_default(),
//!                         inputs.str("family_name").unwrap_or_default(),
//!                     )
//!                     .to_lowercase())
//!                 }),
//!             );
//!         factory.define_trait("admin").set("admin", true);
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let users = registry.build_many::<User>(2, BuildRequest::new()).unwrap();
//! assert_eq!(users[0].email, "john.smith@example.com");
//! assert_eq!(users[1].email, "jane.smith@example.com");
//!
//! let admin: User = registry
//!     .build(BuildRequest::new().with_trait("admin"))
//!     .unwrap();
//! assert!(admin.admin);
//! ```
//!
//! # Registries
//!
//! A [`Registry`] is a plain value that can be created per test. The free
//! functions ([`define_factory`], [`build`], [`create`], ...) operate on a
//! process-wide registry for code that prefers a global.
//!
//! # Models
//!
//! Any `serde` round-trippable type implementing [`Model`] can be produced.
//! Resolved attributes are deserialized into the model, and nested instances
//! are serialized back into their parent's attributes.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod context;
pub mod error;
pub mod factory;
pub mod model;
pub mod prelude;
pub mod settings;

pub use context::Context;
pub use error::{FactoryError, FactoryResult};
pub use factory::{
	Association, AttributeSet, BuildRequest, Computed, Cycle, Factory, FactoryDefinition,
	HookPoint, Inputs, Override, Overrides, RandomChoice, Registry, Sequence, Strategy,
	TraitDefinition, TransientDefinition, ValueGenerator, attributes_for, build, build_many,
	clear_factories, create, create_many, define_factories, define_factory, global_registry,
	lookup, resolve_factory,
};
pub use model::Model;
pub use settings::FactorySettings;
