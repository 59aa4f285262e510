//! # Genuine
//!
//! Composable test-fixture factories for Rust.
//!
//! Genuine produces populated model instances from reusable definitions. A
//! definition declares how each attribute gets its value: a constant, a cycle
//! over a list, a counter, a random pick, a value computed from other
//! attributes, or a nested instance built by another factory.
//!
//! Definitions compose:
//!
//! - Factories can be derived from other factories and override what they inherit
//! - Traits are named attribute layers applied on request
//! - Transient attributes feed computations and hooks without reaching the model
//! - Associations build or create nested models, optionally correlated with
//!   the parent's attributes
//!
//! ## Quick Example
//!
//! ```
//! use genuine::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Account {
//!     id: u64,
//!     name: String,
//! }
//!
//! impl Model for Account {}
//!
//! let registry = Registry::new();
//! registry
//!     .define_factory::<Account, _>(None, |factory| {
//!         factory
//!             .set("id", Sequence::new(|n, _| serde_json::json!(n)))
//!             .set("name", "Gary");
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let accounts = registry.build_many::<Account>(2, BuildRequest::new()).unwrap();
//! assert_eq!(accounts[1].id, accounts[0].id + 1);
//! ```
//!
//! ## Crates
//!
//! - [`genuine_factory`]: the definition, resolution and build engine

#![warn(missing_docs)]

pub use genuine_factory::*;

/// Convenience re-exports for common usage.
pub mod prelude {
	pub use genuine_factory::prelude::*;
}
