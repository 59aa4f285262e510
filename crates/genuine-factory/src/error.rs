//! Error types for the factory engine.
//!
//! Every failure raised while defining factories, resolving attributes or
//! running the build pipeline is reported through [`FactoryError`].

use thiserror::Error;

use crate::factory::HookPoint;

/// Errors that can occur during factory definition and instance generation.
#[derive(Debug, Error)]
pub enum FactoryError {
	/// No factory is registered for the requested model and alias.
	#[error("Factory not found: {model} (alias: {})", alias.as_deref().unwrap_or("<default>"))]
	FactoryNotFound {
		/// Model name.
		model: String,
		/// Requested alias, `None` for the default factory.
		alias: Option<String>,
	},

	/// The requested trait is not defined by the factory or any of its ancestors.
	#[error("Trait not found: {model}::{trait_name}")]
	TraitNotFound {
		/// Model name.
		model: String,
		/// Requested trait.
		trait_name: String,
	},

	/// A generator declares an input that no attribute or transient provides.
	#[error("Unknown dependency: `{attribute}` depends on undefined `{dependency}`")]
	UnknownDependency {
		/// Attribute owning the generator.
		attribute: String,
		/// Missing input name.
		dependency: String,
	},

	/// Declared inputs form a cycle.
	#[error("Cyclic dependency detected: {}", cycle.join(" -> "))]
	CyclicDependency {
		/// Cycle path, first element repeated at the end.
		cycle: Vec<String>,
	},

	/// A factory alias is already bound to an incompatible definition.
	#[error("Duplicate definition: {model} (alias: {alias}): {message}")]
	DuplicateDefinition {
		/// Model name.
		model: String,
		/// Conflicting alias.
		alias: String,
		/// Conflict description.
		message: String,
	},

	/// A definition call received invalid arguments.
	#[error("Invalid definition: {0}")]
	InvalidDefinition(String),

	/// An override cannot be applied to the targeted attribute.
	#[error("Invalid override for `{attribute}`: {message}")]
	InvalidOverride {
		/// Overridden attribute.
		attribute: String,
		/// Reason.
		message: String,
	},

	/// A cycle or random choice generator has nothing to choose from.
	#[error("Empty sequence for attribute `{attribute}`")]
	EmptySequence {
		/// Attribute owning the generator.
		attribute: String,
	},

	/// Nested associations went deeper than the configured limit.
	#[error("Maximum association depth exceeded: {0}")]
	AssociationDepthExceeded(usize),

	/// Resolved attributes could not be turned into a model instance.
	#[error("Cannot instantiate {model}: {source}")]
	Instantiation {
		/// Model name.
		model: String,
		/// Deserialization failure.
		#[source]
		source: serde_json::Error,
	},

	/// A model instance could not be converted into an attribute value.
	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	/// A lifecycle hook failed.
	#[error("Hook `{point}` failed for {model}: {source}")]
	Hook {
		/// Model name.
		model: String,
		/// Hook point being run.
		point: HookPoint,
		/// Error returned by the hook.
		#[source]
		source: anyhow::Error,
	},

	/// The storage callback failed.
	#[error("Storage failed for {model}: {source}")]
	Storage {
		/// Model name.
		model: String,
		/// Error returned by the storage callback.
		#[source]
		source: anyhow::Error,
	},

	/// The refinement callback failed.
	#[error("Refinement failed for {model}: {source}")]
	Refine {
		/// Model name.
		model: String,
		/// Error returned by the refinement callback.
		#[source]
		source: anyhow::Error,
	},

	/// Settings could not be parsed.
	#[error("Settings error: {0}")]
	Settings(#[from] toml::de::Error),
}

/// Result type alias for factory operations.
pub type FactoryResult<T> = Result<T, FactoryError>;
