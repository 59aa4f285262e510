//! Registry settings.

use serde::{Deserialize, Serialize};

use crate::error::FactoryResult;
use crate::factory::Strategy;

/// Default maximum nesting of associations.
pub const DEFAULT_MAX_ASSOCIATION_DEPTH: usize = 32;

/// Tunables of a [`Registry`](crate::Registry).
///
/// Settings can be loaded from TOML; missing keys keep their default.
///
/// ```
/// use genuine_factory::{FactorySettings, Strategy};
///
/// let settings = FactorySettings::from_toml_str(
///     r#"
///     max_association_depth = 4
///     default_association_strategy = "build"
///     "#,
/// )
/// .unwrap();
/// assert_eq!(settings.max_association_depth, 4);
/// assert_eq!(settings.default_association_strategy, Strategy::Build);
/// assert!(settings.stub_missing_fields);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorySettings {
	/// How deep associations may nest before resolution fails.
	pub max_association_depth: usize,
	/// Seed every model field with a `null` constant before layering.
	pub stub_missing_fields: bool,
	/// Strategy of associations that do not declare one.
	pub default_association_strategy: Strategy,
}

impl Default for FactorySettings {
	fn default() -> Self {
		Self {
			max_association_depth: DEFAULT_MAX_ASSOCIATION_DEPTH,
			stub_missing_fields: true,
			default_association_strategy: Strategy::Create,
		}
	}
}

impl FactorySettings {
	/// Creates default settings.
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses settings from a TOML document.
	pub fn from_toml_str(source: &str) -> FactoryResult<Self> {
		Ok(toml::from_str(source)?)
	}

	/// Sets the maximum association depth.
	pub fn with_max_association_depth(mut self, depth: usize) -> Self {
		self.max_association_depth = depth;
		self
	}

	/// Enables or disables field stubs.
	pub fn with_stub_missing_fields(mut self, enabled: bool) -> Self {
		self.stub_missing_fields = enabled;
		self
	}

	/// Sets the strategy of associations that do not declare one.
	pub fn with_default_association_strategy(mut self, strategy: Strategy) -> Self {
		self.default_association_strategy = strategy;
		self
	}
}
