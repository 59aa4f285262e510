//! Caller-supplied attribute overrides.

use indexmap::IndexMap;
use serde_json::Value;

use super::association::Strategy;
use super::generator::{Computed, Cycle, RandomChoice, Sequence, ValueGenerator};
use crate::error::{FactoryError, FactoryResult};

/// Replacement for one attribute.
#[derive(Debug, Clone)]
pub enum Override {
	/// Plain value, becomes a constant generator.
	Value(Value),
	/// Generator replacing the declared one.
	Generator(ValueGenerator),
	/// Overrides forwarded to the factory of an association attribute.
	Nested(Overrides),
	/// Resolved value of another attribute of the enclosing context.
	///
	/// Inside association overrides the enclosing context is the parent's,
	/// which correlates nested objects with their owner.
	Lookup(String),
}

/// Shorthand for [`Override::Lookup`].
pub fn lookup(name: impl Into<String>) -> Override {
	Override::Lookup(name.into())
}

macro_rules! impl_value_override_from {
	($($ty:ty),* $(,)?) => {
		$(
			impl From<$ty> for Override {
				fn from(value: $ty) -> Self {
					Self::Value(Value::from(value))
				}
			}
		)*
	};
}

impl_value_override_from!(Value, &str, String, bool, i32, i64, u32, u64, f64);

macro_rules! impl_generator_override_from {
	($($ty:ty),* $(,)?) => {
		$(
			impl From<$ty> for Override {
				fn from(generator: $ty) -> Self {
					Self::Generator(generator.into())
				}
			}
		)*
	};
}

impl_generator_override_from!(ValueGenerator, Cycle, Sequence, RandomChoice, Computed);

impl From<Overrides> for Override {
	fn from(overrides: Overrides) -> Self {
		Self::Nested(overrides)
	}
}

/// Ordered set of overrides applied after every factory layer.
///
/// # Example
///
/// ```
/// use genuine_factory::{Overrides, Strategy, lookup};
///
/// let overrides = Overrides::new()
///     .set("body", "hello!")
///     .set(
///         "author",
///         Overrides::new()
///             .set("given_name", "Steeve")
///             .set("post_title", lookup("title"))
///             .with_strategy(Strategy::Build),
///     );
/// assert_eq!(overrides.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Overrides {
	entries: IndexMap<String, Override>,
	strategy: Option<Strategy>,
}

impl Overrides {
	/// Creates empty overrides.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds an override, builder style.
	pub fn set(mut self, name: impl Into<String>, value: impl Into<Override>) -> Self {
		self.insert(name, value);
		self
	}

	/// Adds an override in place.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Override>) {
		self.entries.insert(name.into(), value.into());
	}

	/// Forces the strategy of the association these overrides target.
	pub fn with_strategy(mut self, strategy: Strategy) -> Self {
		self.strategy = Some(strategy);
		self
	}

	/// Strategy override, if any.
	pub fn strategy(&self) -> Option<Strategy> {
		self.strategy
	}

	/// Returns the override of `name`.
	pub fn get(&self, name: &str) -> Option<&Override> {
		self.entries.get(name)
	}

	/// Iterates over overrides in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &Override)> {
		self.entries
			.iter()
			.map(|(name, value)| (name.as_str(), value))
	}

	/// Number of overridden names.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns true if nothing is overridden.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Layers `other` on top of these overrides.
	///
	/// Names are replaced one by one, except when both sides hold nested
	/// overrides for the same name, which are layered recursively. A strategy
	/// set on `other` wins.
	pub fn layer(&mut self, other: &Overrides) {
		for (name, value) in &other.entries {
			match (self.entries.get_mut(name), value) {
				(Some(Override::Nested(current)), Override::Nested(incoming)) => {
					current.layer(incoming);
				}
				_ => {
					self.entries.insert(name.clone(), value.clone());
				}
			}
		}
		if other.strategy.is_some() {
			self.strategy = other.strategy;
		}
	}

	/// Names referenced by top-level lookups.
	pub(crate) fn lookups(&self) -> Vec<String> {
		self.entries
			.values()
			.filter_map(|value| match value {
				Override::Lookup(target) => Some(target.clone()),
				_ => None,
			})
			.collect()
	}

	/// Replaces top-level lookups with values taken from the enclosing context.
	///
	/// Lookups inside nested overrides belong to the next association level and
	/// are left untouched.
	pub(crate) fn bind_lookups<'a, F>(&self, resolve: F) -> FactoryResult<Overrides>
	where
		F: Fn(&str) -> Option<&'a Value>,
	{
		let mut bound = self.clone();
		for (name, value) in bound.entries.iter_mut() {
			if let Override::Lookup(target) = value {
				let resolved = resolve(target.as_str()).ok_or_else(|| FactoryError::UnknownDependency {
					attribute: name.clone(),
					dependency: target.clone(),
				})?;
				*value = Override::Value(resolved.clone());
			}
		}
		Ok(bound)
	}
}
