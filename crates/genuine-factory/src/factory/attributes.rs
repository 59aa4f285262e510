//! Ordered attribute generator tables.

use indexmap::IndexMap;

use super::generator::ValueGenerator;

/// Ordered mapping of attribute name to [`ValueGenerator`].
///
/// Setting a name that is already present replaces its generator and keeps
/// its position. New names are appended.
#[derive(Debug, Clone, Default)]
pub struct AttributeSet {
	generators: IndexMap<String, ValueGenerator>,
}

impl AttributeSet {
	/// Creates an empty set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the generator of `name`, replacing any previous one.
	pub fn set(&mut self, name: impl Into<String>, generator: impl Into<ValueGenerator>) {
		self.generators.insert(name.into(), generator.into());
	}

	/// Returns the generator of `name`.
	pub fn get(&self, name: &str) -> Option<&ValueGenerator> {
		self.generators.get(name)
	}

	pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut ValueGenerator> {
		self.generators.get_mut(name)
	}

	/// Returns true if `name` has a generator.
	pub fn contains(&self, name: &str) -> bool {
		self.generators.contains_key(name)
	}

	pub(crate) fn remove(&mut self, name: &str) -> Option<ValueGenerator> {
		self.generators.shift_remove(name)
	}

	/// Layers `other` on top of this set.
	///
	/// Names of `other` are visited in insertion order: existing names are
	/// overwritten in place, unknown names are appended.
	pub fn merge(&mut self, other: &AttributeSet) {
		for (name, generator) in &other.generators {
			self.generators.insert(name.clone(), generator.clone());
		}
	}

	/// Iterates over names and generators in order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &ValueGenerator)> {
		self.generators
			.iter()
			.map(|(name, generator)| (name.as_str(), generator))
	}

	/// Attribute names in order.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.generators.keys().map(String::as_str)
	}

	/// Number of attributes.
	pub fn len(&self) -> usize {
		self.generators.len()
	}

	/// Returns true if no attribute is set.
	pub fn is_empty(&self) -> bool {
		self.generators.is_empty()
	}
}
