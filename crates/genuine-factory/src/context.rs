//! Resolved attribute values.

use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value};

/// The outcome of one resolution pass.
///
/// Holds every resolved name, transient ones included. A context is never
/// modified once resolution completes: hooks, storage and refinement callbacks
/// only get shared access.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
	values: IndexMap<String, Value>,
	transients: IndexSet<String>,
}

impl Context {
	pub(crate) fn new(values: IndexMap<String, Value>, transients: IndexSet<String>) -> Self {
		Self { values, transients }
	}

	/// Returns the value resolved for `name`.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.values.get(name)
	}

	/// Returns the value resolved for `name` as a string slice.
	pub fn get_str(&self, name: &str) -> Option<&str> {
		self.get(name).and_then(Value::as_str)
	}

	/// Returns the value resolved for `name` as a boolean.
	pub fn get_bool(&self, name: &str) -> Option<bool> {
		self.get(name).and_then(Value::as_bool)
	}

	/// Returns the value resolved for `name` as a signed integer.
	pub fn get_i64(&self, name: &str) -> Option<i64> {
		self.get(name).and_then(Value::as_i64)
	}

	/// Returns true if `name` was resolved.
	pub fn contains(&self, name: &str) -> bool {
		self.values.contains_key(name)
	}

	/// Returns true if `name` is a transient attribute.
	pub fn is_transient(&self, name: &str) -> bool {
		self.transients.contains(name)
	}

	/// Iterates over every resolved name and value.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.values.iter().map(|(name, value)| (name.as_str(), value))
	}

	/// Number of resolved names, transient ones included.
	pub fn len(&self) -> usize {
		self.values.len()
	}

	/// Returns true if nothing was resolved.
	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	/// Non-transient values, the ones an instance is built from.
	pub fn attributes(&self) -> Map<String, Value> {
		self.values
			.iter()
			.filter(|(name, _)| !self.transients.contains(name.as_str()))
			.map(|(name, value)| (name.clone(), value.clone()))
			.collect()
	}

	/// Transient values only.
	pub fn transients(&self) -> Map<String, Value> {
		self.values
			.iter()
			.filter(|(name, _)| self.transients.contains(name.as_str()))
			.map(|(name, value)| (name.clone(), value.clone()))
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn sample() -> Context {
		let mut values = IndexMap::new();
		values.insert("name".to_string(), json!("John"));
		values.insert("upcased".to_string(), json!(true));
		values.insert("age".to_string(), json!(42));
		let mut transients = IndexSet::new();
		transients.insert("upcased".to_string());
		Context::new(values, transients)
	}

	#[rstest]
	fn test_attributes_exclude_transients() {
		let context = sample();

		let attributes = context.attributes();

		assert_eq!(attributes.len(), 2);
		assert!(attributes.contains_key("name"));
		assert!(!attributes.contains_key("upcased"));
		assert_eq!(context.transients().get("upcased"), Some(&json!(true)));
	}

	#[rstest]
	fn test_typed_accessors() {
		let context = sample();

		assert_eq!(context.get_str("name"), Some("John"));
		assert_eq!(context.get_bool("upcased"), Some(true));
		assert_eq!(context.get_i64("age"), Some(42));
		assert!(context.is_transient("upcased"));
		assert!(!context.is_transient("name"));
		assert_eq!(context.len(), 3);
	}
}
