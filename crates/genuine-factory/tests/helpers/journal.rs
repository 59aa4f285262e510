//! Ordered record of callback invocations.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;

/// Cloneable log shared between a test and the callbacks it registers.
#[derive(Debug, Clone, Default)]
pub struct Journal {
	entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
	/// Create an empty journal.
	pub fn new() -> Self {
		Self::default()
	}

	/// Append an entry.
	pub fn record(&self, entry: impl Into<String>) {
		self.entries.lock().push(entry.into());
	}

	/// Every entry, in recording order.
	pub fn entries(&self) -> Vec<String> {
		self.entries.lock().clone()
	}

	/// Number of entries equal to `entry`.
	pub fn count(&self, entry: &str) -> usize {
		self.entries
			.lock()
			.iter()
			.filter(|recorded| recorded.as_str() == entry)
			.count()
	}

	/// Total number of entries.
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	/// Drop every entry.
	pub fn clear(&self) {
		self.entries.lock().clear();
	}
}
