//! Value generators.
//!
//! A generator produces the value of one attribute each time a factory
//! resolves. Stateful generators ([`Cycle`], [`Sequence`]) keep their counter
//! behind an `Arc`, so every clone of a generator advances the same counter.
//! This is what lets a counter registered on a factory keep moving across
//! separate `build` calls.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use rand::prelude::IndexedRandom;
use serde::Serialize;
use serde_json::Value;

use super::association::Association;
use crate::error::{FactoryError, FactoryResult};

/// Function signature of a [`Computed`] generator.
pub type ComputeFn = Arc<dyn Fn(&Inputs<'_>) -> Value + Send + Sync>;

/// Function signature of a [`Sequence`] generator.
pub type SequenceFn = Arc<dyn Fn(u64, &Inputs<'_>) -> Value + Send + Sync>;

static NULL: Value = Value::Null;

/// Already-resolved values handed to a generator, in declared order.
#[derive(Debug)]
pub struct Inputs<'a> {
	names: &'a [String],
	values: Vec<&'a Value>,
}

impl<'a> Inputs<'a> {
	pub(crate) fn new(names: &'a [String], values: Vec<&'a Value>) -> Self {
		Self { names, values }
	}

	#[cfg(test)]
	pub(crate) fn empty() -> Self {
		Self {
			names: &[],
			values: Vec::new(),
		}
	}

	/// Value of the declared input `name`, `null` if it was not declared.
	pub fn get(&self, name: &str) -> &Value {
		self.names
			.iter()
			.position(|declared| declared == name)
			.map(|index| self.values[index])
			.unwrap_or(&NULL)
	}

	/// Value of the input at `index` in declared order.
	pub fn at(&self, index: usize) -> &Value {
		self.values.get(index).copied().unwrap_or(&NULL)
	}

	/// String value of `name`.
	pub fn str(&self, name: &str) -> Option<&str> {
		self.get(name).as_str()
	}

	/// Integer value of `name`.
	pub fn i64(&self, name: &str) -> Option<i64> {
		self.get(name).as_i64()
	}

	/// Boolean value of `name`.
	pub fn bool(&self, name: &str) -> Option<bool> {
		self.get(name).as_bool()
	}

	/// Number of declared inputs.
	pub fn len(&self) -> usize {
		self.values.len()
	}

	/// Returns true if the generator declared no inputs.
	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}
}

/// Cycles through a fixed list of values.
///
/// The i-th resolution (0-indexed) yields `values[i % values.len()]`.
#[derive(Clone)]
pub struct Cycle {
	values: Arc<[Value]>,
	position: Arc<AtomicUsize>,
}

impl Cycle {
	/// Creates a cycle over `values`.
	pub fn new<I, V>(values: I) -> Self
	where
		I: IntoIterator<Item = V>,
		V: Into<Value>,
	{
		Self {
			values: values.into_iter().map(Into::into).collect(),
			position: Arc::new(AtomicUsize::new(0)),
		}
	}

	/// Returns the next value, `None` if the cycle is empty.
	pub fn next_value(&self) -> Option<Value> {
		if self.values.is_empty() {
			return None;
		}
		let index = self.position.fetch_add(1, Ordering::Relaxed);
		Some(self.values[index % self.values.len()].clone())
	}

	/// Number of values produced so far.
	pub fn position(&self) -> usize {
		self.position.load(Ordering::Relaxed)
	}
}

impl fmt::Debug for Cycle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Cycle")
			.field("values", &self.values)
			.field("position", &self.position())
			.finish()
	}
}

/// Counter-driven generator.
///
/// The function receives a counter starting at 0, incremented once per
/// resolution, and the declared inputs.
///
/// ```
/// use genuine_factory::Sequence;
/// use serde_json::json;
///
/// let emails = Sequence::new(|n, _| json!(format!("person{n}@example.com")));
/// assert_eq!(emails.counter(), 0);
/// ```
#[derive(Clone)]
pub struct Sequence {
	inputs: Vec<String>,
	function: SequenceFn,
	counter: Arc<AtomicU64>,
}

impl Sequence {
	/// Creates a sequence without inputs.
	pub fn new<F>(function: F) -> Self
	where
		F: Fn(u64, &Inputs<'_>) -> Value + Send + Sync + 'static,
	{
		Self::with_inputs(Vec::<String>::new(), function)
	}

	/// Creates a sequence reading the resolved values of `inputs`.
	pub fn with_inputs<I, S, F>(inputs: I, function: F) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
		F: Fn(u64, &Inputs<'_>) -> Value + Send + Sync + 'static,
	{
		Self {
			inputs: inputs.into_iter().map(Into::into).collect(),
			function: Arc::new(function),
			counter: Arc::new(AtomicU64::new(0)),
		}
	}

	/// Produces the next value.
	pub fn next_value(&self, inputs: &Inputs<'_>) -> Value {
		let n = self.counter.fetch_add(1, Ordering::Relaxed);
		(self.function)(n, inputs)
	}

	/// Current counter value.
	pub fn counter(&self) -> u64 {
		self.counter.load(Ordering::Relaxed)
	}
}

impl fmt::Debug for Sequence {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Sequence")
			.field("inputs", &self.inputs)
			.field("counter", &self.counter())
			.finish_non_exhaustive()
	}
}

/// Picks a uniformly random value on every resolution.
#[derive(Debug, Clone)]
pub struct RandomChoice {
	values: Arc<[Value]>,
}

impl RandomChoice {
	/// Creates a random choice over `values`.
	pub fn new<I, V>(values: I) -> Self
	where
		I: IntoIterator<Item = V>,
		V: Into<Value>,
	{
		Self {
			values: values.into_iter().map(Into::into).collect(),
		}
	}

	/// Returns a random value, `None` if there is nothing to pick from.
	pub fn pick(&self) -> Option<Value> {
		let mut rng = rand::rng();
		self.values.choose(&mut rng).cloned()
	}

	/// Candidate values.
	pub fn values(&self) -> &[Value] {
		&self.values
	}
}

/// Value computed from other resolved attributes.
///
/// ```
/// use genuine_factory::Computed;
/// use serde_json::json;
///
/// let email = Computed::new(["given_name", "family_name"], |inputs| {
///     json!(format!(
///         "{}.{}@example.com",
///         inputs.str("given_name").unwrap_or_default(),
///         inputs.str("family_name").unwrap_or_default(),
///     ))
/// });
/// assert_eq!(email.inputs(), ["given_name", "family_name"]);
/// ```
#[derive(Clone)]
pub struct Computed {
	inputs: Vec<String>,
	function: ComputeFn,
}

impl Computed {
	/// Creates a computed generator over the declared `inputs`.
	pub fn new<I, S, F>(inputs: I, function: F) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
		F: Fn(&Inputs<'_>) -> Value + Send + Sync + 'static,
	{
		Self {
			inputs: inputs.into_iter().map(Into::into).collect(),
			function: Arc::new(function),
		}
	}

	/// Copies the resolved value of another attribute.
	pub fn copy_of(name: impl Into<String>) -> Self {
		let name: String = name.into();
		Self::new([name], |inputs| inputs.at(0).clone())
	}

	/// Declared input names.
	pub fn inputs(&self) -> &[String] {
		&self.inputs
	}

	/// Applies the function.
	pub fn compute(&self, inputs: &Inputs<'_>) -> Value {
		(self.function)(inputs)
	}
}

impl fmt::Debug for Computed {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Computed")
			.field("inputs", &self.inputs)
			.finish_non_exhaustive()
	}
}

/// Strategy producing the value of one attribute.
#[derive(Debug, Clone)]
pub enum ValueGenerator {
	/// Always the same value.
	Constant(Value),
	/// Round-robin over a list of values.
	Cycle(Cycle),
	/// Counter-driven values.
	Sequence(Sequence),
	/// Random pick from a list of values.
	RandomChoice(RandomChoice),
	/// Function of other attributes.
	Computed(Computed),
	/// Nested instance produced by another factory.
	Association(Association),
}

impl ValueGenerator {
	/// Constant generator from any serializable value.
	pub fn constant<T: Serialize>(value: &T) -> FactoryResult<Self> {
		Ok(Self::Constant(serde_json::to_value(value)?))
	}

	/// Names that must be resolved before this generator runs.
	pub fn dependencies(&self) -> Vec<String> {
		match self {
			Self::Constant(_) | Self::Cycle(_) | Self::RandomChoice(_) => Vec::new(),
			Self::Sequence(sequence) => sequence.inputs.clone(),
			Self::Computed(computed) => computed.inputs.clone(),
			Self::Association(association) => association.lookups(),
		}
	}

	/// Evaluates every variant except [`ValueGenerator::Association`], which
	/// needs a registry and is dispatched by the resolver.
	pub(crate) fn generate(&self, attribute: &str, inputs: &Inputs<'_>) -> FactoryResult<Value> {
		let empty = || FactoryError::EmptySequence {
			attribute: attribute.to_string(),
		};
		match self {
			Self::Constant(value) => Ok(value.clone()),
			Self::Cycle(cycle) => cycle.next_value().ok_or_else(empty),
			Self::Sequence(sequence) => Ok(sequence.next_value(inputs)),
			Self::RandomChoice(choice) => choice.pick().ok_or_else(empty),
			Self::Computed(computed) => Ok(computed.compute(inputs)),
			Self::Association(_) => Err(FactoryError::InvalidDefinition(format!(
				"association `{}` evaluated outside of a registry",
				attribute
			))),
		}
	}
}

macro_rules! impl_constant_from {
	($($ty:ty),* $(,)?) => {
		$(
			impl From<$ty> for ValueGenerator {
				fn from(value: $ty) -> Self {
					Self::Constant(Value::from(value))
				}
			}
		)*
	};
}

impl_constant_from!(Value, &str, String, bool, i32, i64, u32, u64, f64);

impl From<Cycle> for ValueGenerator {
	fn from(cycle: Cycle) -> Self {
		Self::Cycle(cycle)
	}
}

impl From<Sequence> for ValueGenerator {
	fn from(sequence: Sequence) -> Self {
		Self::Sequence(sequence)
	}
}

impl From<RandomChoice> for ValueGenerator {
	fn from(choice: RandomChoice) -> Self {
		Self::RandomChoice(choice)
	}
}

impl From<Computed> for ValueGenerator {
	fn from(computed: Computed) -> Self {
		Self::Computed(computed)
	}
}

impl From<Association> for ValueGenerator {
	fn from(association: Association) -> Self {
		Self::Association(association)
	}
}
