//! Attribute resolution.
//!
//! Resolution happens in two phases. [`Plan::prepare`] layers the definition
//! chain, the requested traits and the caller overrides into one working set
//! and computes an evaluation order. [`Plan::resolve`] then evaluates every
//! generator in that order. Preparation fails before any generator runs, so a
//! rejected request never advances a counter.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use super::attributes::AttributeSet;
use super::builder::Scope;
use super::definition::{Factory, FactoryState, Hooks, Layer, StorageFn};
use super::generator::{Computed, Inputs, ValueGenerator};
use super::overrides::{Override, Overrides};
use super::registry::Registry;
use crate::context::Context;
use crate::error::{FactoryError, FactoryResult};
use crate::model::Model;
use crate::settings::FactorySettings;

static NULL: Value = Value::Null;

struct Step {
	name: String,
	inputs: Vec<String>,
	generator: ValueGenerator,
}

/// Layered definition of one request, ready to be resolved any number of
/// times.
pub(crate) struct Plan<M> {
	steps: Vec<Step>,
	attributes: Vec<String>,
	transients: Vec<String>,
	pub(crate) hooks: Hooks<M>,
	pub(crate) storage: Option<StorageFn<M>>,
}

impl<M: Model> Plan<M> {
	pub(crate) fn prepare(
		factory: &Arc<Factory<M>>,
		traits: &[String],
		overrides: &Overrides,
		settings: &FactorySettings,
	) -> FactoryResult<Self> {
		let chain: Vec<FactoryState<M>> = Factory::chain(factory)?
			.iter()
			.map(|member| member.snapshot())
			.collect();

		let mut attributes = AttributeSet::new();
		let mut stubs: HashSet<String> = HashSet::new();
		if settings.stub_missing_fields {
			for field in M::field_names() {
				attributes.set(field, Value::Null);
				stubs.insert(field.to_string());
			}
		}
		let mut transients = AttributeSet::new();
		let mut hooks = Hooks::default();

		let mut apply = |layer: &Layer<M>, with_hooks: bool| {
			for name in layer.attributes.names() {
				stubs.remove(name);
			}
			attributes.merge(&layer.attributes);
			transients.merge(&layer.transients);
			if with_hooks {
				hooks.extend(&layer.hooks);
			}
		};

		for state in &chain {
			apply(&state.base, true);
		}
		// Repeated traits layer attributes again but register hooks once.
		let mut hooked: HashSet<&str> = HashSet::new();
		for trait_name in traits {
			let first = hooked.insert(trait_name.as_str());
			let mut found = false;
			for state in &chain {
				if let Some(layer) = state.traits.get(trait_name) {
					apply(layer, first);
					found = true;
				}
			}
			if !found {
				return Err(FactoryError::TraitNotFound {
					model: M::model_name().to_string(),
					trait_name: trait_name.clone(),
				});
			}
		}

		// A declared attribute shadows a transient of the same name, a bare
		// field stub does not.
		let shared: Vec<String> = transients
			.names()
			.filter(|name| attributes.contains(name))
			.map(str::to_string)
			.collect();
		for name in shared {
			if stubs.contains(&name) {
				attributes.remove(&name);
			} else {
				transients.remove(&name);
			}
		}

		apply_overrides(&mut attributes, &mut transients, overrides)?;

		let storage = chain.iter().rev().find_map(|state| state.storage.clone());
		let steps = order(&transients, &attributes)?;
		tracing::trace!(
			model = M::model_name(),
			order = ?steps.iter().map(|step| step.name.as_str()).collect::<Vec<_>>(),
			"resolution order"
		);

		Ok(Self {
			steps,
			attributes: attributes.names().map(str::to_string).collect(),
			transients: transients.names().map(str::to_string).collect(),
			hooks,
			storage,
		})
	}

	/// Evaluates every generator and returns the resulting context.
	pub(crate) fn resolve(&self, registry: &Registry, scope: Scope) -> FactoryResult<Context> {
		let mut values: HashMap<String, Value> = HashMap::with_capacity(self.steps.len());
		for step in &self.steps {
			let value = match &step.generator {
				ValueGenerator::Association(association) => {
					association.produce(registry, |name| values.get(name), scope)?
				}
				generator => {
					let inputs = step
						.inputs
						.iter()
						.map(|name| values.get(name).unwrap_or(&NULL))
						.collect();
					generator.generate(&step.name, &Inputs::new(&step.inputs, inputs))?
				}
			};
			values.insert(step.name.clone(), value);
		}

		let mut ordered = IndexMap::with_capacity(values.len());
		for name in self.attributes.iter().chain(&self.transients) {
			if let Some(value) = values.remove(name) {
				ordered.insert(name.clone(), value);
			}
		}
		let transients: IndexSet<String> = self.transients.iter().cloned().collect();
		Ok(Context::new(ordered, transients))
	}
}

fn apply_overrides(
	attributes: &mut AttributeSet,
	transients: &mut AttributeSet,
	overrides: &Overrides,
) -> FactoryResult<()> {
	for (name, value) in overrides.iter() {
		let target = if transients.contains(name) {
			&mut *transients
		} else {
			&mut *attributes
		};
		match value {
			Override::Value(value) => target.set(name, value.clone()),
			Override::Generator(generator) => target.set(name, generator.clone()),
			Override::Lookup(source) => target.set(name, Computed::copy_of(source.as_str())),
			Override::Nested(nested) => match target.get_mut(name) {
				Some(ValueGenerator::Association(association)) => association.apply_overrides(nested),
				_ => {
					return Err(FactoryError::InvalidOverride {
						attribute: name.to_string(),
						message: "nested overrides only apply to associations".to_string(),
					});
				}
			},
		}
	}
	Ok(())
}

/// Orders generators so that every one runs after its inputs.
///
/// Ready generators are taken in declaration order, transients first, until
/// nothing is left. If a pass makes no progress the remaining generators
/// contain a cycle.
fn order(transients: &AttributeSet, attributes: &AttributeSet) -> FactoryResult<Vec<Step>> {
	let mut pending: Vec<Step> = transients
		.iter()
		.chain(attributes.iter())
		.map(|(name, generator)| Step {
			name: name.to_string(),
			inputs: generator.dependencies(),
			generator: generator.clone(),
		})
		.collect();

	for step in &pending {
		if let Some(missing) = step
			.inputs
			.iter()
			.find(|input| !transients.contains(input.as_str()) && !attributes.contains(input.as_str()))
		{
			return Err(FactoryError::UnknownDependency {
				attribute: step.name.clone(),
				dependency: missing.clone(),
			});
		}
	}

	let mut ordered: Vec<Step> = Vec::with_capacity(pending.len());
	let mut resolved: HashSet<String> = HashSet::new();
	while !pending.is_empty() {
		let before = pending.len();
		let mut waiting = Vec::with_capacity(pending.len());
		for step in pending {
			if step.inputs.iter().all(|input| resolved.contains(input)) {
				resolved.insert(step.name.clone());
				ordered.push(step);
			} else {
				waiting.push(step);
			}
		}
		pending = waiting;
		if pending.len() == before {
			return Err(FactoryError::CyclicDependency {
				cycle: find_cycle(&pending),
			});
		}
	}
	Ok(ordered)
}

/// Returns one cycle among `steps`, first name repeated at the end.
fn find_cycle(steps: &[Step]) -> Vec<String> {
	let graph: HashMap<&str, &[String]> = steps
		.iter()
		.map(|step| (step.name.as_str(), step.inputs.as_slice()))
		.collect();
	let mut visited: HashSet<&str> = HashSet::new();

	fn visit<'a>(
		node: &'a str,
		graph: &HashMap<&'a str, &'a [String]>,
		visited: &mut HashSet<&'a str>,
		path: &mut Vec<&'a str>,
	) -> Option<Vec<String>> {
		if let Some(start) = path.iter().position(|entry| *entry == node) {
			let mut cycle: Vec<String> = path[start..].iter().map(|name| name.to_string()).collect();
			cycle.push(node.to_string());
			return Some(cycle);
		}
		if !visited.insert(node) {
			return None;
		}
		path.push(node);
		for input in graph.get(node).copied().unwrap_or_default() {
			if !graph.contains_key(input.as_str()) {
				continue;
			}
			if let Some(cycle) = visit(input.as_str(), graph, visited, path) {
				return Some(cycle);
			}
		}
		path.pop();
		None
	}

	for step in steps {
		let mut path = Vec::new();
		if let Some(cycle) = visit(step.name.as_str(), &graph, &mut visited, &mut path) {
			return cycle;
		}
	}
	steps.iter().map(|step| step.name.clone()).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn computed(inputs: &[&str]) -> ValueGenerator {
		Computed::new(inputs.iter().copied(), |_| Value::Null).into()
	}

	fn names(steps: &[Step]) -> Vec<&str> {
		steps.iter().map(|step| step.name.as_str()).collect()
	}

	#[rstest]
	fn test_order_respects_inputs() {
		// Arrange
		let mut attributes = AttributeSet::new();
		attributes.set("email", computed(&["given_name", "family_name"]));
		attributes.set("given_name", "John");
		attributes.set("family_name", "Smith");

		// Act
		let steps = order(&AttributeSet::new(), &attributes).unwrap();

		// Assert
		assert_eq!(names(&steps), vec!["given_name", "family_name", "email"]);
	}

	#[rstest]
	fn test_order_transients_first() {
		let mut transients = AttributeSet::new();
		transients.set("upcased", false);
		let mut attributes = AttributeSet::new();
		attributes.set("name", "john");

		let steps = order(&transients, &attributes).unwrap();

		assert_eq!(names(&steps), vec!["upcased", "name"]);
	}

	#[rstest]
	fn test_order_unknown_dependency() {
		let mut attributes = AttributeSet::new();
		attributes.set("email", computed(&["nickname"]));

		let result = order(&AttributeSet::new(), &attributes);

		assert!(matches!(
			result,
			Err(FactoryError::UnknownDependency { attribute, dependency })
				if attribute == "email" && dependency == "nickname"
		));
	}

	#[rstest]
	#[case(vec![("a", vec!["b"]), ("b", vec!["a"])], vec!["a", "b", "a"])]
	#[case(vec![("a", vec!["a"])], vec!["a", "a"])]
	#[case(
		vec![("x", vec![]), ("a", vec!["b"]), ("b", vec!["c"]), ("c", vec!["a", "x"])],
		vec!["a", "b", "c", "a"]
	)]
	fn test_order_reports_cycle(
		#[case] graph: Vec<(&str, Vec<&str>)>,
		#[case] expected: Vec<&str>,
	) {
		// Arrange
		let mut attributes = AttributeSet::new();
		for (name, inputs) in graph {
			attributes.set(name, computed(&inputs));
		}

		// Act
		let result = order(&AttributeSet::new(), &attributes);

		// Assert
		match result {
			Err(FactoryError::CyclicDependency { cycle }) => assert_eq!(cycle, expected),
			Err(other) => panic!("unexpected error: {other}"),
			Ok(steps) => panic!("unexpected order: {:?}", names(&steps)),
		}
	}

	#[rstest]
	fn test_overrides_target_transients() {
		// Arrange
		let mut attributes = AttributeSet::new();
		attributes.set("name", "john");
		let mut transients = AttributeSet::new();
		transients.set("upcased", false);
		let overrides = Overrides::new().set("upcased", true).set("age", 42_i64);

		// Act
		apply_overrides(&mut attributes, &mut transients, &overrides).unwrap();

		// Assert
		let upcased = transients
			.get("upcased")
			.unwrap()
			.generate("upcased", &Inputs::empty())
			.unwrap();
		assert_eq!(upcased, json!(true));
		assert_eq!(attributes.names().collect::<Vec<_>>(), vec!["name", "age"]);
	}

	#[rstest]
	fn test_nested_override_on_plain_attribute() {
		let mut attributes = AttributeSet::new();
		attributes.set("name", "john");
		let overrides = Overrides::new().set("name", Overrides::new().set("x", 1_i64));

		let result = apply_overrides(&mut attributes, &mut AttributeSet::new(), &overrides);

		assert!(matches!(
			result,
			Err(FactoryError::InvalidOverride { attribute, .. }) if attribute == "name"
		));
	}
}
