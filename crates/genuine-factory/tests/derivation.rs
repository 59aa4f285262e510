//! Derived factories, aliases and trait inheritance.

mod helpers;

use std::sync::Arc;

use genuine_factory::prelude::*;
use helpers::models::{Specimen, User};
use rstest::{fixture, rstest};

/// Three-level chain: main, derived1 from main, derived2 from derived1.
///
/// Every level defines a different subset of the traits tr1, tr2 and tr3.
#[fixture]
fn specimens() -> Registry {
	let registry = Registry::new();
	registry
		.define_factory::<Specimen, _>(None, |main| {
			main.set("spec", "main");
			main.define_trait("tr1").set("tr1", "main");
			main.define_trait("tr2").set("tr2", "main");
			main.define_trait("tr3").set("tr3", "main");

			main.derived_factory("derived1", |derived1| {
				derived1.set("spec", "derived1");
				derived1.define_trait("tr2").set("tr2", "derived1");

				derived1.derived_factory("derived2", |derived2| {
					derived2.set("spec", "derived2");
					derived2.define_trait("tr1").set("tr1", "derived2");
					derived2.define_trait("tr3").set("tr3", "derived2");
					Ok(())
				})?;
				Ok(())
			})?;
			Ok(())
		})
		.unwrap();
	registry
}

#[rstest]
#[case(None, &[], Specimen::new("main", None, None, None))]
#[case(Some("derived1"), &[], Specimen::new("derived1", None, None, None))]
#[case(Some("derived2"), &[], Specimen::new("derived2", None, None, None))]
#[case(None, &["tr1"], Specimen::new("main", Some("main"), None, None))]
#[case(None, &["tr2"], Specimen::new("main", None, Some("main"), None))]
#[case(None, &["tr3"], Specimen::new("main", None, None, Some("main")))]
#[case(Some("derived1"), &["tr1"], Specimen::new("derived1", Some("main"), None, None))]
#[case(Some("derived1"), &["tr2"], Specimen::new("derived1", None, Some("derived1"), None))]
#[case(Some("derived1"), &["tr3"], Specimen::new("derived1", None, None, Some("main")))]
#[case(Some("derived2"), &["tr1"], Specimen::new("derived2", Some("derived2"), None, None))]
#[case(Some("derived2"), &["tr2"], Specimen::new("derived2", None, Some("derived1"), None))]
#[case(Some("derived2"), &["tr3"], Specimen::new("derived2", None, None, Some("derived2")))]
#[case(None, &["tr1", "tr2"], Specimen::new("main", Some("main"), Some("main"), None))]
#[case(None, &["tr2", "tr3"], Specimen::new("main", None, Some("main"), Some("main")))]
#[case(
	Some("derived1"),
	&["tr1", "tr2"],
	Specimen::new("derived1", Some("main"), Some("derived1"), None)
)]
#[case(
	Some("derived1"),
	&["tr2", "tr3"],
	Specimen::new("derived1", None, Some("derived1"), Some("main"))
)]
#[case(
	Some("derived2"),
	&["tr1", "tr2"],
	Specimen::new("derived2", Some("derived2"), Some("derived1"), None)
)]
#[case(
	Some("derived2"),
	&["tr2", "tr3"],
	Specimen::new("derived2", None, Some("derived1"), Some("derived2"))
)]
fn test_derivation_and_trait_layering(
	specimens: Registry,
	#[case] alias: Option<&str>,
	#[case] traits: &[&str],
	#[case] expected: Specimen,
) {
	// Arrange
	let mut request = BuildRequest::new().with_traits(traits.iter().copied());
	if let Some(alias) = alias {
		request = request.with_alias(alias);
	}

	// Act
	let specimen: Specimen = specimens.build(request).unwrap();

	// Assert
	assert_eq!(specimen, expected);
}

#[rstest]
fn test_rederiving_from_another_parent_fails(specimens: Registry) {
	// Act
	let result = specimens.define_factory::<Specimen, _>(None, |main| {
		main.derived_factory("derived2", |_| Ok(()))?;
		Ok(())
	});

	// Assert
	assert!(matches!(
		result,
		Err(FactoryError::DuplicateDefinition { model, alias, .. })
			if model == "Specimen" && alias == "derived2"
	));
}

#[rstest]
fn test_rederiving_from_same_parent_returns_existing(specimens: Registry) {
	// Arrange
	let existing = specimens
		.resolve_factory::<Specimen>(Some("derived1"))
		.unwrap();

	// Act
	let mut derived = None;
	specimens
		.define_factory::<Specimen, _>(None, |main| {
			derived = Some(main.derived_factory("derived1", |_| Ok(()))?);
			Ok(())
		})
		.unwrap();

	// Assert
	assert!(Arc::ptr_eq(&existing, &derived.unwrap()));
}

#[rstest]
fn test_derived_factory_needs_a_name(specimens: Registry) {
	let result = specimens.define_factory::<Specimen, _>(None, |main| {
		main.derived_factory("", |_| Ok(()))?;
		Ok(())
	});

	assert!(matches!(result, Err(FactoryError::InvalidDefinition(_))));
}

#[rstest]
fn test_derivation_chain(specimens: Registry) {
	let derived2 = specimens
		.resolve_factory::<Specimen>(Some("derived2"))
		.unwrap();

	let chain = genuine_factory::Factory::chain(&derived2).unwrap();

	let aliases: Vec<_> = chain.iter().map(|factory| factory.alias()).collect();
	assert_eq!(aliases, vec![None, Some("derived1"), Some("derived2")]);
}

#[rstest]
fn test_mutations_before_failure_are_kept() {
	// Arrange
	let registry = Registry::new();

	// Act
	let result = registry.define_factory::<User, _>(None, |factory| {
		factory.set("given_name", "Kept");
		Err(FactoryError::InvalidDefinition("stop".to_string()))
	});

	// Assert
	assert!(result.is_err());
	let factory = registry.resolve_factory::<User>(None).unwrap();
	assert_eq!(factory.attribute_names(), vec!["given_name".to_string()]);
}

#[rstest]
fn test_alias_inherits_default_definition() {
	// Arrange
	let registry = Registry::new();
	registry
		.define_factory::<User, _>(None, |factory| {
			factory
				.set("given_name", "John")
				.set("family_name", "Smith")
				.set("admin", false);
			factory.define_trait("admin").set("admin", true);
			Ok(())
		})
		.unwrap();
	registry
		.define_factory::<User, _>(Some("jane"), |factory| {
			factory.set("given_name", "Jane");
			Ok(())
		})
		.unwrap();

	// Act
	let jane: User = registry
		.build(BuildRequest::new().with_alias("jane").with_trait("admin"))
		.unwrap();

	// Assert
	assert_eq!(jane.given_name, "Jane");
	assert_eq!(jane.family_name, "Smith");
	assert!(jane.admin);
}

#[rstest]
fn test_alias_defined_before_default() {
	// Arrange
	let registry = Registry::new();
	registry
		.define_factory::<User, _>(Some("early"), |factory| {
			factory.set("given_name", "Early");
			Ok(())
		})
		.unwrap();

	// Act
	registry
		.define_factory::<User, _>(None, |factory| {
			factory
				.set("given_name", "Default")
				.set("family_name", "Late")
				.set("admin", false);
			Ok(())
		})
		.unwrap();
	let early: User = registry
		.build(BuildRequest::new().with_alias("early"))
		.unwrap();

	// Assert
	assert_eq!(early.given_name, "Early");
	assert_eq!(early.family_name, "Late");
}

#[rstest]
fn test_define_factories_shares_configuration() {
	// Arrange
	let registry = Registry::new();

	// Act
	registry
		.define_factories::<User, _, _>([Some("alpha"), Some("beta")], |factory| {
			factory
				.set("given_name", "Twin")
				.set("family_name", "Doe")
				.set("admin", true);
			Ok(())
		})
		.unwrap();

	// Assert
	for alias in ["alpha", "beta"] {
		let user: User = registry
			.build(BuildRequest::new().with_alias(alias))
			.unwrap();
		assert_eq!(user.given_name, "Twin");
		assert!(user.admin);
	}
	assert!(registry.has_factory::<User>(None));
}
