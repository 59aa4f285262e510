//! Free functions operating on the process-wide registry.
//!
//! Every test clears the registry first and runs serially.

mod helpers;

use genuine_factory::prelude::*;
use helpers::journal::Journal;
use helpers::models::User;
use rstest::rstest;
use serial_test::serial;

fn define_users(journal: &Journal) {
	let journal = journal.clone();
	define_factory::<User, _>(None, move |factory| {
		factory
			.set("given_name", Cycle::new(["A", "B"]))
			.set("family_name", "Global")
			.set("admin", false)
			.storage(move |user: &mut User, _: &Context| {
				journal.record(user.given_name.clone());
				Ok(())
			});
		Ok(())
	})
	.unwrap();
}

#[rstest]
#[serial(global_registry)]
fn test_free_functions_share_one_registry() {
	// Arrange
	clear_factories();
	let journal = Journal::new();
	define_users(&journal);

	// Act
	let built: User = build(BuildRequest::new()).unwrap();
	let created = create_many::<User>(2, BuildRequest::new()).unwrap();

	// Assert
	assert_eq!(built.given_name, "A");
	assert_eq!(created[0].given_name, "B");
	assert_eq!(created[1].given_name, "A");
	assert_eq!(journal.entries(), vec!["B", "A"]);
}

#[rstest]
#[serial(global_registry)]
fn test_resolve_after_clear() {
	// Arrange
	clear_factories();
	define_users(&Journal::new());
	assert!(resolve_factory::<User>(None).is_ok());

	// Act
	clear_factories();

	// Assert
	assert!(matches!(
		resolve_factory::<User>(None),
		Err(FactoryError::FactoryNotFound { .. })
	));
}

#[rstest]
#[serial(global_registry)]
fn test_attributes_for_and_build_many() {
	// Arrange
	clear_factories();
	let journal = Journal::new();
	define_users(&journal);
	define_factories::<User, _, _>([Some("staff")], |factory| {
		factory.set("admin", true);
		Ok(())
	})
	.unwrap();

	// Act
	let context = attributes_for::<User>(BuildRequest::new().with_alias("staff")).unwrap();
	let users = build_many::<User>(2, BuildRequest::new()).unwrap();
	let staff: User = create(BuildRequest::new().with_alias("staff")).unwrap();

	// Assert
	assert_eq!(context.get_bool("admin"), Some(true));
	assert_eq!(users.len(), 2);
	assert!(staff.admin);
	assert_eq!(journal.len(), 1);
	assert_eq!(genuine_factory::global_registry().len(), 2);
}
