//! Models shared by the integration tests.

#![allow(dead_code)]

use genuine_factory::Model;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
	pub given_name: String,
	pub family_name: String,
	pub email: Option<String>,
	pub admin: bool,
}

impl Model for User {
	fn field_names() -> Vec<&'static str> {
		vec!["given_name", "family_name", "email", "admin"]
	}
}

/// Model exercising trait and derivation layering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specimen {
	pub spec: String,
	pub tr1: Option<String>,
	pub tr2: Option<String>,
	pub tr3: Option<String>,
}

impl Specimen {
	pub fn new(spec: &str, tr1: Option<&str>, tr2: Option<&str>, tr3: Option<&str>) -> Self {
		Self {
			spec: spec.to_string(),
			tr1: tr1.map(str::to_string),
			tr2: tr2.map(str::to_string),
			tr3: tr3.map(str::to_string),
		}
	}
}

impl Model for Specimen {
	fn field_names() -> Vec<&'static str> {
		vec!["spec", "tr1", "tr2", "tr3"]
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
	pub id: u64,
	pub name: String,
	pub profile: Option<Profile>,
}

impl Model for Account {
	fn field_names() -> Vec<&'static str> {
		vec!["id", "name", "profile"]
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
	pub user_id: u64,
	pub spirit_animal: Option<String>,
	pub bio: Option<String>,
}

impl Model for Profile {
	fn field_names() -> Vec<&'static str> {
		vec!["user_id", "spirit_animal", "bio"]
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
	pub message: String,
	pub commenter: Account,
}

impl Model for Comment {}

/// Self-referencing model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
	pub label: String,
	pub next: Option<Box<Node>>,
}

impl Model for Node {}
