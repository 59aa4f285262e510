//! Model contract.
//!
//! The engine never assigns fields by name. Resolved attributes are turned into
//! an instance by deserializing them, and nested instances are fed back into a
//! parent context by serializing them.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{FactoryError, FactoryResult};

/// A record type factories can produce.
///
/// # Example
///
/// ```
/// use genuine_factory::Model;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct User {
///     given_name: String,
///     family_name: String,
///     email: Option<String>,
/// }
///
/// impl Model for User {
///     fn field_names() -> Vec<&'static str> {
///         vec!["given_name", "family_name", "email"]
///     }
/// }
/// ```
pub trait Model: Serialize + DeserializeOwned + Send + Sync + 'static {
	/// Name used in error messages and logs.
	fn model_name() -> &'static str {
		short_type_name(std::any::type_name::<Self>())
	}

	/// Field names in declaration order.
	///
	/// Every listed field starts out as a `null` constant, so attributes no
	/// factory layer sets still deserialize into `Option` fields.
	fn field_names() -> Vec<&'static str> {
		Vec::new()
	}
}

/// Drops the module path of a type name, keeping generic arguments as is.
fn short_type_name(full: &'static str) -> &'static str {
	let path_end = full.find('<').unwrap_or(full.len());
	let start = full[..path_end].rfind("::").map_or(0, |index| index + 2);
	&full[start..]
}

/// Builds a model instance from resolved attribute values.
pub(crate) fn instantiate<M: Model>(attributes: Map<String, Value>) -> FactoryResult<M> {
	serde_json::from_value(Value::Object(attributes)).map_err(|source| {
		FactoryError::Instantiation {
			model: M::model_name().to_string(),
			source,
		}
	})
}
