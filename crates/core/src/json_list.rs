//! Ordered collection returned by typed list results.

use std::ops::Deref;

use serde_json::Value;
use tbrpc_protocol::marshal::json_mismatch;
use tbrpc_protocol::{CastError, Marshal, TypeDesc};

/// Elements of a JSON array result, each cast to `T`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct JsonArrayList<T>(Vec<T>);

impl<T> JsonArrayList<T> {
	pub fn new(items: Vec<T>) -> Self {
		Self(items)
	}

	pub fn as_list(&self) -> &[T] {
		&self.0
	}

	pub fn into_vec(self) -> Vec<T> {
		self.0
	}
}

impl<T> Deref for JsonArrayList<T> {
	type Target = [T];

	fn deref(&self) -> &[T] {
		&self.0
	}
}

impl<T> From<Vec<T>> for JsonArrayList<T> {
	fn from(items: Vec<T>) -> Self {
		Self(items)
	}
}

impl<T> FromIterator<T> for JsonArrayList<T> {
	fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl<T> IntoIterator for JsonArrayList<T> {
	type Item = T;
	type IntoIter = std::vec::IntoIter<T>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

impl<'a, T> IntoIterator for &'a JsonArrayList<T> {
	type Item = &'a T;
	type IntoIter = std::slice::Iter<'a, T>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}

impl<T: Marshal> Marshal for JsonArrayList<T> {
	fn describe() -> TypeDesc {
		TypeDesc::list(T::describe())
	}

	fn into_json(self) -> Result<Value, CastError> {
		self.0.into_iter().map(T::into_json).collect::<Result<Vec<_>, _>>().map(Value::Array)
	}

	fn from_json(value: Value) -> Result<Self, CastError> {
		match value {
			Value::Array(items) => items.into_iter().map(T::from_json).collect(),
			other => Err(json_mismatch(&other, &Self::describe())),
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn test_elements_are_cast() {
		let list = JsonArrayList::<f64>::from_json(json!([1, 2.5])).unwrap();
		assert_eq!(list.as_list(), &[1.0, 2.5]);

		let list = JsonArrayList::<Option<i32>>::from_json(json!([7, null])).unwrap();
		assert_eq!(list.into_vec(), vec![Some(7), None]);
	}

	#[test]
	fn test_element_failure_names_types() {
		let err = JsonArrayList::<i32>::from_json(json!(["x"])).unwrap_err();
		assert_eq!(err.to_string(), "Cannot cast String as int");
	}

	#[test]
	fn test_long_elements() {
		let list = JsonArrayList::<i64>::from_json(json!([1, 5_000_000_000i64])).unwrap();
		assert_eq!(list.len(), 2);
		assert_eq!(list[1], 5_000_000_000);
	}

	#[test]
	fn test_null_is_not_a_list() {
		let err = JsonArrayList::<String>::from_json(Value::Null).unwrap_err();
		assert_eq!(err.to_string(), "Cannot cast null as JsonArrayList<String>");
	}
}
