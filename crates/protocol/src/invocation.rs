//! Reference-capable call descriptors and response envelopes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::constants::{RESPONSE_DATA, RESPONSE_ERROR, RESPONSE_MARKER, RMI_MARKER};
use crate::error::ProtocolViolation;
use crate::error_kind::RmiErrorKind;

/// One method invocation sent to a view's `$call` callable.
///
/// `instance_id` and `class_name` are either both present (call a registered
/// object) or both absent (call the view itself).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invocation {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub instance_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub class_name: Option<String>,
	pub method_name: String,
	pub method_signature: Vec<String>,
	/// Base64 object stream holding the argument array.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub method_arguments: Option<String>,
}

impl Invocation {
	/// Invocation targeting the view itself.
	pub fn on_view(method_name: impl Into<String>, method_signature: Vec<String>) -> Self {
		Self {
			instance_id: None,
			class_name: None,
			method_name: method_name.into(),
			method_signature,
			method_arguments: None,
		}
	}

	/// Invocation targeting a registered object.
	pub fn on_instance(
		instance_id: impl Into<String>,
		class_name: impl Into<String>,
		method_name: impl Into<String>,
		method_signature: Vec<String>,
	) -> Self {
		Self {
			instance_id: Some(instance_id.into()),
			class_name: Some(class_name.into()),
			..Self::on_view(method_name, method_signature)
		}
	}

	pub fn with_arguments(mut self, arguments: String) -> Self {
		self.method_arguments = Some(arguments);
		self
	}

	/// Parses and validates a descriptor received from the client.
	pub fn parse(value: &Value) -> Result<Self, ProtocolViolation> {
		if !value.is_object() {
			return Err(ProtocolViolation::NotAnObject(value.to_string()));
		}
		let invocation: Invocation = serde_json::from_value(value.clone())?;
		if invocation.instance_id.is_some() != invocation.class_name.is_some() {
			return Err(ProtocolViolation::UnpairedTarget);
		}
		Ok(invocation)
	}

	pub fn to_json(&self) -> Value {
		serde_json::to_value(self).unwrap_or(Value::Null)
	}
}

/// Tagged reply of the reference-capable protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RmiResponse {
	/// Base64 object stream holding the result.
	Success { data: String },
	/// Classified failure; `data` holds a serialized throwable when the kind
	/// carries one.
	Failure { error: RmiErrorKind, data: Option<String> },
}

impl RmiResponse {
	pub fn to_json(&self) -> Value {
		match self {
			Self::Success { data } => json!({
				RESPONSE_MARKER: RMI_MARKER,
				RESPONSE_DATA: data,
			}),
			Self::Failure { error, data } => {
				let mut map = Map::new();
				map.insert(RESPONSE_MARKER.into(), Value::from(RMI_MARKER));
				map.insert(RESPONSE_ERROR.into(), Value::from(error.as_str()));
				if let Some(data) = data {
					map.insert(RESPONSE_DATA.into(), Value::from(data.as_str()));
				}
				Value::Object(map)
			}
		}
	}

	/// Reads an envelope; `None` if the value is not tagged with the marker.
	pub fn from_json(value: &Value) -> Option<Result<Self, ProtocolViolation>> {
		let object = value.as_object()?;
		if object.get(RESPONSE_MARKER).and_then(Value::as_str) != Some(RMI_MARKER) {
			return None;
		}
		let data = object.get(RESPONSE_DATA).and_then(Value::as_str).map(str::to_string);
		Some(match object.get(RESPONSE_ERROR) {
			None => data
				.map(|data| Self::Success { data })
				.ok_or(ProtocolViolation::MissingField(RESPONSE_DATA)),
			Some(Value::String(name)) => RmiErrorKind::from_name(name)
				.map(|error| Self::Failure { error, data })
				.ok_or_else(|| ProtocolViolation::UnknownErrorKind(name.clone())),
			Some(_) => Err(ProtocolViolation::MissingField(RESPONSE_ERROR)),
		})
	}
}
