//! Error types for wire conversion.

use thiserror::Error;

/// A value could not be coerced to the declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CastError {
	#[error("Cannot cast null as {target}")]
	Null { target: String },

	#[error("Cannot cast {found} as {target}")]
	Mismatch { found: String, target: String },

	/// Exact-value conversion failed (e.g. 64-bit value outside 32-bit range).
	#[error("Value {value} out of {target} range")]
	OutOfRange { value: String, target: String },

	#[error("{ty} cannot be carried by this protocol")]
	Unsupported { ty: String },

	#[error("No constant {constant} in {target}")]
	UnknownConstant { constant: String, target: String },

	#[error("Missing field {field} in {class}")]
	MissingField { field: String, class: String },
}

impl CastError {
	pub fn null(target: impl ToString) -> Self {
		Self::Null { target: target.to_string() }
	}

	pub fn mismatch(found: impl ToString, target: impl ToString) -> Self {
		Self::Mismatch {
			found: found.to_string(),
			target: target.to_string(),
		}
	}

	pub fn out_of_range(value: impl ToString, target: impl ToString) -> Self {
		Self::OutOfRange {
			value: value.to_string(),
			target: target.to_string(),
		}
	}

	pub fn unsupported(ty: impl ToString) -> Self {
		Self::Unsupported { ty: ty.to_string() }
	}
}

/// Serializing a value graph into an object stream failed.
#[derive(Debug, Error)]
pub enum MarshalError {
	/// Application components never cross the bridge.
	#[error("Application component {0} cannot be serialized")]
	Component(String),

	#[error("{0} is not serializable")]
	NotSerializable(String),

	/// A remote object had no way to be referenced from this side.
	#[error("Remote object cannot be referenced: {0}")]
	Unreferenceable(String),

	#[error("Object stream encoding failed: {0}")]
	Encode(#[from] rmp_serde::encode::Error),

	#[error(transparent)]
	Cast(#[from] CastError),
}

/// Decoding an object stream failed.
#[derive(Debug, Error)]
pub enum UnmarshalError {
	#[error("Invalid base64 payload: {0}")]
	Base64(#[from] base64::DecodeError),

	#[error("Empty object stream")]
	Empty,

	#[error("Invalid object stream header")]
	BadHeader,

	#[error("Unsupported object stream version {0}")]
	Version(u8),

	#[error("Malformed object stream: {0}")]
	Decode(#[from] rmp_serde::decode::Error),

	#[error("Dangling back-reference {0}")]
	DanglingHandle(u32),

	#[error("Handle {found} out of order, expected {expected}")]
	HandleOrder { found: u32, expected: u32 },

	/// A reference token named an id the resolver does not know.
	#[error("No remote object with id {0}")]
	UnknownInstance(String),

	#[error("Remote references cannot be resolved here: {0}")]
	Unresolvable(String),

	#[error("Expected {expected}, got {found}")]
	Unexpected { expected: &'static str, found: String },
}

/// An invocation descriptor or envelope had the wrong shape.
#[derive(Debug, Error)]
pub enum ProtocolViolation {
	#[error("Invocation must be a JSON object, got {0}")]
	NotAnObject(String),

	#[error("Invalid invocation: {0}")]
	Shape(#[from] serde_json::Error),

	#[error("instanceId and className must be given together")]
	UnpairedTarget,

	#[error("Unknown error kind {0}")]
	UnknownErrorKind(String),

	#[error("Envelope field {0} is missing or not a string")]
	MissingField(&'static str),
}
