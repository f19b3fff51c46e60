//! Conversions between Rust types and the two wire models.
//!
//! Simple calls carry plain JSON; reference-capable calls carry [`Serial`]
//! graphs. A [`Marshal`] type reports its [`TypeDesc`] and converts to and
//! from whichever models it supports. The coercion rules live here so both
//! ends apply them the same way:
//!
//! - null only converts into nullable targets;
//! - a 64-bit integer narrows to a 32-bit (or smaller) target by exact value;
//! - a 64-bit integer widens to a floating-point target when representable;
//! - anything else is a [`CastError`] naming both types.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::CastError;
use crate::serial::{Record, RemoteHandle, Serial, Throwable};
use crate::types::{Primitive, TypeDesc};

/// A type that may appear in a declared bridge signature.
pub trait Marshal: Sized {
	fn describe() -> TypeDesc;

	fn into_json(self) -> Result<Value, CastError> {
		Err(CastError::unsupported(Self::describe()))
	}

	fn from_json(value: Value) -> Result<Self, CastError> {
		Err(json_mismatch(&value, &Self::describe()))
	}

	fn into_serial(self) -> Result<Serial, CastError> {
		Err(CastError::unsupported(Self::describe()))
	}

	fn from_serial(value: Serial) -> Result<Self, CastError> {
		Err(serial_mismatch(&value, &Self::describe()))
	}
}

/// Name of a JSON value's wire type, as reported in cast failures.
pub fn json_type_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "Boolean",
		Value::Number(n) if n.is_f64() => "Double",
		Value::Number(_) => "Long",
		Value::String(_) => "String",
		Value::Array(_) => "List",
		Value::Object(_) => "Map",
	}
}

pub fn json_mismatch(value: &Value, target: &TypeDesc) -> CastError {
	match value {
		Value::Null => CastError::null(target),
		other => CastError::mismatch(json_type_name(other), target),
	}
}

pub fn serial_mismatch(value: &Serial, target: &TypeDesc) -> CastError {
	match value {
		Serial::Null => CastError::null(target),
		other => CastError::mismatch(other.type_name(), target),
	}
}

/// Widens a 64-bit integer to `f64`, refusing values that would round.
pub fn widen_to_double(value: i64) -> Result<f64, CastError> {
	let wide = value as f64;
	if wide as i128 == value as i128 {
		Ok(wide)
	} else {
		Err(CastError::out_of_range(value, TypeDesc::Primitive(Primitive::Double)))
	}
}

fn serial_integer(value: &Serial) -> Option<i64> {
	match value {
		Serial::Byte(v) => Some(i64::from(*v)),
		Serial::Short(v) => Some(i64::from(*v)),
		Serial::Int(v) => Some(i64::from(*v)),
		Serial::Long(v) => Some(*v),
		_ => None,
	}
}

macro_rules! integer {
	($ty:ty, $prim:ident, $variant:ident) => {
		impl Marshal for $ty {
			fn describe() -> TypeDesc {
				TypeDesc::Primitive(Primitive::$prim)
			}

			fn into_json(self) -> Result<Value, CastError> {
				Ok(Value::from(self))
			}

			fn from_json(value: Value) -> Result<Self, CastError> {
				match &value {
					Value::Number(n) => match n.as_i64() {
						Some(wide) => <$ty>::try_from(wide).map_err(|_| CastError::out_of_range(wide, Self::describe())),
						None if n.is_u64() => Err(CastError::out_of_range(n, Self::describe())),
						None => Err(json_mismatch(&value, &Self::describe())),
					},
					_ => Err(json_mismatch(&value, &Self::describe())),
				}
			}

			fn into_serial(self) -> Result<Serial, CastError> {
				Ok(Serial::$variant(self))
			}

			fn from_serial(value: Serial) -> Result<Self, CastError> {
				match serial_integer(&value) {
					Some(wide) => <$ty>::try_from(wide).map_err(|_| CastError::out_of_range(wide, Self::describe())),
					None => Err(serial_mismatch(&value, &Self::describe())),
				}
			}
		}
	};
}

integer!(i8, Byte, Byte);
integer!(i16, Short, Short);
integer!(i32, Int, Int);
integer!(i64, Long, Long);

impl Marshal for f64 {
	fn describe() -> TypeDesc {
		TypeDesc::Primitive(Primitive::Double)
	}

	fn into_json(self) -> Result<Value, CastError> {
		serde_json::Number::from_f64(self)
			.map(Value::Number)
			.ok_or_else(|| CastError::unsupported(format!("non-finite double {self}")))
	}

	fn from_json(value: Value) -> Result<Self, CastError> {
		match &value {
			Value::Number(n) => match (n.as_i64(), n.as_f64()) {
				(Some(wide), _) => widen_to_double(wide),
				(None, Some(d)) => Ok(d),
				(None, None) => Err(json_mismatch(&value, &Self::describe())),
			},
			_ => Err(json_mismatch(&value, &Self::describe())),
		}
	}

	fn into_serial(self) -> Result<Serial, CastError> {
		Ok(Serial::Double(self))
	}

	fn from_serial(value: Serial) -> Result<Self, CastError> {
		match value {
			Serial::Double(d) => Ok(d),
			Serial::Float(f) => Ok(f64::from(f)),
			other => match serial_integer(&other) {
				Some(wide) => widen_to_double(wide),
				None => Err(serial_mismatch(&other, &Self::describe())),
			},
		}
	}
}

impl Marshal for f32 {
	fn describe() -> TypeDesc {
		TypeDesc::Primitive(Primitive::Float)
	}

	fn into_json(self) -> Result<Value, CastError> {
		f64::from(self).into_json()
	}

	fn from_json(value: Value) -> Result<Self, CastError> {
		f64::from_json(value).map(|d| d as f32)
	}

	fn into_serial(self) -> Result<Serial, CastError> {
		Ok(Serial::Float(self))
	}

	fn from_serial(value: Serial) -> Result<Self, CastError> {
		match value {
			Serial::Float(f) => Ok(f),
			other => Err(serial_mismatch(&other, &Self::describe())),
		}
	}
}

impl Marshal for bool {
	fn describe() -> TypeDesc {
		TypeDesc::Primitive(Primitive::Boolean)
	}

	fn into_json(self) -> Result<Value, CastError> {
		Ok(Value::Bool(self))
	}

	fn from_json(value: Value) -> Result<Self, CastError> {
		match value {
			Value::Bool(b) => Ok(b),
			other => Err(json_mismatch(&other, &Self::describe())),
		}
	}

	fn into_serial(self) -> Result<Serial, CastError> {
		Ok(Serial::Bool(self))
	}

	fn from_serial(value: Serial) -> Result<Self, CastError> {
		match value {
			Serial::Bool(b) => Ok(b),
			other => Err(serial_mismatch(&other, &Self::describe())),
		}
	}
}

impl Marshal for char {
	fn describe() -> TypeDesc {
		TypeDesc::Primitive(Primitive::Char)
	}

	fn into_json(self) -> Result<Value, CastError> {
		Ok(Value::String(self.to_string()))
	}

	fn from_json(value: Value) -> Result<Self, CastError> {
		if let Value::String(s) = &value {
			let mut chars = s.chars();
			if let (Some(c), None) = (chars.next(), chars.next()) {
				return Ok(c);
			}
		}
		Err(json_mismatch(&value, &Self::describe()))
	}

	fn into_serial(self) -> Result<Serial, CastError> {
		Ok(Serial::Char(self))
	}

	fn from_serial(value: Serial) -> Result<Self, CastError> {
		match value {
			Serial::Char(c) => Ok(c),
			other => Err(serial_mismatch(&other, &Self::describe())),
		}
	}
}

impl Marshal for String {
	fn describe() -> TypeDesc {
		TypeDesc::String
	}

	fn into_json(self) -> Result<Value, CastError> {
		Ok(Value::String(self))
	}

	fn from_json(value: Value) -> Result<Self, CastError> {
		match value {
			Value::String(s) => Ok(s),
			other => Err(json_mismatch(&other, &Self::describe())),
		}
	}

	fn into_serial(self) -> Result<Serial, CastError> {
		Ok(Serial::String(self))
	}

	fn from_serial(value: Serial) -> Result<Self, CastError> {
		match value {
			Serial::String(s) => Ok(s),
			other => Err(serial_mismatch(&other, &Self::describe())),
		}
	}
}

/// Void: any result is discarded.
impl Marshal for () {
	fn describe() -> TypeDesc {
		TypeDesc::Void
	}

	fn into_json(self) -> Result<Value, CastError> {
		Ok(Value::Null)
	}

	fn from_json(_value: Value) -> Result<Self, CastError> {
		Ok(())
	}

	fn into_serial(self) -> Result<Serial, CastError> {
		Ok(Serial::Null)
	}

	fn from_serial(_value: Serial) -> Result<Self, CastError> {
		Ok(())
	}
}

impl<T: Marshal> Marshal for Option<T> {
	fn describe() -> TypeDesc {
		T::describe().nullable()
	}

	fn into_json(self) -> Result<Value, CastError> {
		match self {
			Some(value) => value.into_json(),
			None => Ok(Value::Null),
		}
	}

	fn from_json(value: Value) -> Result<Self, CastError> {
		match value {
			Value::Null => Ok(None),
			other => T::from_json(other).map(Some),
		}
	}

	fn into_serial(self) -> Result<Serial, CastError> {
		match self {
			Some(value) => value.into_serial(),
			None => Ok(Serial::Null),
		}
	}

	fn from_serial(value: Serial) -> Result<Self, CastError> {
		match value {
			Serial::Null => Ok(None),
			other => T::from_serial(other).map(Some),
		}
	}
}

impl<T: Marshal> Marshal for Vec<T> {
	fn describe() -> TypeDesc {
		TypeDesc::array(T::describe())
	}

	fn into_json(self) -> Result<Value, CastError> {
		self.into_iter().map(T::into_json).collect::<Result<Vec<_>, _>>().map(Value::Array)
	}

	fn from_json(value: Value) -> Result<Self, CastError> {
		match value {
			Value::Array(items) => items.into_iter().map(T::from_json).collect(),
			other => Err(json_mismatch(&other, &Self::describe())),
		}
	}

	fn into_serial(self) -> Result<Serial, CastError> {
		self.into_iter().map(T::into_serial).collect::<Result<Vec<_>, _>>().map(Serial::Array)
	}

	fn from_serial(value: Serial) -> Result<Self, CastError> {
		match value {
			Serial::Array(items) => items.into_iter().map(T::from_serial).collect(),
			other => Err(serial_mismatch(&other, &Self::describe())),
		}
	}
}

impl Marshal for Value {
	fn describe() -> TypeDesc {
		TypeDesc::JsonValue
	}

	fn into_json(self) -> Result<Value, CastError> {
		Ok(self)
	}

	fn from_json(value: Value) -> Result<Self, CastError> {
		Ok(value)
	}

	fn into_serial(self) -> Result<Serial, CastError> {
		Ok(Serial::Json(self))
	}

	fn from_serial(value: Serial) -> Result<Self, CastError> {
		match value.to_json() {
			Some(json) => Ok(json),
			None => Err(serial_mismatch(&value, &Self::describe())),
		}
	}
}

impl Marshal for Map<String, Value> {
	fn describe() -> TypeDesc {
		TypeDesc::JsonObject
	}

	fn into_json(self) -> Result<Value, CastError> {
		Ok(Value::Object(self))
	}

	fn from_json(value: Value) -> Result<Self, CastError> {
		match value {
			Value::Object(map) => Ok(map),
			other => Err(json_mismatch(&other, &Self::describe())),
		}
	}

	fn into_serial(self) -> Result<Serial, CastError> {
		Ok(Serial::Json(Value::Object(self)))
	}

	fn from_serial(value: Serial) -> Result<Self, CastError> {
		match value {
			Serial::Json(Value::Object(map)) => Ok(map),
			other => Err(serial_mismatch(&other, &Self::describe())),
		}
	}
}

/// Any serializable value, unconverted.
impl Marshal for Serial {
	fn describe() -> TypeDesc {
		TypeDesc::Record("Serializable")
	}

	fn into_json(self) -> Result<Value, CastError> {
		self.to_json().ok_or_else(|| CastError::unsupported(self.type_name()))
	}

	fn from_json(value: Value) -> Result<Self, CastError> {
		Ok(Serial::from_json(value))
	}

	fn into_serial(self) -> Result<Serial, CastError> {
		Ok(self)
	}

	fn from_serial(value: Serial) -> Result<Self, CastError> {
		Ok(value)
	}
}

impl Marshal for RemoteHandle {
	fn describe() -> TypeDesc {
		TypeDesc::Remote(crate::constants::RMI_REMOTE)
	}

	fn into_serial(self) -> Result<Serial, CastError> {
		Ok(Serial::Remote(self.into_object()))
	}

	fn from_serial(value: Serial) -> Result<Self, CastError> {
		match value {
			Serial::Remote(object) => Ok(RemoteHandle::new(object)),
			other => Err(serial_mismatch(&other, &Self::describe())),
		}
	}
}

impl Marshal for Throwable {
	fn describe() -> TypeDesc {
		TypeDesc::Record("Throwable")
	}

	fn into_serial(self) -> Result<Serial, CastError> {
		Ok(Serial::throwable(self))
	}

	fn from_serial(value: Serial) -> Result<Self, CastError> {
		match value {
			Serial::Throwable(t) => Ok(Arc::unwrap_or_clone(t)),
			other => Err(serial_mismatch(&other, &Self::describe())),
		}
	}
}

/// Handle to an application component.
///
/// Components are typed as serializable so signatures accept them, but the
/// object stream refuses to encode them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
	pub name: String,
}

impl Component {
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into() }
	}
}

impl Marshal for Component {
	fn describe() -> TypeDesc {
		TypeDesc::Record("Component")
	}

	fn into_serial(self) -> Result<Serial, CastError> {
		Ok(Serial::Component(self.name))
	}
}

/// Dynamically typed value, which neither protocol can carry.
pub struct AnyObject(pub Box<dyn Any + Send + Sync>);

impl Marshal for AnyObject {
	fn describe() -> TypeDesc {
		TypeDesc::Unsupported("Object")
	}
}

impl<K, V> Marshal for HashMap<K, V> {
	fn describe() -> TypeDesc {
		TypeDesc::Unsupported("Map")
	}
}

/// Unwraps a record of the given class.
pub fn expect_record(value: Serial, class: &'static str) -> Result<Arc<Record>, CastError> {
	match value {
		Serial::Record(record) if record.class == class => Ok(record),
		other => Err(serial_mismatch(&other, &TypeDesc::Record(class))),
	}
}

/// Constant name carried by a JSON enum argument.
pub fn json_constant(value: Value, enumeration: &'static str) -> Result<String, CastError> {
	match value {
		Value::String(name) => Ok(name),
		other => Err(json_mismatch(&other, &TypeDesc::Enum(enumeration))),
	}
}

/// Constant name carried by a serialized enum value.
pub fn serial_constant(value: Serial, enumeration: &'static str) -> Result<String, CastError> {
	match value {
		Serial::Enum { class, constant } if class == enumeration => Ok(constant),
		other => Err(serial_mismatch(&other, &TypeDesc::Enum(enumeration))),
	}
}

pub fn unknown_constant(constant: String, enumeration: &'static str) -> CastError {
	CastError::UnknownConstant {
		constant,
		target: enumeration.to_string(),
	}
}
