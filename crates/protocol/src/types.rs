//! Type descriptors for declared signatures.
//!
//! A [`TypeDesc`] is what a [`Marshal`](crate::Marshal) type reports about
//! itself. Clients validate descriptors against the active call mode before a
//! proxy exists, and both ends derive method-table signatures from them.

use std::fmt;

use crate::constants::STUB_REPLACEMENT;

/// Primitive (non-nullable scalar) types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
	Boolean,
	Byte,
	Short,
	Char,
	Int,
	Long,
	Float,
	Double,
}

impl Primitive {
	pub const ALL: [Primitive; 8] = [
		Self::Boolean,
		Self::Byte,
		Self::Short,
		Self::Char,
		Self::Int,
		Self::Long,
		Self::Float,
		Self::Double,
	];

	pub const fn keyword(self) -> &'static str {
		match self {
			Self::Boolean => "boolean",
			Self::Byte => "byte",
			Self::Short => "short",
			Self::Char => "char",
			Self::Int => "int",
			Self::Long => "long",
			Self::Float => "float",
			Self::Double => "double",
		}
	}

	/// Name of the nullable form.
	pub const fn boxed_name(self) -> &'static str {
		match self {
			Self::Boolean => "Boolean",
			Self::Byte => "Byte",
			Self::Short => "Short",
			Self::Char => "Character",
			Self::Int => "Integer",
			Self::Long => "Long",
			Self::Float => "Float",
			Self::Double => "Double",
		}
	}

	pub fn from_keyword(keyword: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|p| p.keyword() == keyword)
	}

	pub fn from_boxed_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|p| p.boxed_name() == name)
	}
}

/// Shape of a declared argument or return type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDesc {
	Void,
	Primitive(Primitive),
	/// Nullable form of a primitive.
	Boxed(Primitive),
	String,
	/// Any JSON value.
	JsonValue,
	/// A JSON object.
	JsonObject,
	/// Enumeration passed by constant name.
	Enum(&'static str),
	Array(Box<TypeDesc>),
	/// Typed JSON list return (`JsonArrayList<T>`).
	List(Box<TypeDesc>),
	/// Type passed by value through the object stream.
	Record(&'static str),
	/// Remote object capability, named by interface.
	Remote(&'static str),
	/// Known to the bridge but not carried by either protocol.
	Unsupported(&'static str),
}

impl TypeDesc {
	pub fn array(component: TypeDesc) -> Self {
		Self::Array(Box::new(component))
	}

	pub fn list(element: TypeDesc) -> Self {
		Self::List(Box::new(element))
	}

	/// Nullable counterpart: primitives become boxed, everything else is
	/// already nullable.
	pub fn nullable(self) -> Self {
		match self {
			Self::Primitive(p) => Self::Boxed(p),
			other => other,
		}
	}

	/// Type name as written in a wire method signature.
	pub fn signature_name(&self) -> String {
		match self {
			Self::Remote(_) => STUB_REPLACEMENT.to_string(),
			Self::Array(component) => format!("{}[]", component.signature_name()),
			Self::List(_) => "JsonArrayList".to_string(),
			other => other.to_string(),
		}
	}

	/// Whether values of this type can be passed by value in the object
	/// stream, or by reference as a remote object.
	pub fn is_rmi_compatible(&self) -> bool {
		match self {
			Self::Void
			| Self::Primitive(_)
			| Self::Boxed(_)
			| Self::String
			| Self::JsonValue
			| Self::JsonObject
			| Self::Enum(_)
			| Self::Record(_)
			| Self::Remote(_) => true,
			Self::Array(component) => component.is_rmi_compatible(),
			Self::List(_) | Self::Unsupported(_) => false,
		}
	}
}

impl fmt::Display for TypeDesc {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Void => f.write_str("void"),
			Self::Primitive(p) => f.write_str(p.keyword()),
			Self::Boxed(p) => f.write_str(p.boxed_name()),
			Self::String => f.write_str("String"),
			Self::JsonValue => f.write_str("JsonValue"),
			Self::JsonObject => f.write_str("JsonObject"),
			Self::Array(component) => write!(f, "{component}[]"),
			Self::List(element) => write!(f, "JsonArrayList<{element}>"),
			Self::Enum(name) | Self::Record(name) | Self::Remote(name) | Self::Unsupported(name) => f.write_str(name),
		}
	}
}
