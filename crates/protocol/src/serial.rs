//! Portable object model.
//!
//! [`Serial`] is the value graph passed by value through the RMI object
//! stream. Records and throwables are shared through [`Arc`], and the stream
//! keeps that sharing intact: a graph that holds the same `Arc` twice decodes
//! to a graph that holds one `Arc` twice.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use downcast_rs::{Downcast, DowncastSync, impl_downcast};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::RMI_REMOTE;
use crate::error::CastError;

/// An object that is referenced, not copied, across the bridge.
///
/// Server-side implementors are registered in the view's object registry when
/// they leave the server. Client-side stubs report the reference they hold.
pub trait RemoteObject: DowncastSync {
	/// Reference held by a client stub; `None` for live server objects.
	fn remote_ref(&self) -> Option<&RemoteRef> {
		None
	}
}

impl_downcast!(sync RemoteObject);

impl dyn RemoteObject {
	/// Type id of the concrete implementor.
	pub fn concrete_type_id(&self) -> TypeId {
		self.as_any().type_id()
	}
}

/// Reference to a registered server object as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRef {
	pub instance_id: String,
	/// Concrete server class; used as the invocation class name.
	pub class_name: String,
	/// Remote interfaces the object implements.
	pub interfaces: Vec<String>,
}

/// Token standing in for a remote object inside an object stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Replacement {
	/// Server to client.
	Remote(RemoteRef),
	/// Client to server: just the instance id.
	Stub(String),
}

/// Named bag of fields passed by value.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
	pub class: String,
	pub fields: Vec<(String, Serial)>,
}

impl Record {
	pub fn new(class: impl Into<String>) -> Self {
		Self {
			class: class.into(),
			fields: Vec::new(),
		}
	}

	pub fn with(mut self, name: impl Into<String>, value: Serial) -> Self {
		self.fields.push((name.into(), value));
		self
	}

	pub fn field(&self, name: &str) -> Option<&Serial> {
		self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
	}

	/// Clones out a field, failing if absent.
	pub fn require(&self, name: &str) -> Result<Serial, CastError> {
		self.field(name).cloned().ok_or_else(|| CastError::MissingField {
			field: name.to_string(),
			class: self.class.clone(),
		})
	}
}

/// Serializable error with a cause chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Throwable {
	pub class: String,
	pub message: Option<String>,
	pub cause: Option<Arc<Throwable>>,
}

impl Throwable {
	pub fn new(class: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			class: class.into(),
			message: Some(message.into()),
			cause: None,
		}
	}

	/// Throwable without a message.
	pub fn bare(class: impl Into<String>) -> Self {
		Self {
			class: class.into(),
			message: None,
			cause: None,
		}
	}

	pub fn with_cause(mut self, cause: Throwable) -> Self {
		self.cause = Some(Arc::new(cause));
		self
	}

	/// Captures an error and its `source()` chain.
	pub fn from_error<E: std::error::Error + ?Sized>(error: &E) -> Self {
		let class = short_type_name(std::any::type_name::<E>());
		let mut throwable = Self::new(class, error.to_string());
		let mut causes = Vec::new();
		let mut source = error.source();
		while let Some(inner) = source {
			causes.push(Self::new("Error", inner.to_string()));
			source = inner.source();
		}
		let chain = causes.into_iter().rev().fold(None, |cause: Option<Throwable>, mut t| {
			t.cause = cause.map(Arc::new);
			Some(t)
		});
		throwable.cause = chain.map(Arc::new);
		throwable
	}

	/// Captures a panic payload.
	pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
		let message = payload
			.downcast_ref::<&str>()
			.map(|s| s.to_string())
			.or_else(|| payload.downcast_ref::<String>().cloned());
		Self {
			class: "Panic".to_string(),
			message,
			cause: None,
		}
	}

	/// Innermost cause, or `self`.
	pub fn root_cause(&self) -> &Throwable {
		let mut current = self;
		while let Some(cause) = &current.cause {
			current = cause;
		}
		current
	}
}

impl<E: std::error::Error> From<E> for Throwable {
	fn from(error: E) -> Self {
		Self::from_error(&error)
	}
}

impl fmt::Display for Throwable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.message {
			Some(message) => write!(f, "{}: {message}", self.class),
			None => f.write_str(&self.class),
		}
	}
}

fn short_type_name(full: &str) -> String {
	let base = full.split('<').next().unwrap_or(full);
	base.rsplit("::").next().unwrap_or(base).to_string()
}

/// A value in the portable object model.
#[derive(Clone)]
pub enum Serial {
	Null,
	Bool(bool),
	Byte(i8),
	Short(i16),
	Char(char),
	Int(i32),
	Long(i64),
	Float(f32),
	Double(f64),
	String(String),
	Array(Vec<Serial>),
	Json(Value),
	Enum { class: String, constant: String },
	Record(Arc<Record>),
	Throwable(Arc<Throwable>),
	Remote(Arc<dyn RemoteObject>),
	/// Application component; refused by the object stream.
	Component(String),
	/// Value of a type that declares itself not serializable.
	Unserializable(String),
}

impl Serial {
	pub fn record(record: Record) -> Self {
		Self::Record(Arc::new(record))
	}

	pub fn throwable(throwable: Throwable) -> Self {
		Self::Throwable(Arc::new(throwable))
	}

	pub fn remote(object: Arc<dyn RemoteObject>) -> Self {
		Self::Remote(object)
	}

	/// Identity comparison for shared nodes, value comparison otherwise.
	pub fn same(&self, other: &Serial) -> bool {
		match (self, other) {
			(Self::Record(a), Self::Record(b)) => Arc::ptr_eq(a, b),
			(Self::Throwable(a), Self::Throwable(b)) => Arc::ptr_eq(a, b),
			(Self::Remote(a), Self::Remote(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
			_ => self == other,
		}
	}

	/// Name used in cast failure messages.
	pub fn type_name(&self) -> String {
		match self {
			Self::Null => "null".into(),
			Self::Bool(_) => "Boolean".into(),
			Self::Byte(_) => "Byte".into(),
			Self::Short(_) => "Short".into(),
			Self::Char(_) => "Character".into(),
			Self::Int(_) => "Integer".into(),
			Self::Long(_) => "Long".into(),
			Self::Float(_) => "Float".into(),
			Self::Double(_) => "Double".into(),
			Self::String(_) => "String".into(),
			Self::Array(_) => "Array".into(),
			Self::Json(_) => "JsonValue".into(),
			Self::Enum { class, .. } => class.clone(),
			Self::Record(record) => record.class.clone(),
			Self::Throwable(t) => t.class.clone(),
			Self::Remote(_) => RMI_REMOTE.into(),
			Self::Component(name) => name.clone(),
			Self::Unserializable(name) => name.clone(),
		}
	}

	/// JSON form of values the JSON model represents without type info.
	pub fn to_json(&self) -> Option<Value> {
		match self {
			Self::Null => Some(Value::Null),
			Self::Bool(b) => Some(Value::Bool(*b)),
			Self::Int(i) => Some(Value::from(*i)),
			Self::Long(l) => Some(Value::from(*l)),
			Self::Double(d) => serde_json::Number::from_f64(*d).map(Value::Number),
			Self::String(s) => Some(Value::String(s.clone())),
			Self::Json(v) => Some(v.clone()),
			_ => None,
		}
	}

	/// JSON form a result may take without the envelope.
	///
	/// Longs are left out: browser numbers are doubles and would round them.
	pub fn to_plain_json(&self) -> Option<Value> {
		match self {
			Self::Long(_) => None,
			other => other.to_json(),
		}
	}

	/// Lifts a JSON value; scalars become their typed forms.
	pub fn from_json(value: Value) -> Self {
		match value {
			Value::Null => Self::Null,
			Value::Bool(b) => Self::Bool(b),
			Value::Number(n) => match n.as_i64() {
				Some(l) => Self::Long(l),
				None => n.as_f64().map(Self::Double).unwrap_or(Self::Json(Value::Number(n))),
			},
			Value::String(s) => Self::String(s),
			other => Self::Json(other),
		}
	}
}

impl PartialEq for Serial {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Null, Self::Null) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Byte(a), Self::Byte(b)) => a == b,
			(Self::Short(a), Self::Short(b)) => a == b,
			(Self::Char(a), Self::Char(b)) => a == b,
			(Self::Int(a), Self::Int(b)) => a == b,
			(Self::Long(a), Self::Long(b)) => a == b,
			(Self::Float(a), Self::Float(b)) => a == b,
			(Self::Double(a), Self::Double(b)) => a == b,
			(Self::String(a), Self::String(b)) => a == b,
			(Self::Array(a), Self::Array(b)) => a == b,
			(Self::Json(a), Self::Json(b)) => a == b,
			(
				Self::Enum { class: ca, constant: a },
				Self::Enum { class: cb, constant: b },
			) => ca == cb && a == b,
			(Self::Record(a), Self::Record(b)) => a == b,
			(Self::Throwable(a), Self::Throwable(b)) => a == b,
			(Self::Remote(a), Self::Remote(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
			(Self::Component(a), Self::Component(b)) => a == b,
			(Self::Unserializable(a), Self::Unserializable(b)) => a == b,
			_ => false,
		}
	}
}

impl fmt::Debug for Serial {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => f.write_str("Null"),
			Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
			Self::Byte(v) => f.debug_tuple("Byte").field(v).finish(),
			Self::Short(v) => f.debug_tuple("Short").field(v).finish(),
			Self::Char(v) => f.debug_tuple("Char").field(v).finish(),
			Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
			Self::Long(v) => f.debug_tuple("Long").field(v).finish(),
			Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
			Self::Double(v) => f.debug_tuple("Double").field(v).finish(),
			Self::String(v) => f.debug_tuple("String").field(v).finish(),
			Self::Array(v) => f.debug_tuple("Array").field(v).finish(),
			Self::Json(v) => f.debug_tuple("Json").field(v).finish(),
			Self::Enum { class, constant } => f.debug_struct("Enum").field("class", class).field("constant", constant).finish(),
			Self::Record(r) => f.debug_tuple("Record").field(r).finish(),
			Self::Throwable(t) => f.debug_tuple("Throwable").field(t).finish(),
			Self::Remote(r) => f.debug_tuple("Remote").field(&r.remote_ref()).finish(),
			Self::Component(n) => f.debug_tuple("Component").field(n).finish(),
			Self::Unserializable(n) => f.debug_tuple("Unserializable").field(n).finish(),
		}
	}
}

/// Rendering used in failure messages.
impl fmt::Display for Serial {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Null => f.write_str("null"),
			Self::Bool(v) => write!(f, "{v}"),
			Self::Byte(v) => write!(f, "{v}"),
			Self::Short(v) => write!(f, "{v}"),
			Self::Char(v) => write!(f, "{v}"),
			Self::Int(v) => write!(f, "{v}"),
			Self::Long(v) => write!(f, "{v}"),
			Self::Float(v) => write!(f, "{v}"),
			Self::Double(v) => write!(f, "{v}"),
			Self::String(v) => f.write_str(v),
			Self::Array(items) => {
				f.write_str("[")?;
				for (i, item) in items.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{item}")?;
				}
				f.write_str("]")
			}
			Self::Json(v) => write!(f, "{v}"),
			Self::Enum { constant, .. } => f.write_str(constant),
			Self::Record(record) => {
				write!(f, "{}{{", record.class)?;
				for (i, (name, value)) in record.fields.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{name}={value}")?;
				}
				f.write_str("}")
			}
			Self::Throwable(t) => write!(f, "{t}"),
			Self::Remote(r) => match r.remote_ref() {
				Some(reference) => write!(f, "{}@{}", reference.interfaces.join("&"), reference.instance_id),
				None => f.write_str(RMI_REMOTE),
			},
			Self::Component(name) | Self::Unserializable(name) => f.write_str(name),
		}
	}
}

/// Untyped handle to a remote object.
#[derive(Clone)]
pub struct RemoteHandle(Arc<dyn RemoteObject>);

impl RemoteHandle {
	pub fn new(object: Arc<dyn RemoteObject>) -> Self {
		Self(object)
	}

	pub fn object(&self) -> &Arc<dyn RemoteObject> {
		&self.0
	}

	pub fn into_object(self) -> Arc<dyn RemoteObject> {
		self.0
	}

	pub fn downcast<T: RemoteObject>(&self) -> Option<Arc<T>> {
		self.0.clone().downcast_arc::<T>().ok()
	}

	/// Whether both handles point at the same object.
	pub fn ptr_eq(&self, other: &RemoteHandle) -> bool {
		std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
	}
}

impl fmt::Debug for RemoteHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("RemoteHandle").field(&self.0.remote_ref()).finish()
	}
}
