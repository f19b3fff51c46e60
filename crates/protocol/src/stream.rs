//! Binary object stream for [`Serial`] graphs.
//!
//! A stream is a two-byte magic, a version byte, and a MessagePack body. Shared
//! records and throwables are written once; later occurrences are written as
//! back-references to the handle assigned when the first copy completed.
//! Remote objects never enter the stream themselves: the encoder asks its
//! replacement hook for a [`Replacement`] token and the decoder trades each
//! token back through its resolver hook.

use std::collections::HashMap;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{MarshalError, UnmarshalError};
use crate::serial::{Record, RemoteObject, Replacement, Serial, Throwable};

const MAGIC: [u8; 2] = [0x54, 0x42];
const VERSION: u8 = 1;

#[derive(Debug, Serialize, Deserialize)]
enum Node {
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
	Array(Vec<Node>),
	Json(String),
	Enum {
		class: String,
		constant: String,
	},
	Record {
		handle: u32,
		class: String,
		fields: Vec<(String, Node)>,
	},
	Throwable {
		handle: u32,
		class: String,
		message: Option<String>,
		cause: Option<Box<Node>>,
	},
	Ref(u32),
	Remote(Replacement),
}

/// Replacement hook consulted for every remote object met while encoding.
pub type ReplaceFn<'a> = dyn FnMut(&Arc<dyn RemoteObject>) -> Result<Replacement, MarshalError> + 'a;

/// Resolver hook consulted for every replacement token met while decoding.
pub type ResolveFn<'a> = dyn FnMut(Replacement) -> Result<Serial, UnmarshalError> + 'a;

/// Encodes `value` and base64-wraps the stream.
pub fn encode(value: &Serial, replace: &mut ReplaceFn<'_>) -> Result<String, MarshalError> {
	let bytes = ObjectOutput::new(replace).write(value)?;
	Ok(STANDARD.encode(bytes))
}

/// Decodes a base64-wrapped stream.
pub fn decode(data: &str, resolve: &mut ResolveFn<'_>) -> Result<Serial, UnmarshalError> {
	let bytes = STANDARD.decode(data)?;
	ObjectInput::new(resolve).read(&bytes)
}

/// Replacement hook for streams that must not carry remote objects.
pub fn refuse_remotes(object: &Arc<dyn RemoteObject>) -> Result<Replacement, MarshalError> {
	let detail = match object.remote_ref() {
		Some(reference) => reference.instance_id.clone(),
		None => "unregistered object".to_string(),
	};
	Err(MarshalError::Unreferenceable(detail))
}

/// Resolver hook for streams that must not carry remote objects.
pub fn refuse_replacements(token: Replacement) -> Result<Serial, UnmarshalError> {
	let id = match token {
		Replacement::Remote(reference) => reference.instance_id,
		Replacement::Stub(id) => id,
	};
	Err(UnmarshalError::Unresolvable(id))
}

/// Object-stream writer.
pub struct ObjectOutput<'a, 'r> {
	handles: HashMap<*const (), u32>,
	replace: &'r mut ReplaceFn<'a>,
}

impl<'a, 'r> ObjectOutput<'a, 'r> {
	pub fn new(replace: &'r mut ReplaceFn<'a>) -> Self {
		Self {
			handles: HashMap::new(),
			replace,
		}
	}

	pub fn write(mut self, value: &Serial) -> Result<Vec<u8>, MarshalError> {
		let node = self.node(value)?;
		let mut bytes = Vec::with_capacity(64);
		bytes.extend_from_slice(&MAGIC);
		bytes.push(VERSION);
		bytes.extend(rmp_serde::to_vec(&node)?);
		Ok(bytes)
	}

	fn node(&mut self, value: &Serial) -> Result<Node, MarshalError> {
		Ok(match value {
			Serial::Null => Node::Null,
			Serial::Bool(v) => Node::Bool(*v),
			Serial::Byte(v) => Node::Byte(*v),
			Serial::Short(v) => Node::Short(*v),
			Serial::Char(v) => Node::Char(*v),
			Serial::Int(v) => Node::Int(*v),
			Serial::Long(v) => Node::Long(*v),
			Serial::Float(v) => Node::Float(*v),
			Serial::Double(v) => Node::Double(*v),
			Serial::String(v) => Node::String(v.clone()),
			Serial::Array(items) => Node::Array(items.iter().map(|item| self.node(item)).collect::<Result<_, _>>()?),
			Serial::Json(v) => Node::Json(v.to_string()),
			Serial::Enum { class, constant } => Node::Enum {
				class: class.clone(),
				constant: constant.clone(),
			},
			Serial::Record(record) => {
				let key = Arc::as_ptr(record) as *const ();
				if let Some(handle) = self.handles.get(&key) {
					return Ok(Node::Ref(*handle));
				}
				let fields = record
					.fields
					.iter()
					.map(|(name, field)| Ok((name.clone(), self.node(field)?)))
					.collect::<Result<Vec<_>, MarshalError>>()?;
				Node::Record {
					handle: self.bind(key),
					class: record.class.clone(),
					fields,
				}
			}
			Serial::Throwable(throwable) => self.throwable(throwable)?,
			Serial::Remote(object) => Node::Remote((self.replace)(object)?),
			Serial::Component(name) => return Err(MarshalError::Component(name.clone())),
			Serial::Unserializable(name) => return Err(MarshalError::NotSerializable(name.clone())),
		})
	}

	fn throwable(&mut self, throwable: &Arc<Throwable>) -> Result<Node, MarshalError> {
		let key = Arc::as_ptr(throwable) as *const ();
		if let Some(handle) = self.handles.get(&key) {
			return Ok(Node::Ref(*handle));
		}
		let cause = match &throwable.cause {
			Some(cause) => Some(Box::new(self.throwable(cause)?)),
			None => None,
		};
		Ok(Node::Throwable {
			handle: self.bind(key),
			class: throwable.class.clone(),
			message: throwable.message.clone(),
			cause,
		})
	}

	fn bind(&mut self, key: *const ()) -> u32 {
		let handle = self.handles.len() as u32;
		self.handles.insert(key, handle);
		handle
	}
}

/// Object-stream reader.
pub struct ObjectInput<'a, 'r> {
	table: Vec<Serial>,
	resolve: &'r mut ResolveFn<'a>,
}

impl<'a, 'r> ObjectInput<'a, 'r> {
	pub fn new(resolve: &'r mut ResolveFn<'a>) -> Self {
		Self { table: Vec::new(), resolve }
	}

	pub fn read(mut self, bytes: &[u8]) -> Result<Serial, UnmarshalError> {
		if bytes.is_empty() {
			return Err(UnmarshalError::Empty);
		}
		let body = bytes.strip_prefix(&MAGIC[..]).ok_or(UnmarshalError::BadHeader)?;
		let (&version, body) = body.split_first().ok_or(UnmarshalError::BadHeader)?;
		if version != VERSION {
			return Err(UnmarshalError::Version(version));
		}
		let node: Node = rmp_serde::from_slice(body)?;
		self.value(node)
	}

	fn value(&mut self, node: Node) -> Result<Serial, UnmarshalError> {
		Ok(match node {
			Node::Null => Serial::Null,
			Node::Bool(v) => Serial::Bool(v),
			Node::Byte(v) => Serial::Byte(v),
			Node::Short(v) => Serial::Short(v),
			Node::Char(v) => Serial::Char(v),
			Node::Int(v) => Serial::Int(v),
			Node::Long(v) => Serial::Long(v),
			Node::Float(v) => Serial::Float(v),
			Node::Double(v) => Serial::Double(v),
			Node::String(v) => Serial::String(v),
			Node::Array(items) => Serial::Array(items.into_iter().map(|item| self.value(item)).collect::<Result<_, _>>()?),
			Node::Json(text) => Serial::Json(serde_json::from_str(&text).map_err(|e| UnmarshalError::Unexpected {
				expected: "JSON text",
				found: e.to_string(),
			})?),
			Node::Enum { class, constant } => Serial::Enum { class, constant },
			Node::Record { handle, class, fields } => {
				let fields = fields
					.into_iter()
					.map(|(name, field)| Ok((name, self.value(field)?)))
					.collect::<Result<Vec<_>, UnmarshalError>>()?;
				self.bind(handle, Serial::Record(Arc::new(Record { class, fields })))?
			}
			Node::Throwable { handle, class, message, cause } => {
				let cause = match cause {
					Some(node) => match self.value(*node)? {
						Serial::Throwable(cause) => Some(cause),
						other => {
							return Err(UnmarshalError::Unexpected {
								expected: "throwable cause",
								found: other.type_name(),
							});
						}
					},
					None => None,
				};
				self.bind(handle, Serial::Throwable(Arc::new(Throwable { class, message, cause })))?
			}
			Node::Ref(handle) => self
				.table
				.get(handle as usize)
				.cloned()
				.ok_or(UnmarshalError::DanglingHandle(handle))?,
			Node::Remote(token) => (self.resolve)(token)?,
		})
	}

	fn bind(&mut self, handle: u32, value: Serial) -> Result<Serial, UnmarshalError> {
		let expected = self.table.len() as u32;
		if handle != expected {
			return Err(UnmarshalError::HandleOrder { found: handle, expected });
		}
		self.table.push(value.clone());
		Ok(value)
	}
}

#[cfg(test)]
mod tests;
