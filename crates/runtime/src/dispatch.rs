//! Server half of the reference-capable protocol.
//!
//! [`RemoteDispatcher::call`] is the body of a view's `$call` callable. Every
//! invocation ends in either a value (JSON fast path or success envelope) or a
//! classified error envelope; nothing unwinds out of it.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, OnceLock};

use serde_json::Value;
use tbrpc_protocol::stream::{self, refuse_remotes};
use tbrpc_protocol::{
	Invocation, MarshalError, RemoteObject, RemoteRef, Replacement, RmiErrorKind, RmiResponse, Serial, Throwable, UnmarshalError,
};
use tracing::{debug, warn};

use crate::class::{ClassTable, InvokeError, MethodKey, RemoteClass};
use crate::error::{Error, Result};
use crate::registry::ObjectRegistry;

/// Dispatches invocations against a view object and the objects it hands out.
///
/// The registry is created on first use and lives exactly as long as the
/// dispatcher, which lives as long as its view.
pub struct RemoteDispatcher {
	this: Arc<dyn RemoteObject>,
	view_class: Arc<RemoteClass>,
	classes: ClassTable,
	registry: OnceLock<ObjectRegistry>,
}

struct Fault {
	kind: RmiErrorKind,
	exception: Option<Throwable>,
}

impl Fault {
	fn bare(kind: RmiErrorKind) -> Self {
		debug_assert!(!kind.has_exception(), "{kind} requires an exception");
		Self { kind, exception: None }
	}

	fn with(kind: RmiErrorKind, exception: Throwable) -> Self {
		debug_assert!(kind.has_exception(), "{kind} does not carry an exception");
		Self {
			kind,
			exception: Some(exception),
		}
	}

	fn into_response(self) -> Value {
		let data = self
			.exception
			.and_then(|t| encode_exception(t, |value| stream::encode(value, &mut refuse_remotes)));
		RmiResponse::Failure { error: self.kind, data }.to_json()
	}
}

/// Encodes an exception, dropping down to its bare class when the full form fails.
fn encode_exception(
	exception: Throwable,
	mut encode: impl FnMut(&Serial) -> std::result::Result<String, MarshalError>,
) -> Option<String> {
	let fallback = Throwable::bare(exception.class.clone());
	let err = match encode(&Serial::throwable(exception)) {
		Ok(data) => return Some(data),
		Err(e) => e,
	};
	warn!(error = %err, class = %fallback.class, "could not encode remote exception, sending class only");
	match encode(&Serial::throwable(fallback)) {
		Ok(data) => Some(data),
		Err(e) => {
			warn!(error = %e, "could not encode bare remote exception");
			None
		}
	}
}

impl RemoteDispatcher {
	/// Binds a dispatcher to a view object whose class is in `classes`.
	pub fn new<T: RemoteObject>(this: Arc<T>, classes: ClassTable) -> Result<Self> {
		let this: Arc<dyn RemoteObject> = this;
		let view_class = classes
			.class_of(this.as_ref())
			.cloned()
			.ok_or_else(|| Error::UnregisteredClass(std::any::type_name::<T>().to_string()))?;
		Ok(Self {
			this,
			view_class,
			classes,
			registry: OnceLock::new(),
		})
	}

	pub fn registry(&self) -> &ObjectRegistry {
		self.registry.get_or_init(ObjectRegistry::new)
	}

	pub fn classes(&self) -> &ClassTable {
		&self.classes
	}

	/// Handles one invocation descriptor.
	pub fn call(&self, invocation: &Value) -> Value {
		match catch_unwind(AssertUnwindSafe(|| self.dispatch(invocation))) {
			Ok(Ok(value)) => value,
			Ok(Err(fault)) => {
				warn!(kind = %fault.kind, "remote call failed");
				fault.into_response()
			}
			Err(panic) => {
				warn!("remote call panicked");
				Fault::with(RmiErrorKind::Unknown, Throwable::from_panic(panic.as_ref())).into_response()
			}
		}
	}

	fn dispatch(&self, raw: &Value) -> std::result::Result<Value, Fault> {
		let invocation = Invocation::parse(raw).map_err(|e| Fault::with(RmiErrorKind::ProtocolError, Throwable::from(e)))?;
		debug!(method = %invocation.method_name, class = ?invocation.class_name, "dispatching remote call");

		let class = match &invocation.class_name {
			None => &self.view_class,
			Some(name) => self.classes.by_name(name).ok_or(Fault::bare(RmiErrorKind::ClassNotFound))?,
		};

		if !invocation.method_signature.iter().all(|name| self.classes.resolves_type(name)) {
			return Err(Fault::bare(RmiErrorKind::NoSuchMethod));
		}
		let key = MethodKey::new(invocation.method_name.clone(), invocation.method_signature.clone());
		if !class.has_method(&key) {
			return Err(Fault::bare(RmiErrorKind::NoSuchMethod));
		}

		let instance = match &invocation.instance_id {
			None => self.this.clone(),
			Some(id) => self.registry().lookup(id).map_err(|_| Fault::bare(RmiErrorKind::ObjectNotExist))?,
		};
		if !class.is_instance(instance.as_ref()) {
			return Err(Fault::with(
				RmiErrorKind::Unknown,
				Throwable::new("ClassCastException", format!("instance is not a {}", class.name())),
			));
		}

		let args = match &invocation.method_arguments {
			Some(data) => self.decode_arguments(data)?,
			None => Vec::new(),
		};

		let outcome = catch_unwind(AssertUnwindSafe(|| class.invoke(&key, instance.as_ref(), args)));
		let result = match outcome {
			Ok(Some(Ok(value))) => value,
			Ok(Some(Err(e))) => return Err(invoke_fault(e)),
			Ok(None) => return Err(Fault::bare(RmiErrorKind::NoSuchMethod)),
			Err(panic) => return Err(Fault::with(RmiErrorKind::Invoke, Throwable::from_panic(panic.as_ref()))),
		};

		self.encode_result(&result)
	}

	fn decode_arguments(&self, data: &str) -> std::result::Result<Vec<Serial>, Fault> {
		let registry = self.registry();
		let mut resolve = |token: Replacement| -> std::result::Result<Serial, UnmarshalError> {
			let id = match token {
				Replacement::Stub(id) => id,
				Replacement::Remote(reference) => reference.instance_id,
			};
			registry
				.lookup(&id)
				.map(Serial::Remote)
				.map_err(|_| UnmarshalError::UnknownInstance(id))
		};
		match stream::decode(data, &mut resolve) {
			Ok(Serial::Array(args)) => Ok(args),
			Ok(other) => Err(Fault::with(
				RmiErrorKind::Unmarshal,
				Throwable::from(UnmarshalError::Unexpected {
					expected: "argument array",
					found: other.type_name(),
				}),
			)),
			Err(UnmarshalError::UnknownInstance(_)) => Err(Fault::bare(RmiErrorKind::ObjectNotExist)),
			Err(e) => Err(Fault::with(RmiErrorKind::Unmarshal, Throwable::from(e))),
		}
	}

	fn encode_result(&self, result: &Serial) -> std::result::Result<Value, Fault> {
		if let Some(json) = result.to_plain_json() {
			return Ok(json);
		}
		let registry = self.registry();
		let mut replace = |object: &Arc<dyn RemoteObject>| -> std::result::Result<Replacement, MarshalError> {
			let class = self
				.classes
				.class_of(object.as_ref())
				.ok_or_else(|| MarshalError::Unreferenceable("object has no remote class".into()))?;
			let id = registry.register(object);
			Ok(Replacement::Remote(RemoteRef {
				instance_id: id.to_string(),
				class_name: class.name().to_string(),
				interfaces: class.interfaces().to_vec(),
			}))
		};
		match stream::encode(result, &mut replace) {
			Ok(data) => Ok(RmiResponse::Success { data }.to_json()),
			Err(e) => Err(Fault::with(RmiErrorKind::Marshal, Throwable::from(e))),
		}
	}
}

fn invoke_fault(error: InvokeError) -> Fault {
	match error {
		InvokeError::Thrown(t) => Fault::with(RmiErrorKind::Invoke, t),
		InvokeError::Arguments(e) => Fault::with(RmiErrorKind::Unmarshal, Throwable::from(e)),
		InvokeError::Arity { expected, found } => Fault::with(
			RmiErrorKind::Unmarshal,
			Throwable::new("IllegalArgumentException", format!("expected {expected} arguments, got {found}")),
		),
		InvokeError::Receiver { class } => Fault::with(
			RmiErrorKind::Unknown,
			Throwable::new("ClassCastException", format!("instance is not a {class}")),
		),
		InvokeError::Result(e) => Fault::with(RmiErrorKind::Marshal, Throwable::from(e)),
	}
}
