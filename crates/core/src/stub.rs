//! Client-side stand-ins for server objects.
//!
//! A stub holds the server's reference token and the client that reaches it,
//! never the object itself. Equality and hashing go by instance id, so two
//! stubs for the same registered object compare equal.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tbrpc_protocol::constants::{RMI_REMOTE, STUB_MARKER};
use tbrpc_protocol::marshal::serial_mismatch;
use tbrpc_protocol::{CastError, Marshal, RemoteObject, RemoteRef, Serial, TypeDesc};

use crate::client::RpcClient;
use crate::error::IllegalSignature;
use crate::interface::Callables;
use crate::proxy::Proxy;

/// Untyped stub for a registered server object.
#[derive(Clone)]
pub struct RemoteStub {
	reference: RemoteRef,
	client: RpcClient,
}

impl RemoteStub {
	pub fn new(reference: RemoteRef, client: RpcClient) -> Self {
		Self { reference, client }
	}

	pub fn reference(&self) -> &RemoteRef {
		&self.reference
	}

	/// Registry token of the object; answered without a call.
	pub fn instance_id(&self) -> &str {
		&self.reference.instance_id
	}

	pub fn client(&self) -> &RpcClient {
		&self.client
	}

	pub fn implements(&self, interface: &str) -> bool {
		self.reference.interfaces.iter().any(|name| name == interface)
	}

	/// Display label: the implemented interfaces joined by `&`.
	pub fn label(&self) -> String {
		self.reference
			.interfaces
			.iter()
			.filter(|name| name.as_str() != STUB_MARKER)
			.map(|name| simple_name(name))
			.collect::<Vec<_>>()
			.join("&")
	}

	/// Re-types this stub as another interface the object implements.
	pub fn narrow<S: Callables>(&self) -> Result<S, IllegalSignature> {
		let interface = S::interface();
		if !self.implements(interface.name) {
			return Err(IllegalSignature::NotImplemented {
				interface: interface.name.to_string(),
				object: self.label(),
			});
		}
		Proxy::new(self.client.clone(), interface, Some(self.clone())).map(S::from_proxy)
	}
}

fn simple_name(name: &str) -> &str {
	name.rsplit(['.', ':', '$']).next().unwrap_or(name)
}

impl RemoteObject for RemoteStub {
	fn remote_ref(&self) -> Option<&RemoteRef> {
		Some(&self.reference)
	}
}

impl PartialEq for RemoteStub {
	fn eq(&self, other: &Self) -> bool {
		self.reference.instance_id == other.reference.instance_id
	}
}

impl Eq for RemoteStub {}

impl Hash for RemoteStub {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.reference.instance_id.hash(state);
	}
}

impl fmt::Display for RemoteStub {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.label())
	}
}

impl fmt::Debug for RemoteStub {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RemoteStub").field("reference", &self.reference).finish()
	}
}

impl Marshal for RemoteStub {
	fn describe() -> TypeDesc {
		TypeDesc::Remote(RMI_REMOTE)
	}

	fn into_serial(self) -> Result<Serial, CastError> {
		Ok(Serial::remote(Arc::new(self)))
	}

	fn from_serial(value: Serial) -> Result<Self, CastError> {
		match value {
			Serial::Remote(object) => match object.downcast_arc::<RemoteStub>() {
				Ok(stub) => Ok(Arc::unwrap_or_clone(stub)),
				Err(_) => Err(CastError::mismatch(RMI_REMOTE, "RemoteStub")),
			},
			other => Err(serial_mismatch(&other, &Self::describe())),
		}
	}
}

/// Instance id of the stub behind a generated stub type.
pub fn instance_id_of(proxy: &Proxy) -> &str {
	proxy.target().map(RemoteStub::instance_id).unwrap_or_default()
}

/// Display label of the stub behind a generated stub type.
pub fn label_of(proxy: &Proxy) -> String {
	proxy.target().map(RemoteStub::label).unwrap_or_default()
}

/// `narrow` for generated stub types.
pub fn narrow_of<S: Callables>(proxy: &Proxy) -> Result<S, IllegalSignature> {
	match proxy.target() {
		Some(stub) => stub.narrow(),
		None => Err(IllegalSignature::NotImplemented {
			interface: S::interface().name.to_string(),
			object: format!("unbound {} stub", proxy.interface().name),
		}),
	}
}

/// `into_serial` for generated stub types.
pub fn typed_into_serial(proxy: &Proxy) -> Result<Serial, CastError> {
	match proxy.target() {
		Some(stub) => stub.clone().into_serial(),
		None => Err(CastError::unsupported(format!("unbound {} stub", proxy.interface().name))),
	}
}

/// `from_serial` for generated stub types.
pub fn typed_from_serial<S: Callables>(value: Serial) -> Result<S, CastError> {
	let stub = RemoteStub::from_serial(value)?;
	stub.narrow::<S>().map_err(|e| match e {
		IllegalSignature::NotImplemented { interface, object } => CastError::mismatch(object, interface),
		other => CastError::unsupported(other),
	})
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use async_trait::async_trait;
	use serde_json::Value;

	use super::*;
	use crate::error::ExecutorError;
	use crate::executor::{ScriptExecutor, ScriptTimeout};

	struct Offline;

	#[async_trait]
	impl ScriptExecutor for Offline {
		async fn execute_async_script(&self, _script: &str, _args: Vec<Value>) -> Result<Value, ExecutorError> {
			Err(ExecutorError::Transport("offline".into()))
		}

		async fn set_script_timeout(&self, _timeout: ScriptTimeout) -> Result<(), ExecutorError> {
			Ok(())
		}
	}

	fn stub(id: &str, interfaces: &[&str]) -> RemoteStub {
		RemoteStub::new(
			RemoteRef {
				instance_id: id.into(),
				class_name: "Counter".into(),
				interfaces: interfaces.iter().map(|s| s.to_string()).collect(),
			},
			RpcClient::new(Arc::new(Offline)),
		)
	}

	#[test]
	fn test_label_joins_interfaces() {
		assert_eq!(stub("a", &["MyRemoteObject"]).to_string(), "MyRemoteObject");
		assert_eq!(stub("a", &["ICounter", "MyRemoteObject"]).to_string(), "ICounter&MyRemoteObject");
		assert_eq!(stub("a", &["rmi.ICounter", STUB_MARKER]).label(), "ICounter");
	}

	#[test]
	fn test_identity_by_instance_id() {
		let a = stub("a", &["ICounter"]);
		let again = stub("a", &["ICounter", "MyRemoteObject"]);
		assert_eq!(a, again);
		assert_ne!(a, stub("b", &["ICounter"]));

		let set: HashSet<_> = [a, again].into_iter().collect();
		assert_eq!(set.len(), 1);
	}

	#[test]
	fn test_serial_round_trip_keeps_stub() {
		let original = stub("a", &["ICounter"]);
		let serial = original.clone().into_serial().unwrap();
		assert_eq!(RemoteStub::from_serial(serial).unwrap(), original);
		assert!(RemoteStub::from_serial(Serial::Null).is_err());
	}
}
