//! Interface proxies.
//!
//! A [`Proxy`] is created for one declared [`Interface`] and picks its
//! dispatch strategy once: simple calls go straight to the published callable
//! of the same name, reference-capable calls are wrapped in an invocation and
//! sent through `$call`. Generated proxy types forward every method to
//! [`Proxy::invoke`].

use std::sync::Arc;

use serde_json::Value;
use tbrpc_protocol::constants::RMI_CALL;
use tbrpc_protocol::stream;
use tbrpc_protocol::{
	CastError, Invocation, Marshal, MarshalError, RemoteObject, RmiResponse, Replacement, Serial, Throwable, TypeDesc, UnmarshalError,
};
use tracing::trace;

use crate::client::{RpcClient, render_json};
use crate::error::{Cause, IllegalSignature, Result, RpcError};
use crate::interface::Interface;
use crate::policy::{self, CallMode};
use crate::stub::RemoteStub;

/// One argument of a proxied call, with its declared type.
pub struct Argument {
	desc: TypeDesc,
	value: Box<dyn ErasedArgument>,
}

trait ErasedArgument: Send {
	fn into_json(self: Box<Self>) -> std::result::Result<Value, CastError>;

	fn into_serial(self: Box<Self>) -> std::result::Result<Serial, CastError>;
}

impl<T: Marshal + Send> ErasedArgument for T {
	fn into_json(self: Box<Self>) -> std::result::Result<Value, CastError> {
		Marshal::into_json(*self)
	}

	fn into_serial(self: Box<Self>) -> std::result::Result<Serial, CastError> {
		Marshal::into_serial(*self)
	}
}

impl Argument {
	pub fn new<T: Marshal + Send + 'static>(value: T) -> Self {
		Self {
			desc: T::describe(),
			value: Box::new(value),
		}
	}

	pub fn desc(&self) -> &TypeDesc {
		&self.desc
	}
}

#[derive(Clone)]
enum Dispatcher {
	Simple,
	Rmi { target: Option<RemoteStub> },
}

/// Dynamic proxy for one interface.
#[derive(Clone)]
pub struct Proxy {
	client: RpcClient,
	interface: Arc<Interface>,
	dispatcher: Dispatcher,
}

impl Proxy {
	/// Validates every method of `interface` and binds the proxy.
	///
	/// Calls target `target` when given, otherwise the view.
	pub fn new(client: RpcClient, interface: Interface, target: Option<RemoteStub>) -> std::result::Result<Self, IllegalSignature> {
		let dispatcher = if interface.kind.is_reference_capable() || target.is_some() {
			Dispatcher::Rmi { target }
		} else {
			Dispatcher::Simple
		};
		let mode = match dispatcher {
			Dispatcher::Simple => CallMode::Simple,
			Dispatcher::Rmi { .. } => CallMode::Rmi,
		};
		policy::check_interface(&interface, mode)?;
		Ok(Self {
			client,
			interface: Arc::new(interface),
			dispatcher,
		})
	}

	pub fn interface(&self) -> &Interface {
		&self.interface
	}

	pub fn client(&self) -> &RpcClient {
		&self.client
	}

	pub fn mode(&self) -> CallMode {
		match self.dispatcher {
			Dispatcher::Simple => CallMode::Simple,
			Dispatcher::Rmi { .. } => CallMode::Rmi,
		}
	}

	/// The remote object this proxy calls, for stubs.
	pub fn target(&self) -> Option<&RemoteStub> {
		match &self.dispatcher {
			Dispatcher::Rmi { target } => target.as_ref(),
			Dispatcher::Simple => None,
		}
	}

	/// Calls `method` and converts the result to `R`.
	pub async fn invoke<R: Marshal>(&self, method: &str, arguments: Vec<Argument>) -> Result<R> {
		trace!(interface = self.interface.name, method, mode = ?self.mode(), "proxy dispatch");
		match &self.dispatcher {
			Dispatcher::Simple => self.invoke_simple(method, arguments).await,
			Dispatcher::Rmi { target } => self.invoke_rmi(target.as_ref(), method, arguments).await,
		}
	}

	async fn invoke_simple<R: Marshal>(&self, method: &str, arguments: Vec<Argument>) -> Result<R> {
		let mut values = Vec::with_capacity(arguments.len());
		let mut failure = None;
		for argument in arguments {
			match argument.value.into_json() {
				Ok(value) => values.push(value),
				Err(e) => {
					failure.get_or_insert(e);
					values.push(Value::Null);
				}
			}
		}
		let site = CallSite::new(method, values.iter().map(render_json).collect());
		if let Some(e) = failure {
			return Err(site.fail(e));
		}

		let result = self.client.call(method, values).await?;
		R::from_json(result).map_err(|e| site.fail(e))
	}

	async fn invoke_rmi<R: Marshal>(&self, target: Option<&RemoteStub>, method: &str, arguments: Vec<Argument>) -> Result<R> {
		let signature: Vec<String> = arguments.iter().map(|a| a.desc.signature_name()).collect();
		let mut values = Vec::with_capacity(arguments.len());
		let mut failure = None;
		for argument in arguments {
			match argument.value.into_serial() {
				Ok(value) => values.push(value),
				Err(e) => {
					failure.get_or_insert(e);
					values.push(Serial::Null);
				}
			}
		}
		let site = CallSite::new(method, values.iter().map(Serial::to_string).collect());
		if let Some(e) = failure {
			return Err(site.fail(e));
		}

		let mut invocation = match target {
			Some(stub) => {
				let reference = stub.reference();
				Invocation::on_instance(&reference.instance_id, &reference.class_name, method, signature)
			}
			None => Invocation::on_view(method, signature),
		};
		if !values.is_empty() {
			let data = stream::encode(&Serial::Array(values), &mut stub_replacement).map_err(|e| site.fail(e))?;
			invocation = invocation.with_arguments(data);
		}

		let response = self
			.client
			.call(RMI_CALL, vec![invocation.to_json()])
			.await
			.map_err(|e| site.relocate(e))?;

		match RmiResponse::from_json(&response) {
			None => R::from_json(response).map_err(|e| site.fail(e)),
			Some(Err(violation)) => Err(site.fail(violation)),
			Some(Ok(RmiResponse::Success { data })) => {
				let client = self.client.clone();
				let mut resolve = |token: Replacement| -> std::result::Result<Serial, UnmarshalError> {
					match token {
						Replacement::Remote(reference) => Ok(Serial::remote(Arc::new(RemoteStub::new(reference, client.clone())))),
						Replacement::Stub(id) => Err(UnmarshalError::Unresolvable(id)),
					}
				};
				let value = stream::decode(&data, &mut resolve).map_err(|e| site.fail(e))?;
				R::from_serial(value).map_err(|e| site.fail(e))
			}
			Some(Ok(RmiResponse::Failure { error, data })) => {
				let exception = match data {
					Some(data) => Some(decode_exception(&data).map_err(|e| site.fail(e))?),
					None => None,
				};
				Err(site.fail(Cause::Remote { kind: error, exception }))
			}
		}
	}
}

/// Replaces client-side stubs by their instance id.
fn stub_replacement(object: &Arc<dyn RemoteObject>) -> std::result::Result<Replacement, MarshalError> {
	object
		.remote_ref()
		.map(|reference| Replacement::Stub(reference.instance_id.clone()))
		.ok_or_else(|| MarshalError::Unreferenceable("only stubs can be passed by reference".into()))
}

fn decode_exception(data: &str) -> std::result::Result<Throwable, Cause> {
	let value = stream::decode(data, &mut stream::refuse_replacements)?;
	Ok(Throwable::from_serial(value)?)
}

/// Method and rendered arguments of a failing call.
struct CallSite<'a> {
	method: &'a str,
	arguments: Vec<String>,
}

impl<'a> CallSite<'a> {
	fn new(method: &'a str, arguments: Vec<String>) -> Self {
		Self { method, arguments }
	}

	fn fail(&self, cause: impl Into<Cause>) -> RpcError {
		RpcError::with_cause(self.method, self.arguments.clone(), cause)
	}

	/// Reports a failure of the `$call` transport against this call.
	fn relocate(&self, error: RpcError) -> RpcError {
		error.relocate(self.method, self.arguments.clone())
	}
}
