//! The call choke point.
//!
//! [`RpcClient::call`] performs exactly one round trip through the browser:
//! apply the script timeout, run the call script, interpret the callback
//! payload. Both call modes go through it.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tbrpc_protocol::RemoteRef;
use tracing::debug;

use crate::config::RpcConfig;
use crate::error::{IllegalSignature, Result, RpcError};
use crate::executor::ScriptExecutor;
use crate::interface::Callables;
use crate::proxy::Proxy;
use crate::script::{self, ScriptCall};
use crate::stub::RemoteStub;

/// Handle for calling into the view loaded in a browser.
///
/// Cheap to clone; clones share the executor and configuration.
#[derive(Clone)]
pub struct RpcClient {
	inner: Arc<ClientInner>,
}

struct ClientInner {
	executor: Arc<dyn ScriptExecutor>,
	config: RwLock<RpcConfig>,
}

impl RpcClient {
	/// Client configured from the environment.
	pub fn new(executor: Arc<dyn ScriptExecutor>) -> Self {
		Self::with_config(executor, RpcConfig::from_env())
	}

	pub fn with_config(executor: Arc<dyn ScriptExecutor>, config: RpcConfig) -> Self {
		Self {
			inner: Arc::new(ClientInner {
				executor,
				config: RwLock::new(config),
			}),
		}
	}

	pub fn executor(&self) -> &Arc<dyn ScriptExecutor> {
		&self.inner.executor
	}

	pub fn config(&self) -> RpcConfig {
		self.inner.config.read().clone()
	}

	/// Takes effect from the next call.
	pub fn set_script_timeout_ms(&self, millis: i64) {
		self.inner.config.write().script_timeout_ms = millis;
	}

	/// Invokes the published callable `callable` with JSON `arguments`.
	///
	/// Fails with a message-only [`RpcError`] when the script reports that
	/// the view or the callable is missing, and with an executor cause when
	/// the script cannot run or times out.
	pub async fn call(&self, callable: &str, arguments: Vec<Value>) -> Result<Value> {
		let rendered: Vec<String> = arguments.iter().map(render_json).collect();
		let timeout = self.inner.config.read().script_timeout();
		debug!(callable, args = arguments.len(), ?timeout, "rpc call");

		let executor = &self.inner.executor;
		executor
			.set_script_timeout(timeout)
			.await
			.map_err(|e| RpcError::with_cause(callable, rendered.clone(), e))?;

		let script_args = ScriptCall::new(callable, arguments).into_script_args();
		let payload = executor
			.execute_async_script(script::call_script(), script_args)
			.await
			.map_err(|e| RpcError::with_cause(callable, rendered.clone(), e))?;

		script::outcome(payload).map_err(|message| RpcError::with_message(callable, rendered, message))
	}

	/// Proxy for the view-level interface `P`.
	pub fn proxy<P: Callables>(&self) -> std::result::Result<P, IllegalSignature> {
		Proxy::new(self.clone(), P::interface(), None).map(P::from_proxy)
	}

	/// Proxy for `P` whose calls run through `executor`, sharing this
	/// client's configuration.
	pub fn proxy_with<P: Callables>(&self, executor: Arc<dyn ScriptExecutor>) -> std::result::Result<P, IllegalSignature> {
		RpcClient::with_config(executor, self.config()).proxy()
	}

	/// Typed stub for an object the server already handed out.
	pub fn stub<S: Callables>(&self, reference: RemoteRef) -> std::result::Result<S, IllegalSignature> {
		RemoteStub::new(reference, self.clone()).narrow()
	}
}

/// Rendering of an argument in failure messages; strings appear unquoted.
pub(crate) fn render_json(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}
