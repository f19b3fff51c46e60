//! Error types for the client side.
//!
//! Every failure of a proxied call surfaces as one [`RpcError`]. Its message
//! names the method and renders the arguments; the underlying [`Cause`], when
//! there is one, stays reachable through [`std::error::Error::source`].

use std::time::Duration;

use tbrpc_protocol::{CastError, MarshalError, ProtocolViolation, RmiErrorKind, Throwable, UnmarshalError};
use thiserror::Error;

/// Result type alias for proxied calls.
pub type Result<T> = std::result::Result<T, RpcError>;

/// Failures reported by a [`ScriptExecutor`](crate::ScriptExecutor).
#[derive(Debug, Error)]
pub enum ExecutorError {
	/// The async script did not call back before the script timeout.
	#[error("Timed out after {0:?} waiting for script result")]
	Timeout(Duration),

	/// The browser rejected or failed to run the script.
	#[error("Script execution failed: {0}")]
	Script(String),

	#[error("No such window: {0}")]
	NoSuchWindow(String),

	/// The automation endpoint could not be reached or answered garbage.
	#[error("Transport error: {0}")]
	Transport(String),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[cfg(feature = "webdriver")]
	#[error("HTTP error: {0}")]
	Http(#[from] reqwest::Error),
}

/// What went wrong underneath an [`RpcError`].
#[derive(Debug, Error)]
pub enum Cause {
	#[error(transparent)]
	Executor(#[from] ExecutorError),

	/// The result could not be converted to the declared return type.
	#[error(transparent)]
	Cast(#[from] CastError),

	#[error(transparent)]
	Marshal(#[from] MarshalError),

	#[error(transparent)]
	Unmarshal(#[from] UnmarshalError),

	#[error(transparent)]
	Protocol(#[from] ProtocolViolation),

	/// Classified failure from the server-side dispatcher.
	#[error("{}", remote_message(*kind, exception.as_ref()))]
	Remote {
		kind: RmiErrorKind,
		exception: Option<Throwable>,
	},
}

fn remote_message(kind: RmiErrorKind, exception: Option<&Throwable>) -> String {
	match exception {
		Some(exception) => format!("{kind}: {exception}"),
		None => kind.to_string(),
	}
}

/// Uniform failure of a proxied call.
#[derive(Debug, Error)]
#[error("{method}({}) RPC call failed{}", arguments.join(","), message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct RpcError {
	method: String,
	arguments: Vec<String>,
	message: Option<String>,
	#[source]
	cause: Option<Cause>,
}

impl RpcError {
	/// Message-only failure, as reported by the browser-side script.
	pub fn with_message(method: impl Into<String>, arguments: Vec<String>, message: Option<String>) -> Self {
		Self {
			method: method.into(),
			arguments,
			message,
			cause: None,
		}
	}

	pub fn with_cause(method: impl Into<String>, arguments: Vec<String>, cause: impl Into<Cause>) -> Self {
		let cause = cause.into();
		Self {
			method: method.into(),
			arguments,
			message: Some(cause.to_string()),
			cause: Some(cause),
		}
	}

	/// The same failure, reported against another method and arguments.
	pub(crate) fn relocate(self, method: impl Into<String>, arguments: Vec<String>) -> Self {
		Self {
			method: method.into(),
			arguments,
			..self
		}
	}

	pub fn method(&self) -> &str {
		&self.method
	}

	pub fn arguments(&self) -> &[String] {
		&self.arguments
	}

	pub fn message(&self) -> Option<&str> {
		self.message.as_deref()
	}

	pub fn cause(&self) -> Option<&Cause> {
		self.cause.as_ref()
	}

	/// Whether the call gave up waiting on the browser.
	pub fn is_timeout(&self) -> bool {
		matches!(self.cause, Some(Cause::Executor(ExecutorError::Timeout(_))))
	}

	/// Server-side error kind, for reference-capable calls.
	pub fn remote_kind(&self) -> Option<RmiErrorKind> {
		match &self.cause {
			Some(Cause::Remote { kind, .. }) => Some(*kind),
			_ => None,
		}
	}

	/// Server-side exception, when the error kind carries one.
	pub fn remote_exception(&self) -> Option<&Throwable> {
		match &self.cause {
			Some(Cause::Remote { exception, .. }) => exception.as_ref(),
			_ => None,
		}
	}
}

/// A declared signature cannot be carried by the proxy's call mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IllegalSignature {
	/// Simple mode argument type.
	#[error("Argument of type {ty} of {method} is not supported by tbrpc")]
	Argument { method: String, ty: String },

	/// Simple mode return type.
	#[error("Return type {ty} of {method} is not supported by tbrpc")]
	Return { method: String, ty: String },

	#[error("Argument of type {ty} of {method} is not primitive, remote or serializable")]
	RmiArgument { method: String, ty: String },

	#[error("Return type {ty} of {method} is not primitive, remote or serializable")]
	RmiReturn { method: String, ty: String },

	/// A stub was narrowed to an interface its object does not implement.
	#[error("{object} does not implement {interface}")]
	NotImplemented { interface: String, object: String },
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_message_without_detail() {
		let err = RpcError::with_message("ping", vec![], None);
		assert_eq!(err.to_string(), "ping() RPC call failed");
	}

	#[test]
	fn test_message_joins_arguments() {
		let err = RpcError::with_message("concat", vec!["a".into(), "1".into()], Some("boom".into()));
		assert_eq!(err.to_string(), "concat(a,1) RPC call failed: boom");
	}

	#[test]
	fn test_cause_supplies_message() {
		let err = RpcError::with_cause("return42IntegerPrimitive", vec![], CastError::null("int"));
		assert_eq!(err.to_string(), "return42IntegerPrimitive() RPC call failed: Cannot cast null as int");
		assert!(std::error::Error::source(&err).is_some());
		assert!(!err.is_timeout());
	}

	#[test]
	fn test_remote_accessors() {
		let err = RpcError::with_cause(
			"throwException",
			vec![],
			Cause::Remote {
				kind: RmiErrorKind::Invoke,
				exception: Some(Throwable::new("IllegalStateException", "bad")),
			},
		);
		assert_eq!(err.remote_kind(), Some(RmiErrorKind::Invoke));
		assert_eq!(err.remote_exception().map(|t| t.class.as_str()), Some("IllegalStateException"));
		assert_eq!(err.message(), Some("E_INVOKE: IllegalStateException: bad"));
	}

	#[test]
	fn test_timeout_predicate() {
		let err = RpcError::with_cause("slow", vec![], ExecutorError::Timeout(Duration::from_millis(10)));
		assert!(err.is_timeout());
		assert_eq!(err.remote_kind(), None);
	}
}
