//! Contract with the browser automation driver.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ExecutorError;

/// How long an async script may run before its callback must fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptTimeout {
	Bounded(Duration),
	Unbounded,
}

impl ScriptTimeout {
	/// Negative values mean unbounded.
	pub fn from_millis(millis: i64) -> Self {
		u64::try_from(millis)
			.map(|ms| Self::Bounded(Duration::from_millis(ms)))
			.unwrap_or(Self::Unbounded)
	}

	pub fn duration(self) -> Option<Duration> {
		match self {
			Self::Bounded(duration) => Some(duration),
			Self::Unbounded => None,
		}
	}
}

/// Runs asynchronous scripts in the current browser window.
///
/// The script receives `args` positionally followed by a callback; the value
/// passed to the callback is the result.
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
	async fn execute_async_script(&self, script: &str, args: Vec<Value>) -> Result<Value, ExecutorError>;

	async fn set_script_timeout(&self, timeout: ScriptTimeout) -> Result<(), ExecutorError>;
}

/// Window management on top of script execution.
#[async_trait]
pub trait WindowControl: ScriptExecutor {
	/// Handle of the window scripts currently run in.
	async fn window_handle(&self) -> Result<String, ExecutorError>;

	async fn window_handles(&self) -> Result<Vec<String>, ExecutorError>;

	/// Opens a blank tab without switching to it.
	async fn new_window(&self) -> Result<String, ExecutorError>;

	async fn switch_to_window(&self, handle: &str) -> Result<(), ExecutorError>;

	/// Loads `url` in the current window.
	async fn navigate(&self, url: &str) -> Result<(), ExecutorError>;

	/// Closes the current window.
	async fn close_window(&self) -> Result<(), ExecutorError>;
}
