//! Calls into a second tab.
//!
//! A [`SideChannel`] is a [`ScriptExecutor`] that runs every script in a
//! secondary window loaded with a fixed URL. The window is opened on first
//! use, focus returns to the original window after each script, and a closed
//! channel reopens on the next call.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::ExecutorError;
use crate::executor::{ScriptExecutor, ScriptTimeout, WindowControl};

pub struct SideChannel {
	browser: Arc<dyn WindowControl>,
	url: String,
	/// Handle of the side window while it is open.
	window: Mutex<Option<String>>,
}

impl SideChannel {
	pub fn new(browser: Arc<dyn WindowControl>, url: impl Into<String>) -> Self {
		Self {
			browser,
			url: url.into(),
			window: Mutex::new(None),
		}
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	pub async fn is_open(&self) -> bool {
		self.window.lock().await.is_some()
	}

	/// Closes the side window, if open.
	pub async fn close(&self) -> Result<(), ExecutorError> {
		let mut window = self.window.lock().await;
		let Some(handle) = window.take() else {
			return Ok(());
		};
		let home = self.browser.window_handle().await?;
		self.browser.switch_to_window(&handle).await?;
		let closed = self.browser.close_window().await;
		self.browser.switch_to_window(&home).await?;
		debug!(url = %self.url, "closed side channel");
		closed
	}

	/// Returns the side window handle, opening the window if needed.
	async fn ensure_open(&self, window: &mut Option<String>, home: &str) -> Result<String, ExecutorError> {
		if let Some(handle) = window.as_deref() {
			if self.browser.window_handles().await?.iter().any(|h| h == handle) {
				return Ok(handle.to_string());
			}
		}
		let handle = self.browser.new_window().await?;
		self.browser.switch_to_window(&handle).await?;
		let loaded = self.browser.navigate(&self.url).await;
		self.browser.switch_to_window(home).await?;
		loaded?;
		debug!(url = %self.url, %handle, "opened side channel");
		*window = Some(handle.clone());
		Ok(handle)
	}
}

#[async_trait]
impl ScriptExecutor for SideChannel {
	async fn execute_async_script(&self, script: &str, args: Vec<Value>) -> Result<Value, ExecutorError> {
		let mut window = self.window.lock().await;
		let home = self.browser.window_handle().await?;
		let handle = self.ensure_open(&mut window, &home).await?;

		self.browser.switch_to_window(&handle).await?;
		let result = self.browser.execute_async_script(script, args).await;
		self.browser.switch_to_window(&home).await?;
		result
	}

	async fn set_script_timeout(&self, timeout: ScriptTimeout) -> Result<(), ExecutorError> {
		self.browser.set_script_timeout(timeout).await
	}
}
