//! [`ScriptExecutor`] over a W3C WebDriver session.
//!
//! Connects to an already running driver (chromedriver, geckodriver, a
//! Selenium grid) and speaks the plain HTTP endpoints for async scripts,
//! timeouts and windows.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::ExecutorError;
use crate::executor::{ScriptExecutor, ScriptTimeout, WindowControl};

/// Error code WebDriver reports when an async script does not call back.
const SCRIPT_TIMEOUT: &str = "script timeout";

#[derive(Deserialize)]
struct Reply {
	#[serde(default)]
	value: Value,
}

#[derive(Deserialize)]
struct Failure {
	error: String,
	#[serde(default)]
	message: String,
}

pub struct WebDriverExecutor {
	client: Client,
	session_url: String,
	/// Last applied script timeout, reported in timeout errors.
	timeout: Mutex<ScriptTimeout>,
}

impl WebDriverExecutor {
	/// Binds to an existing session.
	pub fn connect(base_url: &str, session_id: &str) -> Self {
		Self {
			client: Client::new(),
			session_url: format!("{}/session/{session_id}", base_url.trim_end_matches('/')),
			timeout: Mutex::new(ScriptTimeout::Bounded(Duration::from_secs(30))),
		}
	}

	/// Starts a session with the given capabilities and binds to it.
	pub async fn new_session(base_url: &str, capabilities: Value) -> Result<Self, ExecutorError> {
		let client = Client::new();
		let url = format!("{}/session", base_url.trim_end_matches('/'));
		let response = client
			.post(url)
			.json(&json!({ "capabilities": capabilities }))
			.send()
			.await?;
		let value = read_value(response).await?;
		let session_id = value
			.get("sessionId")
			.and_then(Value::as_str)
			.ok_or_else(|| ExecutorError::Transport("new session reply has no sessionId".into()))?;
		debug!(%session_id, "started webdriver session");
		Ok(Self {
			client,
			..Self::connect(base_url, session_id)
		})
	}

	/// Ends the session.
	pub async fn quit(&self) -> Result<(), ExecutorError> {
		self.request(Method::DELETE, "", None).await.map(drop)
	}

	async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, ExecutorError> {
		let mut request = self.client.request(method, format!("{}{path}", self.session_url));
		if let Some(body) = body {
			request = request.json(&body);
		}
		let response = request.send().await?;
		let timeout = *self.timeout.lock();
		read_value(response).await.map_err(|e| classify_timeout(e, timeout))
	}
}

async fn read_value(response: reqwest::Response) -> Result<Value, ExecutorError> {
	let status = response.status();
	let body: Value = response.json().await?;
	decode_reply(status, body)
}

/// Unwraps the `value` of a reply, turning error replies into script failures.
fn decode_reply(status: StatusCode, body: Value) -> Result<Value, ExecutorError> {
	let reply: Reply = serde_json::from_value(body)?;
	if status.is_success() {
		return Ok(reply.value);
	}
	match serde_json::from_value::<Failure>(reply.value) {
		Ok(failure) => Err(ExecutorError::Script(format!("{}: {}", failure.error, failure.message))),
		Err(_) => Err(ExecutorError::Transport(format!("webdriver answered {status}"))),
	}
}

/// A script failure with the WebDriver timeout code is a [`ExecutorError::Timeout`].
fn classify_timeout(error: ExecutorError, timeout: ScriptTimeout) -> ExecutorError {
	match error {
		ExecutorError::Script(message) if message.starts_with(SCRIPT_TIMEOUT) => {
			ExecutorError::Timeout(timeout.duration().unwrap_or(Duration::MAX))
		}
		other => other,
	}
}

#[async_trait]
impl ScriptExecutor for WebDriverExecutor {
	async fn execute_async_script(&self, script: &str, args: Vec<Value>) -> Result<Value, ExecutorError> {
		self.request(Method::POST, "/execute/async", Some(json!({ "script": script, "args": args })))
			.await
	}

	async fn set_script_timeout(&self, timeout: ScriptTimeout) -> Result<(), ExecutorError> {
		let script = timeout.duration().map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
		self.request(Method::POST, "/timeouts", Some(json!({ "script": script })))
			.await?;
		*self.timeout.lock() = timeout;
		Ok(())
	}
}

#[async_trait]
impl WindowControl for WebDriverExecutor {
	async fn window_handle(&self) -> Result<String, ExecutorError> {
		let value = self.request(Method::GET, "/window", None).await?;
		Ok(serde_json::from_value(value)?)
	}

	async fn window_handles(&self) -> Result<Vec<String>, ExecutorError> {
		let value = self.request(Method::GET, "/window/handles", None).await?;
		Ok(serde_json::from_value(value)?)
	}

	async fn new_window(&self) -> Result<String, ExecutorError> {
		let value = self
			.request(Method::POST, "/window/new", Some(json!({ "type": "tab" })))
			.await?;
		value
			.get("handle")
			.and_then(Value::as_str)
			.map(str::to_string)
			.ok_or_else(|| ExecutorError::Transport("new window reply has no handle".into()))
	}

	async fn switch_to_window(&self, handle: &str) -> Result<(), ExecutorError> {
		self.request(Method::POST, "/window", Some(json!({ "handle": handle })))
			.await
			.map(drop)
	}

	async fn navigate(&self, url: &str) -> Result<(), ExecutorError> {
		self.request(Method::POST, "/url", Some(json!({ "url": url })))
			.await
			.map(drop)
	}

	async fn close_window(&self) -> Result<(), ExecutorError> {
		self.request(Method::DELETE, "/window", None)
			.await
			.map(drop)
	}
}
