//! An in-process browser.
//!
//! Implements the automation contract ([`ScriptExecutor`] and
//! [`WindowControl`]) over [`Application`] views. Each window holds the view
//! mounted for its URL. Running the call script looks up the view's
//! published callable and runs it on the blocking pool under the configured
//! script timeout, answering with the same `{result}` or `{message}` payload
//! the page script produces.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Number, Value};
use tbrpc::script::{self, NOT_PUBLISHED, ScriptCall, VIEW_NOT_FOUND};
use tbrpc::{ExecutorError, ScriptExecutor, ScriptTimeout, WindowControl};
use tbrpc_runtime::View;
use tracing::{debug, trace};

use crate::app::Application;

struct Window {
	handle: String,
	url: Option<String>,
	view: Option<Arc<View>>,
}

impl Window {
	fn blank(handle: String) -> Self {
		Self {
			handle,
			url: None,
			view: None,
		}
	}
}

struct Windows {
	open: Vec<Window>,
	current: Option<String>,
	next_handle: usize,
}

impl Windows {
	fn open(&mut self) -> String {
		self.next_handle += 1;
		let handle = format!("tab-{}", self.next_handle);
		self.open.push(Window::blank(handle.clone()));
		handle
	}

	fn current(&self) -> Result<&Window, ExecutorError> {
		let handle = self.current.as_deref().ok_or_else(|| ExecutorError::NoSuchWindow("no current window".into()))?;
		self.get(handle)
	}

	fn current_mut(&mut self) -> Result<&mut Window, ExecutorError> {
		let handle = self
			.current
			.clone()
			.ok_or_else(|| ExecutorError::NoSuchWindow("no current window".into()))?;
		self.open
			.iter_mut()
			.find(|w| w.handle == handle)
			.ok_or(ExecutorError::NoSuchWindow(handle))
	}

	fn get(&self, handle: &str) -> Result<&Window, ExecutorError> {
		self.open
			.iter()
			.find(|w| w.handle == handle)
			.ok_or_else(|| ExecutorError::NoSuchWindow(handle.to_string()))
	}
}

/// A browser whose pages are [`Application`] views.
pub struct SimulatedBrowser {
	app: Application,
	windows: Mutex<Windows>,
	timeout: Mutex<ScriptTimeout>,
	scripts_run: AtomicUsize,
}

impl SimulatedBrowser {
	/// A browser with one blank window.
	pub fn new(app: Application) -> Self {
		let mut windows = Windows {
			open: Vec::new(),
			current: None,
			next_handle: 0,
		};
		let first = windows.open();
		windows.current = Some(first);
		Self {
			app,
			windows: Mutex::new(windows),
			timeout: Mutex::new(ScriptTimeout::Unbounded),
			scripts_run: AtomicUsize::new(0),
		}
	}

	/// A browser with `route` already loaded in its window.
	pub fn open(app: Application, route: &str) -> Arc<Self> {
		let url = app.url(route);
		let browser = Self::new(app);
		browser.load(&url);
		Arc::new(browser)
	}

	pub fn app(&self) -> &Application {
		&self.app
	}

	/// Number of scripts executed so far, in any window.
	pub fn scripts_run(&self) -> usize {
		self.scripts_run.load(Ordering::SeqCst)
	}

	/// Timeout most recently set by a client.
	pub fn script_timeout(&self) -> ScriptTimeout {
		*self.timeout.lock()
	}

	/// URL loaded in the current window, if any.
	pub fn current_url(&self) -> Option<String> {
		self.windows.lock().current().ok().and_then(|w| w.url.clone())
	}

	fn load(&self, url: &str) {
		let view = self.app.mount(url).map(Arc::new);
		if let Ok(window) = self.windows.lock().current_mut() {
			debug!(handle = %window.handle, url, mounted = view.is_some(), "page loaded");
			window.url = Some(url.to_string());
			window.view = view;
		}
	}
}

#[async_trait]
impl ScriptExecutor for SimulatedBrowser {
	async fn execute_async_script(&self, script: &str, args: Vec<Value>) -> Result<Value, ExecutorError> {
		self.scripts_run.fetch_add(1, Ordering::SeqCst);
		if script != script::call_script() {
			return Err(ExecutorError::Script("only the call script is supported".into()));
		}
		let view = self.windows.lock().current()?.view.clone();

		let Some(view) = view.filter(|v| v.has_server_binding()) else {
			return Ok(script::failure(VIEW_NOT_FOUND));
		};
		let call = ScriptCall::from_script_args(&args).ok_or_else(|| ExecutorError::Script("malformed call arguments".into()))?;
		let Some(callable) = view.callable(&call.callable).cloned() else {
			trace!(route = view.route(), callable = %call.callable, "not published");
			return Ok(script::failure(NOT_PUBLISHED));
		};

		let arguments = call.rehydrate()?;
		let task = tokio::task::spawn_blocking(move || callable(arguments));
		let joined = match self.script_timeout().duration() {
			Some(limit) => tokio::time::timeout(limit, task).await.map_err(|_| ExecutorError::Timeout(limit))?,
			None => task.await,
		};

		Ok(match joined {
			Ok(Ok(value)) => script::success(normalize(value)),
			Ok(Err(thrown)) => script::failure(thrown.to_string()),
			Err(e) if e.is_panic() => script::failure("callable panicked"),
			Err(e) => return Err(ExecutorError::Script(e.to_string())),
		})
	}

	async fn set_script_timeout(&self, timeout: ScriptTimeout) -> Result<(), ExecutorError> {
		*self.timeout.lock() = timeout;
		Ok(())
	}
}

#[async_trait]
impl WindowControl for SimulatedBrowser {
	async fn window_handle(&self) -> Result<String, ExecutorError> {
		self.windows.lock().current().map(|w| w.handle.clone())
	}

	async fn window_handles(&self) -> Result<Vec<String>, ExecutorError> {
		Ok(self.windows.lock().open.iter().map(|w| w.handle.clone()).collect())
	}

	async fn new_window(&self) -> Result<String, ExecutorError> {
		Ok(self.windows.lock().open())
	}

	async fn switch_to_window(&self, handle: &str) -> Result<(), ExecutorError> {
		let mut windows = self.windows.lock();
		windows.get(handle)?;
		windows.current = Some(handle.to_string());
		Ok(())
	}

	async fn navigate(&self, url: &str) -> Result<(), ExecutorError> {
		self.windows.lock().current()?;
		self.load(url);
		Ok(())
	}

	async fn close_window(&self) -> Result<(), ExecutorError> {
		let mut windows = self.windows.lock();
		let handle = windows.current()?.handle.clone();
		windows.open.retain(|w| w.handle != handle);
		windows.current = None;
		debug!(%handle, "window closed");
		Ok(())
	}
}

/// Largest magnitude a double holds without rounding integers.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Numbers as a browser reports them: every number is a double, and
/// integral values within the safe range come back as integers.
fn normalize(value: Value) -> Value {
	match value {
		Value::Number(n) => match n.as_f64() {
			Some(f) if f.fract() == 0.0 && f.abs() < MAX_SAFE_INTEGER => Value::Number(Number::from(f as i64)),
			Some(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
			None => Value::Null,
		},
		Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
		Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, normalize(v))).collect()),
		other => other,
	}
}
