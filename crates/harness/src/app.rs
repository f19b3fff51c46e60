//! Routes of the application under test.

use std::collections::HashMap;
use std::sync::Arc;

use tbrpc_runtime::View;

/// Builds a fresh view for one page load.
pub type ViewFactory = Arc<dyn Fn() -> View + Send + Sync>;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Maps routes to view factories.
///
/// Every navigation mounts a new view, so per-view state such as the remote
/// object registry starts empty on each page load.
#[derive(Clone)]
pub struct Application {
	base_url: String,
	routes: HashMap<String, ViewFactory>,
}

impl Default for Application {
	fn default() -> Self {
		Self::new(DEFAULT_BASE_URL)
	}
}

impl Application {
	pub fn new(base_url: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into().trim_end_matches('/').to_string(),
			routes: HashMap::new(),
		}
	}

	pub fn route<F>(mut self, route: impl Into<String>, factory: F) -> Self
	where
		F: Fn() -> View + Send + Sync + 'static,
	{
		self.routes.insert(route.into(), Arc::new(factory));
		self
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	/// Absolute URL of `route`.
	pub fn url(&self, route: &str) -> String {
		format!("{}/{}", self.base_url, route.trim_start_matches('/'))
	}

	/// Mounts the view served at `url`, if the application has one.
	pub fn mount(&self, url: &str) -> Option<View> {
		let path = url.strip_prefix(&self.base_url)?;
		let route = path.trim_start_matches('/').split(['?', '#']).next().unwrap_or_default();
		self.routes.get(route).map(|factory| factory())
	}
}
