//! End-to-end harness for tbrpc.
//!
//! [`SimulatedBrowser`] plays the browser: it keeps windows, mounts the
//! [`Application`] view for each loaded URL, and answers the call script the
//! way the injected page script would. The [`fixtures`] module holds the
//! views exercised by the integration suites together with the client-side
//! interfaces declared against them.

pub mod app;
pub mod browser;
pub mod fixtures;
pub mod logging;

use std::sync::Arc;

use tbrpc::RpcClient;

pub use app::{Application, ViewFactory};
pub use browser::SimulatedBrowser;
pub use logging::init_tracing;

/// A browser showing `route` of the fixture application, and a client bound
/// to its window.
pub fn open(route: &str) -> (Arc<SimulatedBrowser>, RpcClient) {
	init_tracing();
	let browser = SimulatedBrowser::open(fixtures::application(), route);
	let client = RpcClient::new(browser.clone());
	(browser, client)
}
