//! Views of the test application and the interfaces tests declare for them.
//!
//! Each module pairs a server-side view factory with the client-side trait a
//! test would write against it.

pub mod integration;
pub mod no_callables;
pub mod other;
pub mod rmi;
pub mod version;

use std::sync::Arc;

use tbrpc_protocol::RemoteObject;
use tbrpc_runtime::{ClassTable, RemoteDispatcher, View, ViewBuilder};
use tracing::error;

use crate::app::Application;

/// The application with every fixture view mounted at its route.
pub fn application() -> Application {
	Application::default()
		.route(integration::ROUTE, integration::view)
		.route(integration::RMI_ROUTE, integration::rmi_view)
		.route(no_callables::ROUTE_1, no_callables::view_1)
		.route(no_callables::ROUTE_2, no_callables::view_2)
		.route(rmi::ROUTE, rmi::view)
		.route(version::ROUTE, version::view)
		.route(other::ROUTE, other::view)
		.route("", other::home)
}

/// Finishes `builder` as a reference-capable view dispatching on `this`.
///
/// A view class missing from `classes` leaves the view without `$call`.
fn bind_rmi<T: RemoteObject>(builder: ViewBuilder, this: Arc<T>, classes: ClassTable) -> View {
	match RemoteDispatcher::new(this, classes) {
		Ok(dispatcher) => builder.rmi(dispatcher).build(),
		Err(e) => {
			error!(error = %e, "view class not registered");
			builder.build()
		}
	}
}
