//! Views that lack what the integration interface expects.
//!
//! Tests declare [`IntegrationViewCallables`](super::integration::IntegrationViewCallables)
//! against these routes.

use tbrpc_runtime::View;

/// No callables at all, so the page has no server binding.
pub const ROUTE_1: &str = "it/nocallables1";
/// Publishes some methods, with the wrong result types.
pub const ROUTE_2: &str = "it/nocallables2";

pub fn view_1() -> View {
	View::builder(ROUTE_1).build()
}

pub fn view_2() -> View {
	View::builder(ROUTE_2)
		.publish("return42IntegerPrimitive", || Ok(()))
		.publish("returnHelloWorld", || Ok(42i64))
		.build()
}
