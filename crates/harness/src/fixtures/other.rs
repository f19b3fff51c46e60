//! Views reached from another page through a side channel.

use tbrpc::interface;
use tbrpc_runtime::View;

pub const ROUTE: &str = "other";

#[interface]
pub trait OtherCallables {
	async fn get_class_name(&self) -> tbrpc::Result<String>;
}

pub fn view() -> View {
	View::builder(ROUTE).publish("getClassName", || Ok("OtherView".to_string())).build()
}

/// The landing page: no server binding.
pub fn home() -> View {
	View::builder("").build()
}
