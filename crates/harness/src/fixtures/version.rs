//! Framework version metadata, reached through `$call`.

use std::sync::Arc;

use tbrpc::interface;
use tbrpc_protocol::{RemoteObject, Version};
use tbrpc_runtime::{ClassTable, RemoteClass, View, version};

pub const ROUTE: &str = "it/version";

#[interface(rmi)]
pub trait VersionViewCallables {
	async fn get_version(&self) -> tbrpc::Result<Version>;
	async fn get_full_version(&self) -> tbrpc::Result<String>;
	async fn get_major_version(&self) -> tbrpc::Result<i32>;
	async fn get_minor_version(&self) -> tbrpc::Result<i32>;
	async fn get_revision(&self) -> tbrpc::Result<i32>;
}

struct VersionView;

impl RemoteObject for VersionView {}

fn classes() -> ClassTable {
	let class = RemoteClass::builder::<VersionView>("VersionView")
		.method("getVersion", |_: &VersionView| Ok(version::current()))
		.method("getFullVersion", |_: &VersionView| Ok(version::current().full_version))
		.method("getMajorVersion", |_: &VersionView| Ok(version::current().major_version))
		.method("getMinorVersion", |_: &VersionView| Ok(version::current().minor_version))
		.method("getRevision", |_: &VersionView| Ok(version::current().revision))
		.build();
	ClassTable::new().with(class)
}

pub fn view() -> View {
	super::bind_rmi(View::builder(ROUTE), Arc::new(VersionView), classes())
}
