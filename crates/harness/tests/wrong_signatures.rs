//! Interfaces whose signatures a call mode cannot carry.
//!
//! Every rejection happens while the proxy is created, before any script
//! reaches the browser.

use std::collections::HashMap;

use anyhow::Result;
use serde_json::Value;
use tbrpc::{IllegalSignature, JsonArrayList, interface};
use tbrpc_harness::fixtures::integration::{self, IntegrationViewCallablesProxy};
use tbrpc_harness::fixtures::rmi::{self, RmiIntegrationViewCallablesProxy};
use tbrpc_protocol::{AnyObject, RemoteHandle, Serial};

#[interface]
trait LongArgument {
	async fn take(&self, value: i64) -> tbrpc::Result<()>;
}

#[interface]
trait BoxedLongArgument {
	async fn take(&self, value: Option<i64>) -> tbrpc::Result<()>;
}

#[interface]
trait LongReturn {
	async fn give(&self) -> tbrpc::Result<i64>;
}

#[interface]
trait ArrayReturn {
	async fn give(&self) -> tbrpc::Result<Vec<i32>>;
}

#[interface]
trait RecordListReturn {
	async fn give(&self) -> tbrpc::Result<JsonArrayList<Serial>>;
}

#[interface]
trait ListArgument {
	async fn take(&self, values: JsonArrayList<String>) -> tbrpc::Result<()>;
}

#[interface]
trait EnumReturn {
	async fn give(&self) -> tbrpc::Result<integration::TestEnum>;
}

#[interface]
trait RemoteArgument {
	async fn take(&self, value: RemoteHandle) -> tbrpc::Result<()>;
}

#[interface]
trait SimpleArrays {
	async fn take(&self, flags: Vec<bool>, names: Vec<String>, modes: Vec<integration::TestEnum>) -> tbrpc::Result<Value>;
}

#[interface(rmi)]
trait ObjectArgument {
	async fn take(&self, value: AnyObject) -> tbrpc::Result<()>;
}

#[interface(rmi)]
trait MapReturn {
	async fn give(&self) -> tbrpc::Result<HashMap<String, i32>>;
}

#[interface(rmi)]
trait RmiEverything {
	async fn take(&self, a: i64, b: Option<i64>, c: Vec<i32>, d: Serial, e: rmi::ICounterStub) -> tbrpc::Result<Vec<i64>>;
}

#[test]
fn test_simple_mode_rejections() -> Result<()> {
	let (browser, client) = tbrpc_harness::open(integration::ROUTE);

	let err = client.proxy::<LongArgumentProxy>().err();
	assert_eq!(
		err.map(|e| e.to_string()).as_deref(),
		Some("Argument of type long of take is not supported by tbrpc")
	);
	assert!(matches!(client.proxy::<BoxedLongArgumentProxy>(), Err(IllegalSignature::Argument { .. })));
	assert!(matches!(client.proxy::<ListArgumentProxy>(), Err(IllegalSignature::Argument { .. })));
	assert!(matches!(client.proxy::<RemoteArgumentProxy>(), Err(IllegalSignature::Argument { .. })));

	assert!(matches!(client.proxy::<LongReturnProxy>(), Err(IllegalSignature::Return { .. })));
	assert!(matches!(client.proxy::<ArrayReturnProxy>(), Err(IllegalSignature::Return { .. })));
	assert!(matches!(client.proxy::<RecordListReturnProxy>(), Err(IllegalSignature::Return { .. })));
	assert!(matches!(client.proxy::<EnumReturnProxy>(), Err(IllegalSignature::Return { .. })));

	assert_eq!(browser.scripts_run(), 0);
	Ok(())
}

#[test]
fn test_simple_mode_acceptances() -> Result<()> {
	let (browser, client) = tbrpc_harness::open(integration::ROUTE);
	client.proxy::<IntegrationViewCallablesProxy>()?;
	client.proxy::<SimpleArraysProxy>()?;
	assert_eq!(browser.scripts_run(), 0);
	Ok(())
}

#[test]
fn test_rmi_mode_rejections() -> Result<()> {
	let (browser, client) = tbrpc_harness::open(rmi::ROUTE);

	let err = client.proxy::<ObjectArgumentProxy>().err();
	assert_eq!(
		err.map(|e| e.to_string()).as_deref(),
		Some("Argument of type Object of take is not primitive, remote or serializable")
	);
	assert!(matches!(client.proxy::<MapReturnProxy>(), Err(IllegalSignature::RmiReturn { .. })));
	assert_eq!(browser.scripts_run(), 0);
	Ok(())
}

#[test]
fn test_rmi_mode_acceptances() -> Result<()> {
	let (browser, client) = tbrpc_harness::open(rmi::ROUTE);
	client.proxy::<RmiIntegrationViewCallablesProxy>()?;
	client.proxy::<RmiEverythingProxy>()?;
	assert_eq!(browser.scripts_run(), 0);
	Ok(())
}
