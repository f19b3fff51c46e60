//! Reference-capable view: remote objects, stubs and by-value records.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tbrpc::interface;
use tbrpc_protocol::{Component, Marshal, RemoteHandle, RemoteObject, Serial, Throwable};
use tbrpc_runtime::{ClassTable, RemoteClass, View};

pub const ROUTE: &str = "it/rmi";

#[interface(rmi)]
pub trait RmiIntegrationViewCallables {
	async fn test_callable_success(&self) -> tbrpc::Result<()>;
	async fn test_callable_failure(&self) -> tbrpc::Result<()>;
	/// Declared but not implemented by the view.
	async fn test_failure_json_object(&self) -> tbrpc::Result<Map<String, Value>>;
	async fn test_long(&self, arg: i64) -> tbrpc::Result<i64>;

	async fn create_remote(&self, name: String) -> tbrpc::Result<MyRemoteObjectStub>;
	async fn create_identity(&self, name: String) -> tbrpc::Result<IdentityStub>;
	async fn remote_argument(&self, remote: MyRemoteObjectStub) -> tbrpc::Result<String>;
	async fn get_counter(&self, name: String) -> tbrpc::Result<ICounterStub>;

	async fn test(&self, value: Serial) -> tbrpc::Result<Serial>;
	async fn same(&self, a: Serial, b: Serial) -> tbrpc::Result<bool>;
	#[rpc(name = "same")]
	async fn same_remote(&self, a: ICounterStub, b: ICounterStub) -> tbrpc::Result<bool>;

	async fn return_component(&self) -> tbrpc::Result<Component>;
	async fn wrap(&self, remote: ICounterStub) -> tbrpc::Result<Wrapper>;
	async fn create_wrapped_counter(&self, name: String) -> tbrpc::Result<Wrapper>;
	async fn return_json_object(&self, key: String, value: String) -> tbrpc::Result<Map<String, Value>>;
}

#[interface(remote)]
pub trait MyRemoteObject {
	async fn get_name(&self) -> tbrpc::Result<String>;
}

#[interface(remote)]
pub trait ICounter {
	async fn get_count(&self) -> tbrpc::Result<i64>;
	async fn set_count(&self, count: i64) -> tbrpc::Result<()>;
}

#[interface(remote)]
pub trait Identity {
	async fn get_value(&self) -> tbrpc::Result<Option<String>>;
	async fn set_value(&self, value: String) -> tbrpc::Result<()>;
}

/// Record holding a counter, as the client sees it.
#[derive(Debug, Clone, Marshal)]
pub struct Wrapper {
	pub object: ICounterStub,
}

/// Plain serializable value.
#[derive(Debug, Clone, PartialEq, Eq, Marshal)]
pub struct Pair {
	pub left: i32,
	pub right: i32,
}

/// The view object `$call` dispatches on.
#[derive(Default)]
pub struct RmiIntegrationView {
	counters: Mutex<HashMap<String, Arc<Counter>>>,
}

impl RemoteObject for RmiIntegrationView {}

pub struct Counter {
	name: String,
	count: AtomicI64,
}

impl RemoteObject for Counter {}

struct NamedRemote {
	name: String,
}

impl RemoteObject for NamedRemote {}

/// Every instance is a distinct remote, however its value compares.
struct IdentityImpl {
	value: Mutex<Option<String>>,
}

impl RemoteObject for IdentityImpl {}

/// The server side of [`Wrapper`].
#[derive(Marshal)]
#[marshal(name = "Wrapper")]
struct WrapperRecord {
	object: RemoteHandle,
}

fn class_cast(expected: &str) -> Throwable {
	Throwable::new("ClassCastException", format!("argument is not a {expected}"))
}

impl RmiIntegrationView {
	/// One counter per name for the life of the view.
	pub fn counter(&self, name: &str) -> Arc<Counter> {
		self.counters
			.lock()
			.entry(name.to_string())
			.or_insert_with(|| {
				Arc::new(Counter {
					name: name.to_string(),
					count: AtomicI64::new(0),
				})
			})
			.clone()
	}

	fn remote_argument(&self, remote: RemoteHandle) -> Result<String, Throwable> {
		if let Some(named) = remote.downcast::<NamedRemote>() {
			return Ok(named.name.clone());
		}
		remote
			.downcast::<Counter>()
			.map(|counter| counter.name.clone())
			.ok_or_else(|| class_cast("MyRemoteObject"))
	}

	fn wrap(&self, remote: RemoteHandle) -> Result<WrapperRecord, Throwable> {
		if remote.downcast::<Counter>().is_none() {
			return Err(class_cast("ICounter"));
		}
		Ok(WrapperRecord { object: remote })
	}
}

fn classes() -> ClassTable {
	let view = RemoteClass::builder::<RmiIntegrationView>("RmiIntegrationView")
		.method("testCallableSuccess", |_: &RmiIntegrationView| Ok(()))
		.method("testCallableFailure", |_: &RmiIntegrationView| -> Result<(), Throwable> {
			Err(Throwable::bare("RuntimeException"))
		})
		.method("testLong", |_: &RmiIntegrationView, arg: i64| Ok(arg))
		.method("createRemote", |_: &RmiIntegrationView, name: String| {
			Ok(RemoteHandle::new(Arc::new(NamedRemote { name })))
		})
		.method("createIdentity", |_: &RmiIntegrationView, _name: String| {
			Ok(RemoteHandle::new(Arc::new(IdentityImpl { value: Mutex::new(None) })))
		})
		.method("remoteArgument", |view: &RmiIntegrationView, remote: RemoteHandle| view.remote_argument(remote))
		.method("getCounter", |view: &RmiIntegrationView, name: String| {
			Ok(RemoteHandle::new(view.counter(&name)))
		})
		.method("test", |_: &RmiIntegrationView, value: Serial| Ok(value))
		.method("same", |_: &RmiIntegrationView, a: Serial, b: Serial| Ok(a.same(&b)))
		.method("same", |_: &RmiIntegrationView, a: RemoteHandle, b: RemoteHandle| Ok(a.ptr_eq(&b)))
		.method("returnComponent", |_: &RmiIntegrationView| Ok(Component::new("RmiIntegrationView")))
		.method("wrap", |view: &RmiIntegrationView, remote: RemoteHandle| view.wrap(remote))
		.method("createWrappedCounter", |view: &RmiIntegrationView, name: String| {
			Ok(WrapperRecord {
				object: RemoteHandle::new(view.counter(&name)),
			})
		})
		.method("returnJsonObject", |_: &RmiIntegrationView, key: String, value: String| {
			let mut obj = Map::new();
			obj.insert(key, Value::String(value));
			Ok(obj)
		})
		.build();

	let counter = RemoteClass::builder::<Counter>("Counter")
		.implements("ICounter")
		.implements("MyRemoteObject")
		.method("getName", |c: &Counter| Ok(c.name.clone()))
		.method("getCount", |c: &Counter| Ok(c.count.load(Ordering::SeqCst)))
		.method("setCount", |c: &Counter, count: i64| {
			c.count.store(count, Ordering::SeqCst);
			Ok(())
		})
		.build();

	let named = RemoteClass::builder::<NamedRemote>("MyRemoteObjectImpl")
		.implements("MyRemoteObject")
		.method("getName", |r: &NamedRemote| Ok(r.name.clone()))
		.build();

	let identity = RemoteClass::builder::<IdentityImpl>("IdentityImpl")
		.implements("Identity")
		.method("getValue", |i: &IdentityImpl| Ok(i.value.lock().clone()))
		.method("setValue", |i: &IdentityImpl, value: String| {
			*i.value.lock() = Some(value);
			Ok(())
		})
		.build();

	ClassTable::new().with(view).with(counter).with(named).with(identity)
}

pub fn view() -> View {
	super::bind_rmi(View::builder(ROUTE), Arc::new(RmiIntegrationView::default()), classes())
}
