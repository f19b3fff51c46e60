//! Reference-capable calls against the `it/rmi` view.

use std::collections::HashSet;

use anyhow::Result;
use tbrpc::WindowControl;
use tbrpc_harness::fixtures::rmi::{
	ICounter, Identity, IdentityStub, MyRemoteObject, MyRemoteObjectStub, Pair, ROUTE, RmiIntegrationViewCallables,
	RmiIntegrationViewCallablesProxy,
};
use tbrpc_protocol::{Marshal, RmiErrorKind, Serial};

fn server() -> Result<RmiIntegrationViewCallablesProxy> {
	let (_browser, client) = tbrpc_harness::open(ROUTE);
	Ok(client.proxy()?)
}

#[tokio::test]
async fn test_callable_success() -> Result<()> {
	server()?.test_callable_success().await?;
	Ok(())
}

#[tokio::test]
async fn test_callable_failure_carries_exception() -> Result<()> {
	let err = server()?.test_callable_failure().await.unwrap_err();
	assert_eq!(err.remote_kind(), Some(RmiErrorKind::Invoke));
	assert_eq!(err.remote_exception().map(|t| t.class.as_str()), Some("RuntimeException"));
	assert_eq!(err.to_string(), "testCallableFailure() RPC call failed: E_INVOKE: RuntimeException");
	Ok(())
}

#[tokio::test]
async fn test_undeclared_server_method() -> Result<()> {
	let err = server()?.test_failure_json_object().await.unwrap_err();
	assert_eq!(err.remote_kind(), Some(RmiErrorKind::NoSuchMethod));
	assert!(err.remote_exception().is_none());
	Ok(())
}

#[tokio::test]
async fn test_unserializable_result() -> Result<()> {
	let err = server()?.return_component().await.unwrap_err();
	assert_eq!(err.remote_kind(), Some(RmiErrorKind::Marshal));
	Ok(())
}

#[tokio::test]
async fn test_long_is_carried_exactly() -> Result<()> {
	let server = server()?;
	assert_eq!(server.test_long(i64::MAX).await?, i64::MAX);
	assert_eq!(server.test_long(i64::MIN).await?, i64::MIN);
	Ok(())
}

#[tokio::test]
async fn test_json_object_result() -> Result<()> {
	let obj = server()?.return_json_object("key".into(), "value".into()).await?;
	assert_eq!(obj.get("key").and_then(|v| v.as_str()), Some("value"));
	Ok(())
}

#[tokio::test]
async fn test_create_and_call_remote() -> Result<()> {
	let server = server()?;
	let remote = server.create_remote("foo".into()).await?;
	assert_eq!(remote.get_name().await?, "foo");
	assert_eq!(remote.to_string(), "MyRemoteObject");
	assert_eq!(server.remote_argument(remote).await?, "foo");
	Ok(())
}

#[tokio::test]
async fn test_stub_identity() -> Result<()> {
	let server = server()?;
	let a = server.get_counter("a".into()).await?;
	let again = server.get_counter("a".into()).await?;
	let b = server.get_counter("b".into()).await?;

	assert_eq!(a, again);
	assert_ne!(a, b);
	assert_eq!(HashSet::from([a.clone(), again.clone(), b.clone()]).len(), 2);
	assert!(server.same_remote(a.clone(), again.clone()).await?);
	assert!(!server.same_remote(a.clone(), b).await?);

	a.set_count(42).await?;
	assert_eq!(again.get_count().await?, 42);
	Ok(())
}

#[tokio::test]
async fn test_identity_objects_are_distinct() -> Result<()> {
	let server = server()?;
	let first = server.create_identity("x".into()).await?;
	let second = server.create_identity("x".into()).await?;
	assert_ne!(first, second);
	assert_ne!(first.instance_id(), second.instance_id());

	first.set_value("set".into()).await?;
	assert_eq!(first.get_value().await?.as_deref(), Some("set"));
	assert_eq!(second.get_value().await?, None);
	Ok(())
}

#[tokio::test]
async fn test_stub_label_and_narrowing() -> Result<()> {
	let server = server()?;
	let counter = server.get_counter("c".into()).await?;
	assert_eq!(counter.to_string(), "ICounter&MyRemoteObject");

	let named: MyRemoteObjectStub = counter.narrow()?;
	assert_eq!(named.get_name().await?, "c");
	assert_eq!(named.instance_id(), counter.instance_id());
	assert!(counter.narrow::<IdentityStub>().is_err());
	assert_eq!(server.remote_argument(named).await?, "c");
	Ok(())
}

#[tokio::test]
async fn test_records_travel_by_value() -> Result<()> {
	let server = server()?;
	let pair = Pair { left: 7, right: -7 };
	let back = server.test(pair.clone().into_serial()?).await?;
	assert_eq!(Pair::from_serial(back)?, pair);
	Ok(())
}

#[tokio::test]
async fn test_shared_arguments_keep_identity() -> Result<()> {
	let server = server()?;
	let shared = Pair { left: 1, right: 2 }.into_serial()?;
	assert!(server.same(shared.clone(), shared).await?);

	let a = Pair { left: 1, right: 2 }.into_serial()?;
	let b = Pair { left: 1, right: 2 }.into_serial()?;
	assert!(!server.same(a, b).await?);
	assert!(server.same(Serial::Null, Serial::Null).await?);
	Ok(())
}

#[tokio::test]
async fn test_remote_inside_record() -> Result<()> {
	let server = server()?;
	let counter = server.get_counter("w".into()).await?;
	counter.set_count(42).await?;

	let wrapped = server.wrap(counter.clone()).await?;
	assert_eq!(wrapped.object, counter);
	assert_eq!(wrapped.object.get_count().await?, 42);

	let created = server.create_wrapped_counter("w".into()).await?;
	assert_eq!(created.object, counter);
	Ok(())
}

#[tokio::test]
async fn test_registry_is_per_view_instance() -> Result<()> {
	let (browser, client) = tbrpc_harness::open(ROUTE);
	let server: RmiIntegrationViewCallablesProxy = client.proxy()?;
	let counter = server.get_counter("a".into()).await?;

	browser.navigate(&browser.app().url(ROUTE)).await?;
	let err = counter.get_count().await.unwrap_err();
	assert_eq!(err.remote_kind(), Some(RmiErrorKind::ObjectNotExist));
	Ok(())
}
