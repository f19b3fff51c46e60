//! Simple protocol against the `it` view.

use std::time::Duration;

use anyhow::Result;
use serde_json::{Map, Value, json};
use tbrpc::{RpcClient, interface};
use tbrpc_harness::{Application, SimulatedBrowser};
use tbrpc_harness::fixtures::integration::{
	HELLO, HELLO_WORLD, IntegrationViewCallables, IntegrationViewCallablesProxy, IntegrationViewRmiCallables,
	IntegrationViewRmiCallablesProxy, RMI_ROUTE, ROUTE, TestEnum, WORLD,
};

fn server() -> Result<IntegrationViewCallablesProxy> {
	let (_browser, client) = tbrpc_harness::open(ROUTE);
	Ok(client.proxy()?)
}

#[tokio::test]
async fn test_callable_success() -> Result<()> {
	server()?.test_callable_success().await?;
	Ok(())
}

#[tokio::test]
async fn test_callable_failure() -> Result<()> {
	let err = server()?.test_callable_failure().await.unwrap_err();
	assert_eq!(err.method(), "testCallableFailure");
	assert_eq!(err.to_string(), "testCallableFailure() RPC call failed: RuntimeException");
	assert!(err.cause().is_none());
	Ok(())
}

#[tokio::test]
async fn test_primitive_results() -> Result<()> {
	let server = server()?;
	assert!(server.return_true().await?);
	assert_eq!(server.return_42_integer_primitive().await?, 42);
	assert_eq!(server.return_42_double_primitive().await?, 42.0);
	assert_eq!(server.return_42_integer().await?, Some(42));
	assert_eq!(server.return_42_double().await?, Some(42.0));
	assert_eq!(server.return_hello_world().await?, HELLO_WORLD);
	Ok(())
}

#[tokio::test]
async fn test_primitive_arguments() -> Result<()> {
	let server = server()?;
	assert!(!server.negate(true).await?);
	assert!(server.negate(false).await?);
	assert_eq!(server.concat_world(String::new()).await?, WORLD);
	assert_eq!(server.concat_world(HELLO.into()).await?, HELLO_WORLD);
	Ok(())
}

#[tokio::test]
async fn test_enum_argument() -> Result<()> {
	let server = server()?;
	assert!(server.test_foo_enum(TestEnum::Foo).await?);
	assert!(!server.test_foo_enum(TestEnum::Bar).await?);
	Ok(())
}

#[tokio::test]
async fn test_typed_lists() -> Result<()> {
	let server = server()?;
	assert_eq!(server.get_strings().await?.as_list(), [HELLO, WORLD]);
	assert_eq!(server.get_booleans().await?.as_list(), [false, true]);
	assert_eq!(server.get_doubles().await?.as_list(), [1.1, 2.2]);
	assert_eq!(server.get_integers().await?.as_list(), [1, 2]);
	assert_eq!(server.get_longs().await?.into_vec(), vec![1i64, 2]);
	Ok(())
}

#[tokio::test]
async fn test_json_value_results() -> Result<()> {
	let server = server()?;
	assert_eq!(server.return_json_value_string(HELLO.into()).await?, json!(HELLO));
	assert_eq!(server.return_json_value_boolean(true).await?, json!(true));
	assert_eq!(server.return_json_value_int(42).await?.as_f64(), Some(42.0));
	assert_eq!(server.return_json_value_double(42.1).await?.as_f64(), Some(42.1));
	assert_eq!(server.return_json_value_null().await?, Value::Null);
	Ok(())
}

#[tokio::test]
async fn test_json_array_results() -> Result<()> {
	let server = server()?;
	assert_eq!(server.return_json_value_string_array(HELLO.into(), WORLD.into()).await?, json!([HELLO, WORLD]));
	assert_eq!(server.return_json_value_boolean_array(true, false).await?, json!([true, false]));
	assert_eq!(server.return_json_value_int_array(24, 42).await?, json!([24, 42]));

	let doubles = server.return_json_value_double_array(24.1, 42.1).await?;
	assert_eq!(doubles.as_array().map(|a| a.iter().filter_map(Value::as_f64).collect::<Vec<_>>()), Some(vec![24.1, 42.1]));

	assert_eq!(server.return_json_value_null_array().await?, json!([null, null]));
	Ok(())
}

#[tokio::test]
async fn test_json_value_arguments() -> Result<()> {
	let server = server()?;
	for (value, expected) in [
		(json!(HELLO), "STRING"),
		(json!(true), "BOOLEAN"),
		(json!(42), "NUMBER"),
		(Value::Null, "NULL"),
		(json!([]), "ARRAY"),
		(json!({"k": 1}), "OBJECT"),
	] {
		assert_eq!(server.test_json_value(value).await?, expected);
	}
	Ok(())
}

#[tokio::test]
async fn test_json_objects_cross_stringified() -> Result<()> {
	let server = server()?;
	assert_eq!(server.return_json_value_json_object("key".into(), "hello".into()).await?, json!({"key": "hello"}));

	let obj = server.return_json_object("key".into(), "hello".into()).await?;
	assert_eq!(obj.get("key"), Some(&json!("hello")));

	let mut arg = Map::new();
	arg.insert("nested".into(), json!({"a": [1, 2]}));
	assert_eq!(server.read_json_object(arg, "nested".into()).await?, json!({"a": [1, 2]}));
	Ok(())
}

#[tokio::test]
async fn test_inherited_script_properties_are_not_callables() -> Result<()> {
	let err = server()?.is_prototype_of("x".into()).await.unwrap_err();
	assert!(err.to_string().contains("Method is not published"), "{err}");
	Ok(())
}

#[tokio::test]
async fn test_choke_point_applies_timeout() -> Result<()> {
	let (browser, client) = tbrpc_harness::open(ROUTE);
	client.set_script_timeout_ms(1234);
	let server: IntegrationViewCallablesProxy = client.proxy()?;
	server.test_callable_success().await?;
	assert_eq!(browser.script_timeout(), tbrpc::ScriptTimeout::from_millis(1234));

	client.set_script_timeout_ms(-1);
	server.test_callable_success().await?;
	assert_eq!(browser.script_timeout(), tbrpc::ScriptTimeout::Unbounded);
	Ok(())
}

#[tokio::test]
async fn test_same_view_through_call() -> Result<()> {
	let (_browser, client) = tbrpc_harness::open(RMI_ROUTE);
	let simple: IntegrationViewCallablesProxy = client.proxy()?;
	let rmi: IntegrationViewRmiCallablesProxy = client.proxy()?;

	assert_eq!(simple.concat_world(HELLO.into()).await?, HELLO_WORLD);
	assert_eq!(rmi.concat_world(HELLO.into()).await?, HELLO_WORLD);
	assert_eq!(rmi.return_42_integer_primitive().await?, 42);
	assert!(rmi.test_foo_enum(TestEnum::Foo).await?);
	rmi.test_callable_success().await?;
	assert_eq!(rmi.proxy().mode(), tbrpc::CallMode::Rmi);
	Ok(())
}

#[interface]
trait SlowCallables {
	async fn slow(&self) -> tbrpc::Result<()>;
}

#[tokio::test]
async fn test_call_exceeding_timeout_fails() -> Result<()> {
	tbrpc_harness::init_tracing();
	let app = Application::default().route("slow", || {
		tbrpc_runtime::View::builder("slow")
			.publish("slow", || {
				std::thread::sleep(Duration::from_millis(300));
				Ok(())
			})
			.build()
	});
	let browser = SimulatedBrowser::open(app, "slow");
	let client = RpcClient::new(browser);
	client.set_script_timeout_ms(20);

	let server: SlowCallablesProxy = client.proxy()?;
	let err = server.slow().await.unwrap_err();
	assert!(err.is_timeout(), "{err}");
	assert_eq!(err.to_string(), "slow() RPC call failed: Timed out after 20ms waiting for script result");
	Ok(())
}
