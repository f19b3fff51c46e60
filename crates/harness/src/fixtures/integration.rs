//! Simple-protocol view publishing plain callables.

use std::sync::Arc;

use serde_json::{Map, Value, json};
use tbrpc::{JsonArrayList, interface};
use tbrpc_protocol::{Marshal, Throwable};
use tbrpc_runtime::{ClassTable, RemoteClass, View, ViewBuilder};

pub const ROUTE: &str = "it";
/// Same callables, plus `$call`.
pub const RMI_ROUTE: &str = "it/rmi2";

pub const HELLO: &str = "Hello ";
pub const WORLD: &str = "World";
pub const HELLO_WORLD: &str = "Hello World";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Marshal)]
pub enum TestEnum {
	Foo,
	Bar,
}

#[interface]
pub trait IntegrationViewCallables {
	async fn test_callable_success(&self) -> tbrpc::Result<()>;
	async fn test_callable_failure(&self) -> tbrpc::Result<()>;
	async fn negate(&self, arg: bool) -> tbrpc::Result<bool>;
	async fn concat_world(&self, arg: String) -> tbrpc::Result<String>;
	async fn return_true(&self) -> tbrpc::Result<bool>;

	#[rpc(name = "return42IntegerPrimitive")]
	async fn return_42_integer_primitive(&self) -> tbrpc::Result<i32>;
	#[rpc(name = "return42DoublePrimitive")]
	async fn return_42_double_primitive(&self) -> tbrpc::Result<f64>;
	#[rpc(name = "return42Integer")]
	async fn return_42_integer(&self) -> tbrpc::Result<Option<i32>>;
	#[rpc(name = "return42Double")]
	async fn return_42_double(&self) -> tbrpc::Result<Option<f64>>;

	async fn return_hello_world(&self) -> tbrpc::Result<String>;
	async fn test_foo_enum(&self, e: TestEnum) -> tbrpc::Result<bool>;

	async fn get_doubles(&self) -> tbrpc::Result<JsonArrayList<f64>>;
	async fn get_booleans(&self) -> tbrpc::Result<JsonArrayList<bool>>;
	async fn get_strings(&self) -> tbrpc::Result<JsonArrayList<String>>;
	async fn get_integers(&self) -> tbrpc::Result<JsonArrayList<i32>>;
	async fn get_longs(&self) -> tbrpc::Result<JsonArrayList<i64>>;

	async fn return_json_value_boolean(&self, arg: bool) -> tbrpc::Result<Value>;
	async fn return_json_value_int(&self, arg: i32) -> tbrpc::Result<Value>;
	async fn return_json_value_double(&self, arg: f64) -> tbrpc::Result<Value>;
	async fn return_json_value_string(&self, arg: String) -> tbrpc::Result<Value>;
	async fn return_json_value_null(&self) -> tbrpc::Result<Value>;
	async fn return_json_value_boolean_array(&self, arg1: bool, arg2: bool) -> tbrpc::Result<Value>;
	async fn return_json_value_int_array(&self, arg1: i32, arg2: i32) -> tbrpc::Result<Value>;
	async fn return_json_value_double_array(&self, arg1: f64, arg2: f64) -> tbrpc::Result<Value>;
	async fn return_json_value_string_array(&self, arg1: String, arg2: String) -> tbrpc::Result<Value>;
	async fn return_json_value_null_array(&self) -> tbrpc::Result<Value>;
	async fn return_json_value_json_object(&self, key: String, value: String) -> tbrpc::Result<Value>;
	async fn return_json_object(&self, key: String, value: String) -> tbrpc::Result<Map<String, Value>>;
	async fn read_json_object(&self, obj: Map<String, Value>, key: String) -> tbrpc::Result<Value>;
	async fn test_json_value(&self, value: Value) -> tbrpc::Result<String>;

	/// Inherited by every script object; never published.
	async fn is_prototype_of(&self, value: String) -> tbrpc::Result<bool>;
}

/// A few of the same methods, reached through `$call`.
#[interface(rmi)]
pub trait IntegrationViewRmiCallables {
	async fn test_callable_success(&self) -> tbrpc::Result<()>;
	async fn concat_world(&self, arg: String) -> tbrpc::Result<String>;
	#[rpc(name = "return42IntegerPrimitive")]
	async fn return_42_integer_primitive(&self) -> tbrpc::Result<i32>;
	async fn test_foo_enum(&self, e: TestEnum) -> tbrpc::Result<bool>;
}

/// Name of a JSON value's type, upper-cased.
pub fn json_type(value: &Value) -> &'static str {
	match value {
		Value::Null => "NULL",
		Value::Bool(_) => "BOOLEAN",
		Value::Number(_) => "NUMBER",
		Value::String(_) => "STRING",
		Value::Array(_) => "ARRAY",
		Value::Object(_) => "OBJECT",
	}
}

fn object(key: String, value: String) -> Map<String, Value> {
	let mut obj = Map::new();
	obj.insert(key, Value::String(value));
	obj
}

fn publish_all(builder: ViewBuilder) -> ViewBuilder {
	builder
		.publish("testCallableSuccess", || Ok(()))
		.publish("testCallableFailure", || -> Result<(), Throwable> { Err(Throwable::bare("RuntimeException")) })
		.publish("negate", |arg: bool| Ok(!arg))
		.publish("concatWorld", |arg: String| Ok(arg + WORLD))
		.publish("returnTrue", || Ok(true))
		.publish("return42IntegerPrimitive", || Ok(42i32))
		.publish("return42DoublePrimitive", || Ok(42f64))
		.publish("return42Integer", || Ok(Some(42i32)))
		.publish("return42Double", || Ok(Some(42f64)))
		.publish("returnHelloWorld", || Ok(HELLO_WORLD.to_string()))
		.publish("testFooEnum", |e: TestEnum| Ok(e == TestEnum::Foo))
		.publish("getDoubles", || Ok(vec![1.1f64, 2.2]))
		.publish("getBooleans", || Ok(vec![false, true]))
		.publish("getStrings", || Ok(vec![HELLO.to_string(), WORLD.to_string()]))
		.publish("getIntegers", || Ok(vec![1i32, 2]))
		.publish("getLongs", || Ok(vec![1i64, 2]))
		.publish("returnJsonValueBoolean", |arg: bool| Ok(json!(arg)))
		.publish("returnJsonValueInt", |arg: i32| Ok(json!(arg)))
		.publish("returnJsonValueDouble", |arg: f64| Ok(json!(arg)))
		.publish("returnJsonValueString", |arg: String| Ok(json!(arg)))
		.publish("returnJsonValueNull", || Ok(Value::Null))
		.publish("returnJsonValueBooleanArray", |a: bool, b: bool| Ok(json!([a, b])))
		.publish("returnJsonValueIntArray", |a: i32, b: i32| Ok(json!([a, b])))
		.publish("returnJsonValueDoubleArray", |a: f64, b: f64| Ok(json!([a, b])))
		.publish("returnJsonValueStringArray", |a: String, b: String| Ok(json!([a, b])))
		.publish("returnJsonValueNullArray", || Ok(json!([null, null])))
		.publish("returnJsonValueJsonObject", |key: String, value: String| Ok(Value::Object(object(key, value))))
		.publish("returnJsonObject", |key: String, value: String| Ok(object(key, value)))
		.publish("readJsonObject", |obj: Map<String, Value>, key: String| {
			Ok(obj.get(&key).cloned().unwrap_or(Value::Null))
		})
		.publish("testJsonValue", |value: Value| Ok(json_type(&value).to_string()))
}

pub fn view() -> View {
	publish_all(View::builder(ROUTE)).build()
}

struct IntegrationViewRmi;

impl tbrpc_protocol::RemoteObject for IntegrationViewRmi {}

pub fn rmi_view() -> View {
	let class = RemoteClass::builder::<IntegrationViewRmi>("IntegrationViewRmi")
		.method("testCallableSuccess", |_: &IntegrationViewRmi| Ok(()))
		.method("concatWorld", |_: &IntegrationViewRmi, arg: String| Ok(arg + WORLD))
		.method("return42IntegerPrimitive", |_: &IntegrationViewRmi| Ok(42i32))
		.method("testFooEnum", |_: &IntegrationViewRmi, e: TestEnum| Ok(e == TestEnum::Foo))
		.build();
	super::bind_rmi(publish_all(View::builder(RMI_ROUTE)), Arc::new(IntegrationViewRmi), ClassTable::new().with(class))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_json_type_names() {
		assert_eq!(json_type(&json!("x")), "STRING");
		assert_eq!(json_type(&json!([])), "ARRAY");
		assert_eq!(json_type(&Value::Null), "NULL");
	}

	#[test]
	fn test_enum_travels_by_constant_name() {
		assert_eq!(TestEnum::Foo.into_json().unwrap(), json!("Foo"));
		assert_eq!(TestEnum::from_json(json!("Bar")).unwrap(), TestEnum::Bar);
		let err = TestEnum::from_json(json!("Baz")).unwrap_err();
		assert_eq!(err.to_string(), "No constant Baz in TestEnum");
	}

	#[test]
	fn test_views_publish_callables() {
		let simple = view();
		assert!(simple.callable("concatWorld").is_some());
		assert!(simple.dispatcher().is_none());

		let rmi = rmi_view();
		assert!(rmi.callable("concatWorld").is_some());
		assert!(rmi.callable("$call").is_some());
	}
}
