//! The browser-side half of a call.
//!
//! One fixed async script serves every call. It receives the callable name,
//! the argument array and a parallel array of raw flags: non-raw arguments are
//! JSON objects sent as text, because the automation channel only preserves
//! scalar and array shapes.

use std::sync::LazyLock;

use serde_json::{Map, Value};

/// Reported when no element on the page has a server binding.
pub const VIEW_NOT_FOUND: &str = "Could not find view. Check that the view publishes client callables";

/// Reported when the binding has no callable of the requested name.
pub const NOT_PUBLISHED: &str = "Method is not published. Check that the method exists and is published as a client callable";

static CALL_SCRIPT: LazyLock<String> = LazyLock::new(|| {
	format!(
		concat!(
			"var callback = arguments[3];",
			"var view = [].slice.call(document.body.children)",
			"   .concat([].slice.call(document.querySelectorAll('body > #outlet > * > *')))",
			"   .find(e=>e.$server);",
			"if (!view) return callback({{message:'{view_not_found}'}}), 0;",
			"var own = Object.prototype.hasOwnProperty.call(view.$server, arguments[0]);",
			"var callable = own ? view.$server[arguments[0]] : undefined;",
			"if (typeof callable !== 'function') return callback({{message:'{not_published}'}}), 0;",
			"var raw = arguments[2];",
			"arguments[1] = arguments[1].map((arg,i)=>raw[i]?arg:JSON.parse(arg));",
			"callable.call(view.$server, ...arguments[1])",
			" .then(result=>callback({{result}}))",
			" .catch(e=>callback({{message : e.message || ''}}));",
		),
		view_not_found = VIEW_NOT_FOUND,
		not_published = NOT_PUBLISHED,
	)
});

/// Source of the call script.
pub fn call_script() -> &'static str {
	&CALL_SCRIPT
}

/// Positional arguments of one call script run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptCall {
	pub callable: String,
	pub arguments: Vec<Value>,
	pub raw: Vec<bool>,
}

impl ScriptCall {
	/// Prepares `arguments` for the channel, stringifying JSON objects.
	pub fn new(callable: impl Into<String>, arguments: Vec<Value>) -> Self {
		let (arguments, raw) = arguments
			.into_iter()
			.map(|arg| match arg {
				Value::Object(object) => (Value::String(Value::Object(object).to_string()), false),
				other => (other, true),
			})
			.unzip();
		Self {
			callable: callable.into(),
			arguments,
			raw,
		}
	}

	pub fn into_script_args(self) -> Vec<Value> {
		vec![
			Value::String(self.callable),
			Value::Array(self.arguments),
			Value::Array(self.raw.into_iter().map(Value::Bool).collect()),
		]
	}

	/// Reads back the positional arguments the script was given.
	pub fn from_script_args(args: &[Value]) -> Option<Self> {
		let [Value::String(callable), Value::Array(arguments), Value::Array(raw), ..] = args else {
			return None;
		};
		let raw = raw.iter().map(Value::as_bool).collect::<Option<Vec<_>>>()?;
		(raw.len() == arguments.len()).then(|| Self {
			callable: callable.clone(),
			arguments: arguments.clone(),
			raw,
		})
	}

	/// Arguments as the callable sees them, with objects parsed back.
	pub fn rehydrate(self) -> Result<Vec<Value>, serde_json::Error> {
		self.arguments
			.into_iter()
			.zip(self.raw)
			.map(|(arg, raw)| match (raw, arg) {
				(true, arg) => Ok(arg),
				(false, Value::String(text)) => serde_json::from_str(&text),
				(false, other) => Ok(other),
			})
			.collect()
	}
}

/// Callback payload for a successful call.
pub fn success(result: Value) -> Value {
	let mut object = Map::new();
	object.insert("result".into(), result);
	Value::Object(object)
}

/// Callback payload for a failed call.
pub fn failure(message: impl Into<String>) -> Value {
	let mut object = Map::new();
	object.insert("message".into(), Value::String(message.into()));
	Value::Object(object)
}

/// Splits a callback payload into the result or the failure message.
pub fn outcome(payload: Value) -> Result<Value, Option<String>> {
	match payload {
		Value::Object(mut object) => match object.remove("result") {
			Some(result) => Ok(result),
			None => Err(object.remove("message").and_then(|m| m.as_str().map(str::to_string))),
		},
		_ => Err(None),
	}
}
