//! Views and their published callables.
//!
//! A published callable takes the positional JSON arguments the browser
//! passes and produces one JSON value or a [`Throwable`]. Typed handlers are
//! adapted through [`ClientCallable`], so views are written against ordinary
//! Rust types.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tbrpc_protocol::constants::RMI_CALL;
use tbrpc_protocol::{Marshal, Throwable};

use crate::dispatch::RemoteDispatcher;

/// Type-erased published callable.
pub type Callable = Arc<dyn Fn(Vec<Value>) -> Result<Value, Throwable> + Send + Sync>;

/// A page's server-side view.
pub struct View {
	route: String,
	callables: HashMap<String, Callable>,
	dispatcher: Option<Arc<RemoteDispatcher>>,
}

impl View {
	pub fn builder(route: impl Into<String>) -> ViewBuilder {
		ViewBuilder {
			route: route.into(),
			callables: HashMap::new(),
			dispatcher: None,
		}
	}

	pub fn route(&self) -> &str {
		&self.route
	}

	/// Whether the browser sees a server binding on this view's element.
	///
	/// Only views that publish something get one.
	pub fn has_server_binding(&self) -> bool {
		!self.callables.is_empty()
	}

	pub fn callable(&self, name: &str) -> Option<&Callable> {
		self.callables.get(name)
	}

	pub fn callable_names(&self) -> impl Iterator<Item = &str> {
		self.callables.keys().map(String::as_str)
	}

	/// The dispatcher behind `$call`, if this view is reference-capable.
	pub fn dispatcher(&self) -> Option<&Arc<RemoteDispatcher>> {
		self.dispatcher.as_ref()
	}
}

impl fmt::Debug for View {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut names: Vec<_> = self.callable_names().collect();
		names.sort_unstable();
		f.debug_struct("View")
			.field("route", &self.route)
			.field("callables", &names)
			.field("rmi", &self.dispatcher.is_some())
			.finish()
	}
}

pub struct ViewBuilder {
	route: String,
	callables: HashMap<String, Callable>,
	dispatcher: Option<Arc<RemoteDispatcher>>,
}

impl ViewBuilder {
	/// Publishes `handler` under `name`. A later publish of the same name wins.
	pub fn publish<Args, H>(mut self, name: impl Into<String>, handler: H) -> Self
	where
		H: ClientCallable<Args>,
	{
		let handler = Arc::new(handler);
		self.callables
			.insert(name.into(), Arc::new(move |args: Vec<Value>| handler.call(args)));
		self
	}

	/// Makes the view reference-capable by publishing `$call`.
	pub fn rmi(mut self, dispatcher: RemoteDispatcher) -> Self {
		let dispatcher = Arc::new(dispatcher);
		let target = dispatcher.clone();
		self.callables.insert(
			RMI_CALL.to_string(),
			Arc::new(move |args: Vec<Value>| {
				let invocation = args.into_iter().next().unwrap_or(Value::Null);
				Ok(target.call(&invocation))
			}),
		);
		self.dispatcher = Some(dispatcher);
		self
	}

	pub fn build(self) -> View {
		View {
			route: self.route,
			callables: self.callables,
			dispatcher: self.dispatcher,
		}
	}
}

/// A typed handler usable as a published callable.
///
/// Implemented for `Fn(A1, .., An) -> Result<R, Throwable>` where every
/// argument and the result are [`Marshal`] over JSON.
pub trait ClientCallable<Args>: Send + Sync + 'static {
	fn call(&self, args: Vec<Value>) -> Result<Value, Throwable>;
}

macro_rules! callable_arity {
	($count:expr; $($ty:ident $var:ident),*) => {
		impl<F, R, $($ty,)*> ClientCallable<($($ty,)*)> for F
		where
			F: Fn($($ty),*) -> Result<R, Throwable> + Send + Sync + 'static,
			R: Marshal,
			$($ty: Marshal,)*
		{
			#[allow(unused_mut, unused_variables)]
			fn call(&self, args: Vec<Value>) -> Result<Value, Throwable> {
				if args.len() != $count {
					return Err(Throwable::new(
						"IllegalArgumentException",
						format!("expected {} arguments, got {}", $count, args.len()),
					));
				}
				let mut args = args.into_iter();
				$(
					let $var = <$ty as Marshal>::from_json(args.next().unwrap_or(Value::Null)).map_err(Throwable::from)?;
				)*
				(self)($($var),*)?.into_json().map_err(Throwable::from)
			}
		}
	};
}

callable_arity!(0;);
callable_arity!(1; A1 a1);
callable_arity!(2; A1 a1, A2 a2);
callable_arity!(3; A1 a1, A2 a2, A3 a3);
callable_arity!(4; A1 a1, A2 a2, A3 a3, A4 a4);
callable_arity!(5; A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
callable_arity!(6; A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6);

#[cfg(test)]
mod tests {
	use serde_json::json;
	use tbrpc_protocol::RemoteObject;

	use super::*;
	use crate::class::{ClassTable, RemoteClass};

	#[test]
	fn view_without_callables_has_no_binding() {
		let view = View::builder("no-callables").build();
		assert!(!view.has_server_binding());
		assert!(view.callable("anything").is_none());
		assert!(view.dispatcher().is_none());
	}

	#[test]
	fn typed_callables_convert_json() {
		let view = View::builder("it")
			.publish("concatWorld", |arg: String| Ok(arg + "World"))
			.publish("return42", || Ok(42i32))
			.build();
		assert!(view.has_server_binding());

		let concat = view.callable("concatWorld").unwrap();
		assert_eq!(concat(vec![json!("Hello ")]).unwrap(), json!("Hello World"));

		let answer = view.callable("return42").unwrap();
		assert_eq!(answer(vec![]).unwrap(), json!(42));
	}

	#[test]
	fn bad_arguments_surface_as_throwables() {
		let view = View::builder("it").publish("half", |n: i32| Ok(n / 2)).build();
		let half = view.callable("half").unwrap();

		let err = half(vec![json!(1), json!(2)]).unwrap_err();
		assert_eq!(err.class, "IllegalArgumentException");

		let err = half(vec![json!(5_000_000_000i64)]).unwrap_err();
		assert!(err.message.as_deref().unwrap_or_default().contains("out of int range"), "{err}");
	}

	#[test]
	fn handler_errors_pass_through() {
		let view = View::builder("it")
			.publish("fail", || -> Result<(), Throwable> { Err(Throwable::new("IllegalStateException", "nope")) })
			.build();
		let err = view.callable("fail").unwrap()(vec![]).unwrap_err();
		assert_eq!(err.to_string(), "IllegalStateException: nope");
	}

	struct Rmi;
	impl RemoteObject for Rmi {}

	#[test]
	fn rmi_publishes_call() {
		let classes = ClassTable::new().with(RemoteClass::builder::<Rmi>("Rmi").method("ping", |_: &Rmi| Ok(true)).build());
		let dispatcher = RemoteDispatcher::new(Arc::new(Rmi), classes).unwrap();
		let view = View::builder("rmi").rmi(dispatcher).build();

		let call = view.callable(RMI_CALL).unwrap();
		let response = call(vec![json!({"methodName": "ping", "methodSignature": []})]).unwrap();
		assert_eq!(response, json!(true));
		assert!(view.dispatcher().is_some());
	}
}
