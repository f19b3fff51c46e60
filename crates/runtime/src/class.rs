//! Remote classes and their method tables.
//!
//! A [`RemoteClass`] is built once from typed closures. Each method is keyed by
//! its name and the signature type names of its parameters, exactly as a client
//! sends them in an invocation, so resolving a call is a single map lookup.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::Arc;

use tbrpc_protocol::constants::STUB_REPLACEMENT;
use tbrpc_protocol::{CastError, Marshal, Primitive, RemoteObject, Serial, Throwable, TypeDesc};

/// Lookup key of a method: name plus parameter type names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodKey {
	pub name: String,
	pub signature: Vec<String>,
}

impl MethodKey {
	pub fn new(name: impl Into<String>, signature: Vec<String>) -> Self {
		Self {
			name: name.into(),
			signature,
		}
	}
}

/// Why a resolved method did not produce a value.
#[derive(Debug)]
pub enum InvokeError {
	/// An argument did not convert to the parameter type.
	Arguments(CastError),
	/// Wrong number of arguments.
	Arity { expected: usize, found: usize },
	/// The receiver is not an instance of the method's class.
	Receiver { class: String },
	/// The method itself failed.
	Thrown(Throwable),
	/// The returned value has no serial form.
	Result(CastError),
}

type Invoker = Arc<dyn Fn(&dyn RemoteObject, Vec<Serial>) -> Result<Serial, InvokeError> + Send + Sync>;

/// A server class reachable through the reference-capable protocol.
pub struct RemoteClass {
	name: String,
	type_id: TypeId,
	interfaces: Vec<String>,
	methods: HashMap<MethodKey, Invoker>,
}

impl RemoteClass {
	pub fn builder<T: RemoteObject>(name: impl Into<String>) -> RemoteClassBuilder<T> {
		RemoteClassBuilder {
			name: name.into(),
			interfaces: Vec::new(),
			methods: HashMap::new(),
			_marker: PhantomData,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Remote interfaces implemented by instances.
	pub fn interfaces(&self) -> &[String] {
		&self.interfaces
	}

	/// Checked cast: whether `object` is an instance of this class.
	pub fn is_instance(&self, object: &dyn RemoteObject) -> bool {
		object.concrete_type_id() == self.type_id
	}

	pub fn has_method(&self, key: &MethodKey) -> bool {
		self.methods.contains_key(key)
	}

	/// Invokes a method on `this`. Panics in the method body propagate.
	pub fn invoke(&self, key: &MethodKey, this: &dyn RemoteObject, args: Vec<Serial>) -> Option<Result<Serial, InvokeError>> {
		self.methods.get(key).map(|invoker| invoker(this, args))
	}
}

/// Builder for a [`RemoteClass`] whose instances are `T`.
pub struct RemoteClassBuilder<T> {
	name: String,
	interfaces: Vec<String>,
	methods: HashMap<MethodKey, Invoker>,
	_marker: PhantomData<fn() -> T>,
}

impl<T: RemoteObject> RemoteClassBuilder<T> {
	/// Declares a remote interface of the class.
	pub fn implements(mut self, interface: impl Into<String>) -> Self {
		self.interfaces.push(interface.into());
		self
	}

	/// Adds a method. Overloads share a name and differ by signature.
	pub fn method<Args, H>(mut self, name: impl Into<String>, handler: H) -> Self
	where
		H: Method<T, Args>,
	{
		let key = MethodKey::new(name, H::signature());
		let class = self.name.clone();
		let invoker: Invoker = Arc::new(move |this: &dyn RemoteObject, args: Vec<Serial>| {
			let this = this.downcast_ref::<T>().ok_or_else(|| InvokeError::Receiver { class: class.clone() })?;
			handler.invoke(this, args)
		});
		self.methods.insert(key, invoker);
		self
	}

	pub fn build(self) -> RemoteClass {
		RemoteClass {
			name: self.name,
			type_id: TypeId::of::<T>(),
			interfaces: self.interfaces,
			methods: self.methods,
		}
	}
}

/// A closure usable as a remote method on receivers of type `T`.
///
/// Implemented for `Fn(&T, A1, .., An) -> Result<R, Throwable>` where every
/// argument and the result are [`Marshal`].
pub trait Method<T, Args>: Send + Sync + 'static {
	fn signature() -> Vec<String>;

	fn invoke(&self, this: &T, args: Vec<Serial>) -> Result<Serial, InvokeError>;
}

macro_rules! method_arity {
	($count:expr; $($ty:ident $var:ident),*) => {
		impl<T, F, R, $($ty,)*> Method<T, ($($ty,)*)> for F
		where
			F: Fn(&T, $($ty),*) -> Result<R, Throwable> + Send + Sync + 'static,
			R: Marshal,
			$($ty: Marshal,)*
		{
			fn signature() -> Vec<String> {
				vec![$(<$ty as Marshal>::describe().signature_name()),*]
			}

			#[allow(unused_mut, unused_variables)]
			fn invoke(&self, this: &T, args: Vec<Serial>) -> Result<Serial, InvokeError> {
				if args.len() != $count {
					return Err(InvokeError::Arity {
						expected: $count,
						found: args.len(),
					});
				}
				let mut args = args.into_iter();
				$(
					let $var = <$ty as Marshal>::from_serial(args.next().unwrap_or(Serial::Null))
						.map_err(InvokeError::Arguments)?;
				)*
				let result = (self)(this, $($var),*).map_err(InvokeError::Thrown)?;
				result.into_serial().map_err(InvokeError::Result)
			}
		}
	};
}

method_arity!(0;);
method_arity!(1; A1 a1);
method_arity!(2; A1 a1, A2 a2);
method_arity!(3; A1 a1, A2 a2, A3 a3);
method_arity!(4; A1 a1, A2 a2, A3 a3, A4 a4);
method_arity!(5; A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
method_arity!(6; A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6);

/// All remote classes a view can reach, by name and by concrete type.
#[derive(Default)]
pub struct ClassTable {
	by_name: HashMap<String, Arc<RemoteClass>>,
	by_type: HashMap<TypeId, Arc<RemoteClass>>,
	known_types: HashSet<String>,
}

impl ClassTable {
	pub fn new() -> Self {
		let mut known_types: HashSet<String> = Primitive::ALL
			.into_iter()
			.flat_map(|p| [p.keyword().to_string(), p.boxed_name().to_string()])
			.collect();
		for builtin in [
			TypeDesc::String,
			TypeDesc::JsonValue,
			TypeDesc::JsonObject,
			<Serial as Marshal>::describe(),
			<Throwable as Marshal>::describe(),
		] {
			known_types.insert(builtin.signature_name());
		}
		known_types.insert(STUB_REPLACEMENT.to_string());
		Self {
			known_types,
			..Self::default()
		}
	}

	pub fn with(mut self, class: RemoteClass) -> Self {
		self.register(class);
		self
	}

	pub fn register(&mut self, class: RemoteClass) {
		self.known_types.insert(class.name.clone());
		for key in class.methods.keys() {
			self.known_types.extend(key.signature.iter().cloned());
		}
		let class = Arc::new(class);
		self.by_type.insert(class.type_id, class.clone());
		self.by_name.insert(class.name.clone(), class);
	}

	pub fn by_name(&self, name: &str) -> Option<&Arc<RemoteClass>> {
		self.by_name.get(name)
	}

	/// Class of a live object.
	pub fn class_of(&self, object: &dyn RemoteObject) -> Option<&Arc<RemoteClass>> {
		self.by_type.get(&object.concrete_type_id())
	}

	/// Whether a signature type name denotes a type this table knows.
	pub fn resolves_type(&self, name: &str) -> bool {
		match name.strip_suffix("[]") {
			Some(component) => self.resolves_type(component),
			None => self.known_types.contains(name),
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicI64, Ordering};

	use super::*;

	#[derive(Default)]
	struct Counter {
		count: AtomicI64,
	}
	impl RemoteObject for Counter {}

	struct Other;
	impl RemoteObject for Other {}

	fn counter_class() -> RemoteClass {
		RemoteClass::builder::<Counter>("Counter")
			.implements("ICounter")
			.method("getCount", |c: &Counter| Ok(c.count.load(Ordering::SeqCst)))
			.method("setCount", |c: &Counter, n: i64| {
				c.count.store(n, Ordering::SeqCst);
				Ok(())
			})
			.method("add", |_: &Counter, a: i32, b: i32| Ok(a + b))
			.method("add", |_: &Counter, a: f64, b: f64| Ok(a + b))
			.build()
	}

	#[test]
	fn test_methods_keyed_by_signature() {
		let class = counter_class();
		assert!(class.has_method(&MethodKey::new("add", vec!["int".into(), "int".into()])));
		assert!(class.has_method(&MethodKey::new("add", vec!["double".into(), "double".into()])));
		assert!(!class.has_method(&MethodKey::new("add", vec!["long".into(), "long".into()])));
		assert!(class.has_method(&MethodKey::new("setCount", vec!["long".into()])));
	}

	#[test]
	fn test_overloads_dispatch_separately() {
		let class = counter_class();
		let counter = Counter::default();
		let ints = MethodKey::new("add", vec!["int".into(), "int".into()]);
		let doubles = MethodKey::new("add", vec!["double".into(), "double".into()]);

		let sum = class.invoke(&ints, &counter, vec![Serial::Int(2), Serial::Int(3)]).unwrap().unwrap();
		assert_eq!(sum, Serial::Int(5));
		let sum = class
			.invoke(&doubles, &counter, vec![Serial::Double(0.5), Serial::Double(0.25)])
			.unwrap()
			.unwrap();
		assert_eq!(sum, Serial::Double(0.75));
	}

	#[test]
	fn test_state_is_shared_through_receiver() {
		let class = counter_class();
		let counter = Counter::default();
		class
			.invoke(&MethodKey::new("setCount", vec!["long".into()]), &counter, vec![Serial::Long(42)])
			.unwrap()
			.unwrap();
		let count = class.invoke(&MethodKey::new("getCount", vec![]), &counter, vec![]).unwrap().unwrap();
		assert_eq!(count, Serial::Long(42));
	}

	#[test]
	fn test_wrong_receiver_is_reported() {
		let class = counter_class();
		let result = class.invoke(&MethodKey::new("getCount", vec![]), &Other, vec![]).unwrap();
		assert!(matches!(result, Err(InvokeError::Receiver { .. })));
		assert!(!class.is_instance(&Other));
		assert!(class.is_instance(&Counter::default()));
	}

	#[test]
	fn test_bad_arguments_are_reported() {
		let class = counter_class();
		let key = MethodKey::new("setCount", vec!["long".into()]);
		let counter = Counter::default();
		let result = class.invoke(&key, &counter, vec![Serial::String("x".into())]).unwrap();
		assert!(matches!(result, Err(InvokeError::Arguments(_))));
		let result = class.invoke(&key, &counter, vec![]).unwrap();
		assert!(matches!(result, Err(InvokeError::Arity { expected: 1, found: 0 })));
	}

	#[test]
	fn test_table_resolves_types() {
		let table = ClassTable::new().with(counter_class());
		assert!(table.resolves_type("int"));
		assert!(table.resolves_type("Integer"));
		assert!(table.resolves_type("RmiStubReplacement"));
		assert!(table.resolves_type("Counter"));
		assert!(table.resolves_type("String[]"));
		assert!(!table.resolves_type("java.lang.Thread"));
		assert!(table.class_of(&Counter::default()).is_some());
		assert!(table.class_of(&Other).is_none());
	}
}
