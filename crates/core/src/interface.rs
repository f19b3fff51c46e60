//! Declared interfaces, as the proxy sees them.

use tbrpc_protocol::TypeDesc;

use crate::proxy::Proxy;

/// Calling capability an interface declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
	/// Methods are published callables on the view.
	Simple,
	/// Methods are resolved by the view's remote dispatcher.
	Rmi,
	/// A remote object type; only reachable through stubs.
	Remote,
}

impl InterfaceKind {
	pub fn is_reference_capable(self) -> bool {
		!matches!(self, Self::Simple)
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
	/// Name on the wire.
	pub name: &'static str,
	pub arguments: Vec<TypeDesc>,
	pub returns: TypeDesc,
}

impl MethodDecl {
	pub fn new(name: &'static str, arguments: Vec<TypeDesc>, returns: TypeDesc) -> Self {
		Self { name, arguments, returns }
	}

	/// Parameter type names as sent in an invocation.
	pub fn signature(&self) -> Vec<String> {
		self.arguments.iter().map(TypeDesc::signature_name).collect()
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interface {
	pub name: &'static str,
	pub kind: InterfaceKind,
	pub methods: Vec<MethodDecl>,
}

impl Interface {
	pub fn new(name: &'static str, kind: InterfaceKind) -> Self {
		Self {
			name,
			kind,
			methods: Vec::new(),
		}
	}

	pub fn method(mut self, method: MethodDecl) -> Self {
		self.methods.push(method);
		self
	}
}

/// Implemented by generated proxies and stubs.
pub trait Callables: Sized {
	fn interface() -> Interface;

	/// Wraps an already validated proxy.
	fn from_proxy(proxy: Proxy) -> Self;
}
