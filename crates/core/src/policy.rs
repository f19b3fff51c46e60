//! Which declared types each call mode can carry.
//!
//! Proxies are checked once, when they are created, so an unsupported
//! signature fails before anything reaches the browser.

use tbrpc_protocol::{Primitive, TypeDesc};

use crate::error::IllegalSignature;
use crate::interface::{Interface, MethodDecl};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
	Simple,
	Rmi,
}

pub fn check_interface(interface: &Interface, mode: CallMode) -> Result<(), IllegalSignature> {
	interface.methods.iter().try_for_each(|method| check_method(method, mode))
}

pub fn check_method(method: &MethodDecl, mode: CallMode) -> Result<(), IllegalSignature> {
	let error = |ty: &TypeDesc, argument: bool| {
		let method = method.name.to_string();
		let ty = ty.to_string();
		match (mode, argument) {
			(CallMode::Simple, true) => IllegalSignature::Argument { method, ty },
			(CallMode::Simple, false) => IllegalSignature::Return { method, ty },
			(CallMode::Rmi, true) => IllegalSignature::RmiArgument { method, ty },
			(CallMode::Rmi, false) => IllegalSignature::RmiReturn { method, ty },
		}
	};

	let (argument_ok, return_ok): (fn(&TypeDesc) -> bool, fn(&TypeDesc) -> bool) = match mode {
		CallMode::Simple => (is_simple_argument, is_simple_return),
		CallMode::Rmi => (is_rmi_argument, TypeDesc::is_rmi_compatible),
	};

	if let Some(bad) = method.arguments.iter().find(|ty| !argument_ok(ty)) {
		return Err(error(bad, true));
	}
	if !return_ok(&method.returns) {
		return Err(error(&method.returns, false));
	}
	Ok(())
}

/// Scalars, strings and JSON shapes the simple protocol carries.
fn is_simple_base(ty: &TypeDesc) -> bool {
	match ty {
		TypeDesc::Primitive(p) | TypeDesc::Boxed(p) => {
			matches!(p, Primitive::Boolean | Primitive::Int | Primitive::Double)
		}
		TypeDesc::String | TypeDesc::JsonValue | TypeDesc::JsonObject => true,
		_ => false,
	}
}

fn is_simple_argument(ty: &TypeDesc) -> bool {
	match ty {
		TypeDesc::Array(component) => is_simple_argument(component),
		TypeDesc::Enum(_) => true,
		other => is_simple_base(other),
	}
}

fn is_simple_return(ty: &TypeDesc) -> bool {
	match ty {
		TypeDesc::Void => true,
		TypeDesc::List(element) => {
			matches!(**element, TypeDesc::Primitive(Primitive::Long) | TypeDesc::Boxed(Primitive::Long))
				|| is_simple_base(element)
		}
		other => is_simple_base(other),
	}
}

fn is_rmi_argument(ty: &TypeDesc) -> bool {
	!matches!(ty, TypeDesc::Void) && ty.is_rmi_compatible()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::interface::InterfaceKind;

	fn int() -> TypeDesc {
		TypeDesc::Primitive(Primitive::Int)
	}

	fn long() -> TypeDesc {
		TypeDesc::Primitive(Primitive::Long)
	}

	#[test]
	fn test_simple_accepts_base_types() {
		let method = MethodDecl::new("f", vec![int(), TypeDesc::String, TypeDesc::Enum("Mode")], TypeDesc::Boxed(Primitive::Double));
		assert!(check_method(&method, CallMode::Simple).is_ok());
		let arrays = MethodDecl::new("g", vec![TypeDesc::array(TypeDesc::Enum("Mode"))], TypeDesc::Void);
		assert!(check_method(&arrays, CallMode::Simple).is_ok());
	}

	#[test]
	fn test_simple_rejects_long_argument() {
		let method = MethodDecl::new("f", vec![long()], TypeDesc::Void);
		let err = check_method(&method, CallMode::Simple).unwrap_err();
		assert_eq!(err.to_string(), "Argument of type long of f is not supported by tbrpc");
	}

	#[test]
	fn test_simple_list_returns() {
		for element in [long(), TypeDesc::Boxed(Primitive::Boolean), TypeDesc::String, TypeDesc::JsonValue] {
			let method = MethodDecl::new("f", vec![], TypeDesc::list(element));
			assert!(check_method(&method, CallMode::Simple).is_ok());
		}
		let method = MethodDecl::new("f", vec![], TypeDesc::list(TypeDesc::Record("Pair")));
		let err = check_method(&method, CallMode::Simple).unwrap_err();
		assert_eq!(err.to_string(), "Return type JsonArrayList<Pair> of f is not supported by tbrpc");
	}

	#[test]
	fn test_simple_rejects_records_and_array_returns() {
		let record = MethodDecl::new("f", vec![], TypeDesc::Record("Pair"));
		assert!(matches!(check_method(&record, CallMode::Simple), Err(IllegalSignature::Return { .. })));
		let array = MethodDecl::new("f", vec![], TypeDesc::array(int()));
		assert!(check_method(&array, CallMode::Simple).is_err());
	}

	#[test]
	fn test_rmi_accepts_remote_and_records() {
		let method = MethodDecl::new("f", vec![TypeDesc::Remote("ICounter"), long()], TypeDesc::Record("Pair"));
		assert!(check_method(&method, CallMode::Rmi).is_ok());
	}

	#[test]
	fn test_rmi_rejects_unsupported() {
		let method = MethodDecl::new("f", vec![TypeDesc::Unsupported("Object")], TypeDesc::Void);
		let err = check_method(&method, CallMode::Rmi).unwrap_err();
		assert_eq!(err.to_string(), "Argument of type Object of f is not primitive, remote or serializable");

		let interface = Interface::new("I", InterfaceKind::Rmi).method(MethodDecl::new("g", vec![], TypeDesc::Unsupported("Map")));
		assert!(matches!(check_interface(&interface, CallMode::Rmi), Err(IllegalSignature::RmiReturn { .. })));
	}
}
