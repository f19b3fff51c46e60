//! Code generation for tbrpc.
//!
//! `#[interface]` turns a trait of async methods into a typed proxy (or, for
//! `#[interface(remote)]`, a typed stub) that forwards every call to
//! `tbrpc::Proxy::invoke`. `#[derive(Marshal)]` gives records and fieldless
//! enums their wire form.

use heck::ToLowerCamelCase;
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::parse::{Parse, ParseStream};
use syn::{
	Attribute, Data, DeriveInput, Error, Fields, FnArg, GenericArgument, Ident, ItemTrait, LitStr, Path, PathArguments, Result, ReturnType,
	Token, TraitItem, TraitItemFn, Type, parse_macro_input,
};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
	Simple,
	Rmi,
	Remote,
}

struct InterfaceArgs {
	kind: Kind,
	name: Option<LitStr>,
}

impl Parse for InterfaceArgs {
	fn parse(input: ParseStream<'_>) -> Result<Self> {
		let mut kind = None;
		let mut name = None;
		while !input.is_empty() {
			let key: Ident = input.parse()?;
			match key.to_string().as_str() {
				"rmi" | "remote" => {
					if kind.is_some() {
						return Err(Error::new(key.span(), "interface kind given more than once"));
					}
					kind = Some(if key == "rmi" { Kind::Rmi } else { Kind::Remote });
				}
				"name" => {
					input.parse::<Token![=]>()?;
					name = Some(input.parse::<LitStr>()?);
				}
				other => {
					return Err(Error::new(
						key.span(),
						format!("unknown interface option '{other}', expected 'rmi', 'remote' or 'name = \"..\"'"),
					));
				}
			}
			if !input.is_empty() {
				input.parse::<Token![,]>()?;
			}
		}
		Ok(Self {
			kind: kind.unwrap_or(Kind::Simple),
			name,
		})
	}
}

struct Method {
	ident: Ident,
	wire: LitStr,
	arguments: Vec<Type>,
	output: Type,
	returns: Type,
}

/// Declares a remotely callable interface.
///
/// Every method must be `async fn name(&self, ..) -> tbrpc::Result<T>`. The
/// wire name defaults to the lowerCamelCase form of the method name and can be
/// set with `#[rpc(name = "..")]`.
#[proc_macro_attribute]
pub fn interface(args: TokenStream, item: TokenStream) -> TokenStream {
	let args = parse_macro_input!(args as InterfaceArgs);
	let item = parse_macro_input!(item as ItemTrait);
	expand_interface(args, item).unwrap_or_else(Error::into_compile_error).into()
}

fn expand_interface(args: InterfaceArgs, mut item: ItemTrait) -> Result<proc_macro2::TokenStream> {
	if !item.generics.params.is_empty() {
		return Err(Error::new_spanned(&item.generics, "interface traits cannot be generic"));
	}

	let mut methods = Vec::new();
	for trait_item in &mut item.items {
		match trait_item {
			TraitItem::Fn(method) => {
				methods.push(parse_method(method)?);
				rewrite_signature(method);
			}
			other => return Err(Error::new_spanned(other, "interface traits may only declare methods")),
		}
	}

	let trait_ident = &item.ident;
	let vis = &item.vis;
	let interface_name = args.name.unwrap_or_else(|| LitStr::new(&trait_ident.to_string(), trait_ident.span()));
	let (type_ident, kind) = match args.kind {
		Kind::Simple => (format_ident!("{}Proxy", trait_ident), quote!(Simple)),
		Kind::Rmi => (format_ident!("{}Proxy", trait_ident), quote!(Rmi)),
		Kind::Remote => (format_ident!("{}Stub", trait_ident), quote!(Remote)),
	};

	let decls = methods.iter().map(|m| {
		let wire = &m.wire;
		let arguments = &m.arguments;
		let returns = &m.returns;
		quote! {
			::tbrpc::MethodDecl::new(
				#wire,
				::std::vec![#(<#arguments as ::tbrpc::protocol::Marshal>::describe()),*],
				<#returns as ::tbrpc::protocol::Marshal>::describe(),
			)
		}
	});

	let forwards = methods.iter().map(|m| {
		let ident = &m.ident;
		let wire = &m.wire;
		let output = &m.output;
		let returns = &m.returns;
		let params = (0..m.arguments.len()).map(|i| format_ident!("arg{}", i)).collect::<Vec<_>>();
		let types = &m.arguments;
		quote! {
			fn #ident(&self #(, #params: #types)*) -> impl ::core::future::Future<Output = #output> + ::core::marker::Send {
				self.proxy.invoke::<#returns>(#wire, ::std::vec![#(::tbrpc::Argument::new(#params)),*])
			}
		}
	});

	let doc = match args.kind {
		Kind::Remote => format!("Typed stub for remote `{}` objects.", interface_name.value()),
		_ => format!("Generated proxy for [`{trait_ident}`]."),
	};

	let stub_items = (args.kind == Kind::Remote).then(|| expand_stub_items(&type_ident, &interface_name));

	Ok(quote! {
		#item

		#[doc = #doc]
		#[derive(Clone)]
		#vis struct #type_ident {
			proxy: ::tbrpc::Proxy,
		}

		impl #type_ident {
			/// The proxy every method forwards to.
			#vis fn proxy(&self) -> &::tbrpc::Proxy {
				&self.proxy
			}
		}

		impl ::tbrpc::Callables for #type_ident {
			fn interface() -> ::tbrpc::Interface {
				::tbrpc::Interface::new(#interface_name, ::tbrpc::InterfaceKind::#kind)
					#(.method(#decls))*
			}

			fn from_proxy(proxy: ::tbrpc::Proxy) -> Self {
				Self { proxy }
			}
		}

		impl #trait_ident for #type_ident {
			#(#forwards)*
		}

		#stub_items
	})
}

fn expand_stub_items(stub: &Ident, interface_name: &LitStr) -> proc_macro2::TokenStream {
	quote! {
		impl #stub {
			pub fn instance_id(&self) -> &str {
				::tbrpc::stub::instance_id_of(&self.proxy)
			}

			/// Re-types this stub as another interface its object implements.
			pub fn narrow<S: ::tbrpc::Callables>(&self) -> ::core::result::Result<S, ::tbrpc::IllegalSignature> {
				::tbrpc::stub::narrow_of(&self.proxy)
			}
		}

		impl ::core::fmt::Display for #stub {
			fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
				f.write_str(&::tbrpc::stub::label_of(&self.proxy))
			}
		}

		impl ::core::fmt::Debug for #stub {
			fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
				f.debug_struct(::core::stringify!(#stub)).field("instance_id", &self.instance_id()).finish()
			}
		}

		impl ::core::cmp::PartialEq for #stub {
			fn eq(&self, other: &Self) -> bool {
				self.instance_id() == other.instance_id()
			}
		}

		impl ::core::cmp::Eq for #stub {}

		impl ::core::hash::Hash for #stub {
			fn hash<H: ::core::hash::Hasher>(&self, state: &mut H) {
				::core::hash::Hash::hash(self.instance_id(), state);
			}
		}

		impl ::tbrpc::protocol::Marshal for #stub {
			fn describe() -> ::tbrpc::protocol::TypeDesc {
				::tbrpc::protocol::TypeDesc::Remote(#interface_name)
			}

			fn into_serial(self) -> ::core::result::Result<::tbrpc::protocol::Serial, ::tbrpc::protocol::CastError> {
				::tbrpc::stub::typed_into_serial(&self.proxy)
			}

			fn from_serial(value: ::tbrpc::protocol::Serial) -> ::core::result::Result<Self, ::tbrpc::protocol::CastError> {
				::tbrpc::stub::typed_from_serial(value)
			}
		}
	}
}

fn parse_method(method: &TraitItemFn) -> Result<Method> {
	let sig = &method.sig;
	if sig.asyncness.is_none() {
		return Err(Error::new(sig.fn_token.span, "interface methods must be async"));
	}
	if let Some(default) = &method.default {
		return Err(Error::new_spanned(default, "interface methods cannot have a body"));
	}
	if !sig.generics.params.is_empty() {
		return Err(Error::new_spanned(&sig.generics, "interface methods cannot be generic"));
	}

	let mut inputs = sig.inputs.iter();
	match inputs.next() {
		Some(FnArg::Receiver(receiver)) if receiver.reference.is_some() && receiver.mutability.is_none() => {}
		_ => return Err(Error::new(sig.ident.span(), "interface methods must take `&self`")),
	}
	let arguments = inputs
		.map(|input| match input {
			FnArg::Typed(typed) => Ok((*typed.ty).clone()),
			FnArg::Receiver(receiver) => Err(Error::new_spanned(receiver, "unexpected receiver")),
		})
		.collect::<Result<Vec<_>>>()?;

	let output = match &sig.output {
		ReturnType::Type(_, ty) => (**ty).clone(),
		ReturnType::Default => return Err(Error::new(sig.ident.span(), "interface methods must return `tbrpc::Result<T>`")),
	};
	let returns = result_ok_type(&output)?;

	let wire = match rpc_name(&method.attrs)? {
		Some(name) => name,
		None => LitStr::new(&sig.ident.to_string().to_lower_camel_case(), sig.ident.span()),
	};

	Ok(Method {
		ident: sig.ident.clone(),
		wire,
		arguments,
		output,
		returns,
	})
}

/// `T` out of `tbrpc::Result<T>`.
fn result_ok_type(output: &Type) -> Result<Type> {
	let expected = || Error::new_spanned(output, "interface methods must return `tbrpc::Result<T>`");
	let Type::Path(path) = output else {
		return Err(expected());
	};
	let last = path.path.segments.last().ok_or_else(expected)?;
	if last.ident != "Result" {
		return Err(expected());
	}
	let PathArguments::AngleBracketed(generics) = &last.arguments else {
		return Err(expected());
	};
	let mut types = generics.args.iter().filter_map(|arg| match arg {
		GenericArgument::Type(ty) => Some(ty),
		_ => None,
	});
	match (types.next(), types.next()) {
		(Some(ty), None) => Ok(ty.clone()),
		(Some(_), Some(extra)) => Err(Error::new_spanned(extra, "use `tbrpc::Result<T>`; the error type is fixed")),
		_ => Err(expected()),
	}
}

fn rpc_name(attrs: &[Attribute]) -> Result<Option<LitStr>> {
	let mut name = None;
	for attr in attrs.iter().filter(|attr| attr.path().is_ident("rpc")) {
		attr.parse_nested_meta(|meta| {
			if meta.path.is_ident("name") {
				name = Some(meta.value()?.parse::<LitStr>()?);
				Ok(())
			} else {
				Err(meta.error("expected `name = \"..\"`"))
			}
		})?;
	}
	Ok(name)
}

/// Drops `async` and the `#[rpc]` attributes so the trait compiles as plain
/// Rust with a `Send` future return.
fn rewrite_signature(method: &mut TraitItemFn) {
	method.attrs.retain(|attr| !attr.path().is_ident("rpc"));
	let sig = &mut method.sig;
	sig.asyncness = None;
	if let ReturnType::Type(arrow, ty) = &sig.output {
		let inner = (**ty).clone();
		let future: Type = syn::parse_quote!(impl ::core::future::Future<Output = #inner> + ::core::marker::Send);
		sig.output = ReturnType::Type(*arrow, Box::new(future));
	}
}

/// Derives `Marshal` for a record (named-field struct) or a fieldless enum.
///
/// Records travel by value through the object stream under their type name;
/// enums travel by constant name. `#[marshal(name = "..")]` overrides the wire
/// class name and `#[marshal(crate = path)]` the protocol crate path.
#[proc_macro_derive(Marshal, attributes(marshal))]
pub fn derive_marshal(item: TokenStream) -> TokenStream {
	let input = parse_macro_input!(item as DeriveInput);
	expand_marshal(input).unwrap_or_else(Error::into_compile_error).into()
}

struct MarshalArgs {
	name: LitStr,
	krate: Path,
}

fn marshal_args(input: &DeriveInput) -> Result<MarshalArgs> {
	let mut name = LitStr::new(&input.ident.to_string(), input.ident.span());
	let mut krate: Path = syn::parse_quote!(::tbrpc_protocol);
	for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("marshal")) {
		attr.parse_nested_meta(|meta| {
			if meta.path.is_ident("name") {
				name = meta.value()?.parse()?;
				Ok(())
			} else if meta.path.is_ident("crate") {
				krate = meta.value()?.parse()?;
				Ok(())
			} else {
				Err(meta.error("expected `name = \"..\"` or `crate = path`"))
			}
		})?;
	}
	Ok(MarshalArgs { name, krate })
}

fn expand_marshal(input: DeriveInput) -> Result<proc_macro2::TokenStream> {
	if !input.generics.params.is_empty() {
		return Err(Error::new_spanned(&input.generics, "Marshal cannot be derived for generic types"));
	}
	let args = marshal_args(&input)?;
	match &input.data {
		Data::Struct(data) => expand_record(&input.ident, &args, &data.fields),
		Data::Enum(data) => {
			let mut constants = Vec::new();
			for variant in &data.variants {
				if !matches!(variant.fields, Fields::Unit) {
					return Err(Error::new_spanned(variant, "only fieldless enums can be marshalled"));
				}
				constants.push(&variant.ident);
			}
			Ok(expand_enum(&input.ident, &args, &constants))
		}
		Data::Union(data) => Err(Error::new(data.union_token.span, "Marshal cannot be derived for unions")),
	}
}

fn expand_record(ident: &Ident, args: &MarshalArgs, fields: &Fields) -> Result<proc_macro2::TokenStream> {
	let Fields::Named(named) = fields else {
		return Err(Error::new_spanned(fields, "records need named fields"));
	};
	let MarshalArgs { name, krate } = args;
	let names = named.named.iter().filter_map(|f| f.ident.as_ref()).collect::<Vec<_>>();
	let keys = names.iter().map(|n| LitStr::new(&n.to_string().to_lower_camel_case(), n.span())).collect::<Vec<_>>();

	Ok(quote! {
		impl #krate::Marshal for #ident {
			fn describe() -> #krate::TypeDesc {
				#krate::TypeDesc::Record(#name)
			}

			fn into_serial(self) -> ::core::result::Result<#krate::Serial, #krate::CastError> {
				let record = #krate::Record::new(#name)
					#(.with(#keys, #krate::Marshal::into_serial(self.#names)?))*;
				Ok(#krate::Serial::record(record))
			}

			fn from_serial(value: #krate::Serial) -> ::core::result::Result<Self, #krate::CastError> {
				#[allow(unused_variables)]
				let record = #krate::marshal::expect_record(value, #name)?;
				Ok(Self {
					#(#names: #krate::Marshal::from_serial(record.require(#keys)?)?,)*
				})
			}
		}
	})
}

fn expand_enum(ident: &Ident, args: &MarshalArgs, constants: &[&Ident]) -> proc_macro2::TokenStream {
	let MarshalArgs { name, krate } = args;
	let labels = constants.iter().map(|c| LitStr::new(&c.to_string(), c.span())).collect::<Vec<_>>();

	quote! {
		impl #ident {
			#[doc(hidden)]
			fn marshal_constant(&self) -> &'static str {
				match self {
					#(Self::#constants => #labels,)*
				}
			}

			#[doc(hidden)]
			fn unmarshal_constant(constant: ::std::string::String) -> ::core::result::Result<Self, #krate::CastError> {
				match constant.as_str() {
					#(#labels => Ok(Self::#constants),)*
					_ => Err(#krate::marshal::unknown_constant(constant, #name)),
				}
			}
		}

		impl #krate::Marshal for #ident {
			fn describe() -> #krate::TypeDesc {
				#krate::TypeDesc::Enum(#name)
			}

			fn into_json(self) -> ::core::result::Result<#krate::serde_json::Value, #krate::CastError> {
				Ok(#krate::serde_json::Value::String(self.marshal_constant().to_string()))
			}

			fn from_json(value: #krate::serde_json::Value) -> ::core::result::Result<Self, #krate::CastError> {
				Self::unmarshal_constant(#krate::marshal::json_constant(value, #name)?)
			}

			fn into_serial(self) -> ::core::result::Result<#krate::Serial, #krate::CastError> {
				Ok(#krate::Serial::Enum {
					class: #name.to_string(),
					constant: self.marshal_constant().to_string(),
				})
			}

			fn from_serial(value: #krate::Serial) -> ::core::result::Result<Self, #krate::CastError> {
				Self::unmarshal_constant(#krate::marshal::serial_constant(value, #name)?)
			}
		}
	}
}
