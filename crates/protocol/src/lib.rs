//! Wire types for the tbrpc bridge.
//!
//! This crate holds everything both ends of the bridge must agree on: the
//! shapes that cross the browser's script channel, the RMI error-kind
//! enumeration, the portable object model ([`Serial`]) and its binary object
//! stream, and the [`Marshal`] trait that ties Rust types to both the JSON wire
//! model and the object stream.
//!
//! # Main Types
//!
//! - [`Invocation`] - descriptor of one reference-capable call
//! - [`RmiResponse`] - tagged success/failure envelope
//! - [`RmiErrorKind`] - the `E_*` failure classification
//! - [`Serial`] - portable object graph passed by value
//! - [`TypeDesc`] - type descriptor used by signature checks and method tables

pub mod constants;
pub mod error;
pub mod error_kind;
pub mod invocation;
pub mod marshal;
pub mod serial;
pub mod stream;
pub mod types;
pub mod version;

pub use error::{CastError, MarshalError, ProtocolViolation, UnmarshalError};
pub use error_kind::RmiErrorKind;
pub use invocation::{Invocation, RmiResponse};
pub use marshal::{AnyObject, Component, Marshal};
pub use serial::{Record, RemoteHandle, RemoteObject, RemoteRef, Replacement, Serial, Throwable};
pub use types::{Primitive, TypeDesc};
pub use version::Version;

/// Derive for records and fieldless enums; the generated code refers to this
/// crate as `::tbrpc_protocol`.
pub use tbrpc_macros::Marshal;

#[doc(hidden)]
pub use serde_json;
