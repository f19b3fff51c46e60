//! Server side of the tbrpc bridge.
//!
//! A [`View`] is what a page hosts: a set of published callables reachable from
//! the browser. Reference-capable views also publish `$call`, backed by a
//! [`RemoteDispatcher`] that resolves invocations against explicit
//! [`RemoteClass`] method tables and keeps a per-view [`ObjectRegistry`].

pub mod class;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod version;
pub mod view;

pub use class::{ClassTable, MethodKey, RemoteClass, RemoteClassBuilder};
pub use dispatch::RemoteDispatcher;
pub use error::{Error, Result};
pub use registry::ObjectRegistry;
pub use tbrpc_protocol as protocol;
pub use view::{ClientCallable, View, ViewBuilder};
