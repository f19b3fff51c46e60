//! tbrpc: call server-side view methods from browser-driven tests.
//!
//! Declare the view's methods as a trait, let [`interface`] generate a proxy,
//! and call it like a local object. Every call runs one async script in the
//! browser, which finds the view's server binding and invokes the published
//! callable of the same name.
//!
//! ```ignore
//! use tbrpc::{RpcClient, interface};
//!
//! #[interface]
//! trait Greeter {
//!     async fn concat_world(&self, arg: String) -> tbrpc::Result<String>;
//! }
//!
//! async fn greet(client: &RpcClient) -> anyhow::Result<()> {
//!     let server = client.proxy::<GreeterProxy>()?;
//!     assert_eq!(server.concat_world("Hello ".into()).await?, "Hello World");
//!     Ok(())
//! }
//! ```
//!
//! Views that also publish `$call` are reference-capable: declare the trait
//! with `#[interface(rmi)]` and methods may take and return records, 64-bit
//! integers and stubs for server objects (`#[interface(remote)]`).

pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod interface;
pub mod json_list;
pub mod policy;
pub mod proxy;
pub mod script;
pub mod side_channel;
pub mod stub;
#[cfg(feature = "webdriver")]
pub mod webdriver;

pub use client::RpcClient;
pub use config::RpcConfig;
pub use error::{Cause, ExecutorError, IllegalSignature, Result, RpcError};
pub use executor::{ScriptExecutor, ScriptTimeout, WindowControl};
pub use interface::{Callables, Interface, InterfaceKind, MethodDecl};
pub use json_list::JsonArrayList;
pub use policy::CallMode;
pub use proxy::{Argument, Proxy};
pub use side_channel::SideChannel;
pub use stub::RemoteStub;
pub use tbrpc_macros::{Marshal, interface};
pub use tbrpc_protocol as protocol;
#[cfg(feature = "webdriver")]
pub use webdriver::WebDriverExecutor;
