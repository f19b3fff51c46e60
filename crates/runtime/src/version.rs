//! Version metadata of the running framework.

use tbrpc_protocol::Version;

/// Version of this runtime, as a page would report it.
pub fn current() -> Version {
	Version::parse(env!("CARGO_PKG_VERSION"))
}
