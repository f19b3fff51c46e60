//! Names shared by both ends of the bridge.

/// Callable published by every reference-capable view.
pub const RMI_CALL: &str = "$call";

/// Marker value tagging RMI response envelopes.
pub const RMI_MARKER: &str = "tbrpc.RmiCallable";

pub const RESPONSE_MARKER: &str = "marker";
pub const RESPONSE_DATA: &str = "data";
pub const RESPONSE_ERROR: &str = "error";

/// Signature type name carried by remote-typed parameters.
pub const STUB_REPLACEMENT: &str = "RmiStubReplacement";

/// Interface name of the generic remote capability.
pub const RMI_REMOTE: &str = "RmiRemote";

/// Internal marker interface of client stubs; never shown in labels.
pub const STUB_MARKER: &str = "RmiStub";
