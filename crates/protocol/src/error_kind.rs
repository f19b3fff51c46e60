//! Classification of reference-capable call failures.

use std::fmt;

/// Failure kinds reported in an RMI error envelope.
///
/// Some kinds carry the original server-side throwable in the envelope's
/// `data` field; see [`RmiErrorKind::has_exception`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RmiErrorKind {
	/// Malformed invocation shape.
	ProtocolError,
	/// Target class name could not be resolved.
	ClassNotFound,
	/// Method or signature could not be resolved.
	NoSuchMethod,
	/// Instance id is not registered.
	ObjectNotExist,
	/// Argument decode failed.
	Unmarshal,
	/// The invoked method itself failed.
	Invoke,
	/// Result encode failed.
	Marshal,
	/// Anything else.
	Unknown,
}

impl RmiErrorKind {
	pub const ALL: [RmiErrorKind; 8] = [
		Self::ProtocolError,
		Self::ClassNotFound,
		Self::NoSuchMethod,
		Self::ObjectNotExist,
		Self::Unmarshal,
		Self::Invoke,
		Self::Marshal,
		Self::Unknown,
	];

	/// Whether envelopes of this kind carry a serialized throwable.
	pub const fn has_exception(self) -> bool {
		!matches!(self, Self::ClassNotFound | Self::NoSuchMethod | Self::ObjectNotExist)
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::ProtocolError => "E_PROTOCOL_ERROR",
			Self::ClassNotFound => "E_CLASS_NOT_FOUND",
			Self::NoSuchMethod => "E_NO_SUCH_METHOD",
			Self::ObjectNotExist => "E_OBJECT_NOT_EXIST",
			Self::Unmarshal => "E_UNMARSHAL",
			Self::Invoke => "E_INVOKE",
			Self::Marshal => "E_MARSHAL",
			Self::Unknown => "E_UNKNOWN",
		}
	}

	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|kind| kind.as_str() == name)
	}
}

impl fmt::Display for RmiErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
