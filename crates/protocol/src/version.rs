//! Framework version metadata, passed by value.

use std::sync::Arc;

use crate::error::CastError;
use crate::marshal::{Marshal, expect_record};
use crate::serial::{Record, Serial};
use crate::types::TypeDesc;

const CLASS: &str = "Version";

/// Version of the running server framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
	/// `x.y.z` or `x.y.z.qualifier`.
	pub full_version: String,
	pub major_version: i32,
	pub minor_version: i32,
	pub revision: i32,
}

impl Version {
	/// Parses `x.y.z[.qualifier]`; a `-` also starts the qualifier.
	/// Missing or non-numeric parts read as zero.
	pub fn parse(full: &str) -> Self {
		let numeric = full.split('-').next().unwrap_or(full);
		let mut parts = numeric.split('.').map(|part| part.parse::<i32>().unwrap_or(0));
		Self {
			full_version: full.to_string(),
			major_version: parts.next().unwrap_or(0),
			minor_version: parts.next().unwrap_or(0),
			revision: parts.next().unwrap_or(0),
		}
	}
}

impl Marshal for Version {
	fn describe() -> TypeDesc {
		TypeDesc::Record(CLASS)
	}

	fn into_serial(self) -> Result<Serial, CastError> {
		Ok(Serial::Record(Arc::new(
			Record::new(CLASS)
				.with("fullVersion", Serial::String(self.full_version))
				.with("majorVersion", Serial::Int(self.major_version))
				.with("minorVersion", Serial::Int(self.minor_version))
				.with("revision", Serial::Int(self.revision)),
		)))
	}

	fn from_serial(value: Serial) -> Result<Self, CastError> {
		let record = expect_record(value, CLASS)?;
		Ok(Self {
			full_version: String::from_serial(record.require("fullVersion")?)?,
			major_version: i32::from_serial(record.require("majorVersion")?)?,
			minor_version: i32::from_serial(record.require("minorVersion")?)?,
			revision: i32::from_serial(record.require("revision")?)?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_plain() {
		let v = Version::parse("24.3.7");
		assert_eq!((v.major_version, v.minor_version, v.revision), (24, 3, 7));
	}

	#[test]
	fn test_parse_qualified() {
		let v = Version::parse("1.0.0-beta.2");
		assert_eq!(v.full_version, "1.0.0-beta.2");
		assert_eq!((v.major_version, v.minor_version, v.revision), (1, 0, 0));

		let v = Version::parse("23.1.0.alpha1");
		assert_eq!((v.major_version, v.minor_version, v.revision), (23, 1, 0));
	}

	#[test]
	fn test_passes_by_value() {
		let v = Version::parse("2.5.1");
		let back = Version::from_serial(v.clone().into_serial().unwrap()).unwrap();
		assert_eq!(back, v);
	}
}
