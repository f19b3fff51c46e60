//! Error types for the server runtime.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// Registry lookup failed.
	#[error("No remote object with id {0}")]
	NoSuchObject(String),

	/// A dispatcher's view object has no class in its table.
	#[error("No remote class registered for {0}")]
	UnregisteredClass(String),
}
