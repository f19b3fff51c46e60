//! Client configuration.

use std::env;

use crate::executor::ScriptTimeout;

/// Environment variable overriding [`RpcConfig::script_timeout_ms`].
pub const SCRIPT_TIMEOUT_ENV: &str = "TBRPC_SCRIPT_TIMEOUT_MS";

pub const DEFAULT_SCRIPT_TIMEOUT_MS: i64 = 30_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcConfig {
	/// Applied to the automation channel before each call; negative means
	/// unbounded.
	pub script_timeout_ms: i64,
}

impl Default for RpcConfig {
	fn default() -> Self {
		Self {
			script_timeout_ms: DEFAULT_SCRIPT_TIMEOUT_MS,
		}
	}
}

impl RpcConfig {
	/// Defaults, overridden by the environment where set.
	///
	/// An unparsable override is ignored with a warning.
	pub fn from_env() -> Self {
		let mut config = Self::default();
		if let Ok(raw) = env::var(SCRIPT_TIMEOUT_ENV) {
			match raw.trim().parse() {
				Ok(ms) => config.script_timeout_ms = ms,
				Err(_) => tracing::warn!(value = %raw, "ignoring invalid {SCRIPT_TIMEOUT_ENV}"),
			}
		}
		config
	}

	pub fn script_timeout_ms(mut self, millis: i64) -> Self {
		self.script_timeout_ms = millis;
		self
	}

	pub fn script_timeout(&self) -> ScriptTimeout {
		ScriptTimeout::from_millis(self.script_timeout_ms)
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;

	#[test]
	fn test_default_timeout() {
		let config = RpcConfig::default();
		assert_eq!(config.script_timeout(), ScriptTimeout::Bounded(Duration::from_secs(30)));
	}

	#[test]
	fn test_builder_setter() {
		let config = RpcConfig::default().script_timeout_ms(-1);
		assert_eq!(config.script_timeout(), ScriptTimeout::Unbounded);
	}
}
