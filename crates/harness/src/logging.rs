use std::sync::Once;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

static INIT: Once = Once::new();

/// Installs a compact stderr subscriber once per process.
///
/// `RUST_LOG` overrides the default `warn` filter.
pub fn init_tracing() {
	INIT.call_once(|| {
		let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
		let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

		// Test binaries may already have a subscriber.
		let _ = tracing_subscriber::fmt()
			.with_env_filter(env_filter)
			.with_writer(stderr)
			.with_target(true)
			.with_level(true)
			.compact()
			.try_init();
	});
}
