//! Framework version reported through the `it/version` view.

use anyhow::Result;
use tbrpc_harness::fixtures::version::{ROUTE, VersionViewCallables, VersionViewCallablesProxy};
use tbrpc_runtime::version;

#[tokio::test]
async fn test_version_getters_agree() -> Result<()> {
	let (_browser, client) = tbrpc_harness::open(ROUTE);
	let server: VersionViewCallablesProxy = client.proxy()?;

	let reported = server.get_version().await?;
	assert_eq!(reported, version::current());
	assert_eq!(server.get_full_version().await?, reported.full_version);
	assert_eq!(server.get_major_version().await?, reported.major_version);
	assert_eq!(server.get_minor_version().await?, reported.minor_version);
	assert_eq!(server.get_revision().await?, reported.revision);
	Ok(())
}
