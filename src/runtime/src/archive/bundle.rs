//! Bundle blobs: an image name plus its runtime config, as tar.

use a3s_ctd_core::error::{CtdError, Result};
use tar::{Builder, EntryType, Header};
use tokio_util::sync::CancellationToken;

use super::prefix::append_prefix_dirs;
use crate::daemon::DaemonInstance;
use crate::fetch::Fetcher;

/// Name of the config entry inside the bundle directory.
pub const BUNDLE_CONFIG: &str = "config.json";

/// Name of the image reference entry inside the bundle directory.
pub const BUNDLE_IMAGE: &str = "image";

/// Build the bundle tar for `path`, then fetch `image` into the instance.
///
/// The blob contains directory entries for `path`, `<path>/config.json`
/// holding `config` verbatim, and `<path>/image` holding `image` exactly as
/// given. The reference is only normalized for the fetch. Returns the blob
/// only if the fetch also succeeds.
pub async fn bundle(
    fetcher: &Fetcher,
    instance: &DaemonInstance,
    path: &str,
    image: &str,
    config: &[u8],
    trust: bool,
) -> Result<Vec<u8>> {
    bundle_with_cancel(fetcher, instance, path, image, config, trust, &CancellationToken::new()).await
}

/// [`bundle`], with the fetch stopped (and an error returned) once `cancel`
/// fires.
pub async fn bundle_with_cancel(
    fetcher: &Fetcher,
    instance: &DaemonInstance,
    path: &str,
    image: &str,
    config: &[u8],
    trust: bool,
    cancel: &CancellationToken,
) -> Result<Vec<u8>> {
    tracing::debug!(path, image, config = %String::from_utf8_lossy(config), "bundle");

    let blob = build_bundle(path, image, config)?;
    fetcher.fetch_with_cancel(instance, image, trust, cancel).await?;

    Ok(blob)
}

/// Build the bundle tar in memory without fetching anything.
///
/// Leading and trailing slashes of `path` are ignored. An empty path or a
/// `..` segment is rejected.
pub fn build_bundle(path: &str, image: &str, config: &[u8]) -> Result<Vec<u8>> {
    let path = path.trim_matches('/');
    if path.is_empty() || path.split('/').any(|s| s == "..") {
        return Err(CtdError::ArchiveError(format!(
            "invalid bundle path '{}'",
            path
        )));
    }

    let mut builder = Builder::new(Vec::new());
    append_prefix_dirs(&mut builder, &format!("{}/", path))?;
    append_file(&mut builder, &format!("{}/{}", path, BUNDLE_CONFIG), config)?;
    append_file(&mut builder, &format!("{}/{}", path, BUNDLE_IMAGE), image.as_bytes())?;

    builder
        .into_inner()
        .map_err(|e| CtdError::ArchiveError(format!("failed to finalize bundle: {}", e)))
}

fn append_file(builder: &mut Builder<Vec<u8>>, name: &str, data: &[u8]) -> Result<()> {
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Regular);
    header.set_mode(0o644);
    header.set_size(data.len() as u64);
    header.set_mtime(0);

    builder
        .append_data(&mut header, name, data)
        .map_err(|e| CtdError::ArchiveError(format!("failed to write {}: {}", name, e)))
}
