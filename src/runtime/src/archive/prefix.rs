//! Directory headers for a logical path prefix.

use std::io::Write;

use a3s_ctd_core::error::{CtdError, Result};
use tar::{Builder, EntryType, Header};

/// Every non-empty cumulative segment of a `/`-separated path, each with a
/// trailing slash.
///
/// `var/lib/containerd/` → `["var/", "var/lib/", "var/lib/containerd/"]`
pub fn prefix_dirs(path: &str) -> Vec<String> {
    let mut dirs = Vec::new();
    let mut current = String::new();

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        current.push_str(segment);
        current.push('/');
        dirs.push(current.clone());
    }

    dirs
}

/// Write a directory entry for each element of [`prefix_dirs`].
pub(crate) fn append_prefix_dirs<W: Write>(builder: &mut Builder<W>, path: &str) -> Result<()> {
    for dir in prefix_dirs(path) {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Directory);
        header.set_mode(0o755);
        header.set_size(0);
        header.set_mtime(0);

        builder
            .append_data(&mut header, &dir, std::io::empty())
            .map_err(|e| {
                CtdError::ArchiveError(format!("failed to write directory {}: {}", dir, e))
            })?;
    }
    Ok(())
}
