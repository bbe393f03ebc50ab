//! Content store snapshot as a tar stream.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use a3s_ctd_core::error::{CtdError, Result};
use tar::{Builder, Header};
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use super::prefix::append_prefix_dirs;
use crate::daemon::DaemonInstance;

/// Where the content store lands when the archive is extracted at `/`.
pub const STORE_PREFIX: &str = "var/lib/containerd/";

/// Write the instance's content store (`<work_dir>/root`) to `out` as tar.
///
/// Entries are renamed to live under [`STORE_PREFIX`]. The daemon keeps
/// running; snapshot after fetches have completed.
pub fn store<W: Write>(instance: &DaemonInstance, out: W) -> Result<()> {
    store_dir(&instance.root_dir(), out, &CancellationToken::new())
}

/// Archive the tree under `src` into `out`, rooted at [`STORE_PREFIX`].
///
/// Entries are written in file-name order so the same tree always yields the
/// same bytes. `cancel` is checked between entries. On error the output
/// must be discarded.
pub fn store_dir<W: Write>(src: &Path, out: W, cancel: &CancellationToken) -> Result<()> {
    let meta = std::fs::metadata(src).map_err(|e| {
        CtdError::ArchiveError(format!("cannot read content store {}: {}", src.display(), e))
    })?;
    if !meta.is_dir() {
        return Err(CtdError::ArchiveError(format!(
            "content store {} is not a directory",
            src.display()
        )));
    }

    let mut builder = Builder::new(out);
    append_prefix_dirs(&mut builder, STORE_PREFIX)?;

    let mut count = 0usize;
    // Depth 0 is `src` itself, already covered by the prefix entries.
    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        if cancel.is_cancelled() {
            return Err(CtdError::ArchiveError("snapshot cancelled".to_string()));
        }

        let entry = entry.map_err(|e| {
            CtdError::ArchiveError(format!("failed to walk {}: {}", src.display(), e))
        })?;
        append_entry(&mut builder, src, entry.path())?;
        count += 1;
    }

    builder
        .finish()
        .map_err(|e| CtdError::ArchiveError(format!("failed to finalize archive: {}", e)))?;

    tracing::info!(src = %src.display(), entries = count, "Content store archived");
    Ok(())
}

/// Archive name of `path`: relative to `src`, under [`STORE_PREFIX`].
fn archive_name(src: &Path, path: &Path) -> Result<PathBuf> {
    let relative = path.strip_prefix(src).map_err(|e| {
        CtdError::ArchiveError(format!(
            "failed to compute relative path for {}: {}",
            path.display(),
            e
        ))
    })?;
    Ok(Path::new(STORE_PREFIX).join(relative))
}

fn append_entry<W: Write>(builder: &mut Builder<W>, src: &Path, path: &Path) -> Result<()> {
    let name = archive_name(src, path)?;
    let archive_error = |e: std::io::Error| {
        CtdError::ArchiveError(format!("failed to add {}: {}", path.display(), e))
    };

    let meta = std::fs::symlink_metadata(path).map_err(archive_error)?;
    let file_type = meta.file_type();

    let mut header = Header::new_gnu();
    header.set_metadata(&meta);

    if file_type.is_file() {
        let file = File::open(path).map_err(archive_error)?;
        append_sized(builder, &mut header, &name, file).map_err(archive_error)?;
    } else if file_type.is_symlink() {
        let target = std::fs::read_link(path).map_err(archive_error)?;
        header.set_size(0);
        builder
            .append_link(&mut header, &name, &target)
            .map_err(archive_error)?;
    } else {
        // Directories, sockets, fifos, devices: header only.
        header.set_size(0);
        builder
            .append_data(&mut header, &name, std::io::empty())
            .map_err(archive_error)?;
    }

    Ok(())
}

/// Append exactly `header.size()` bytes of `data`.
///
/// containerd keeps running while the store is archived, so a file may change
/// between `stat` and read. Growth is cut off at the recorded size; a file
/// that shrank fails with `UnexpectedEof`.
fn append_sized<W: Write, R: Read>(
    builder: &mut Builder<W>,
    header: &mut Header,
    name: &Path,
    data: R,
) -> io::Result<()> {
    let size = header.size()?;
    let reader = SizedReader {
        inner: data.take(size),
        remaining: size,
    };
    builder.append_data(header, name, reader)
}

/// Reader that errors if `inner` ends before `remaining` bytes were read.
struct SizedReader<R> {
    inner: R,
    remaining: u64,
}

impl<R: Read> Read for SizedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let n = self.inner.read(buf)?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("file shrank while archiving ({} bytes missing)", self.remaining),
            ));
        }
        self.remaining -= n as u64;
        Ok(n)
    }
}
