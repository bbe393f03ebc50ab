//! Destination for daemon and fetch tool output.

use std::fs::File;
use std::io;
use std::path::Path;
use std::process::Stdio;

/// Where a supervised process writes its diagnostic output.
///
/// Converted straight into [`Stdio`] handles, so no copy task is needed.
#[derive(Debug, Default)]
pub enum OutputSink {
    /// The supervisor's own stderr. Also used for child stdout, which keeps
    /// the supervisor's stdout free for archive data.
    #[default]
    Stderr,
    /// Discard everything.
    Null,
    /// An open file, shared by every process of the instance.
    File(File),
}

impl OutputSink {
    /// Open (or create) a log file in append mode.
    pub fn append_to(path: &Path) -> io::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(OutputSink::File(file))
    }

    /// A fresh [`Stdio`] handle for one child stream.
    pub fn stdio(&self) -> io::Result<Stdio> {
        match self {
            OutputSink::Stderr => stderr_stdio(),
            OutputSink::Null => Ok(Stdio::null()),
            OutputSink::File(file) => Ok(Stdio::from(file.try_clone()?)),
        }
    }
}

#[cfg(unix)]
fn stderr_stdio() -> io::Result<Stdio> {
    use std::os::fd::AsFd;

    let fd = io::stderr().as_fd().try_clone_to_owned()?;
    Ok(Stdio::from(fd))
}

#[cfg(not(unix))]
fn stderr_stdio() -> io::Result<Stdio> {
    Ok(Stdio::inherit())
}
