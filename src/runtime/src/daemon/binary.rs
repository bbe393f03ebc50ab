//! Executable lookup on a search path.

use std::path::{Path, PathBuf};

/// Find an executable the way a shell would.
///
/// Names containing a path separator are checked as-is. Bare names are
/// looked up in each directory of `search_path`, or `$PATH` when `None`.
pub fn find_binary(name: &str, search_path: Option<&str>) -> Option<PathBuf> {
    if name.contains(std::path::MAIN_SEPARATOR) || name.contains('/') {
        let path = PathBuf::from(name);
        return is_executable(&path).then_some(path);
    }

    let path_var = match search_path {
        Some(p) => p.into(),
        None => std::env::var_os("PATH")?,
    };

    std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
