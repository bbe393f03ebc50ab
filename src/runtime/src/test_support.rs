//! Fake `containerd` / `dist` executables for unit tests.

use std::path::{Path, PathBuf};

use a3s_ctd_core::CtdConfig;

/// Write an executable shell script named `name` into `dir`.
#[cfg(unix)]
pub(crate) fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Config that only finds tools inside `bin_dir`.
pub(crate) fn test_config(bin_dir: &Path) -> CtdConfig {
    CtdConfig {
        search_path: Some(bin_dir.to_string_lossy().to_string()),
        ..Default::default()
    }
}

/// A temp-dir prefix no other test uses.
pub(crate) fn unique_prefix(tag: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{}-{}-{}-", tag, std::process::id(), nanos)
}

/// Entries in the system temp dir whose name starts with `prefix`.
pub(crate) fn leaked_dirs(prefix: &str) -> Vec<PathBuf> {
    std::fs::read_dir(std::env::temp_dir())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(prefix))
        .map(|e| e.path())
        .collect()
}
