//! A3S ctd Runtime - isolated containerd supervision.
//!
//! Starts a private containerd instance in a temporary directory, fetches
//! images into it through `dist`, and packages its content store as tar.

pub mod archive;
pub mod daemon;
pub mod fetch;
pub mod oci;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export common types
pub use archive::{
    build_bundle, bundle, bundle_with_cancel, prefix_dirs, store, store_dir, STORE_PREFIX,
};
pub use daemon::{find_binary, DaemonConfig, DaemonInstance, DaemonState, OutputSink};
pub use fetch::Fetcher;
pub use oci::normalize;

/// a3s-ctd runtime version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
