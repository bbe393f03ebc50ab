//! Tar archives built from a daemon instance.
//!
//! - [`store`]: the instance's content store, rooted at `var/lib/containerd/`
//! - [`bundle`]: an image name and its JSON config, followed by a fetch

mod bundle;
mod prefix;
mod snapshot;

pub use bundle::{build_bundle, bundle, bundle_with_cancel, BUNDLE_CONFIG, BUNDLE_IMAGE};
pub use prefix::prefix_dirs;
pub use snapshot::{store, store_dir, STORE_PREFIX};
