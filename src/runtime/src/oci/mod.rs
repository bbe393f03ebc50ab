//! OCI image naming.

mod reference;

pub use reference::normalize;
