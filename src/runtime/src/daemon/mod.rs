//! containerd supervision: private directory, generated config, process
//! lifecycle.

mod binary;
mod config;
mod instance;
mod sink;

pub use binary::find_binary;
pub use config::{
    DaemonConfig, DebugConfig, GrpcConfig, MetricsConfig, CONFIG_FILE, DEBUG_SOCKET, GRPC_SOCKET,
};
pub use instance::{DaemonInstance, DaemonState};
pub use sink::OutputSink;
