//! A3S ctd CLI - fetch images into a private containerd and archive them.

pub mod commands;
pub mod output;
