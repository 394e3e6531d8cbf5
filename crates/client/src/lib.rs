//! Headless explorer client: configuration, directories and logging for the
//! `explorer` binary.
pub mod config;
pub mod dirs;
pub mod logging;

pub use config::ClientConfig;
