//! Shared utilities that glue the different domains together.
pub mod config;
pub mod error;
pub mod log;
pub mod time;

pub use config::EngineCfg;
pub use error::{ErrorCode, HyperError, HyperResult};
