//! realtime-utils: shared plumbing for the realtime crates
//!
//! Logging setup on top of `tracing-subscriber`, XDG path helpers for
//! configuration and log files, and the error type those helpers return.

pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Result, UtilsError};
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogOutput, LOG_ENV_VAR};
pub use paths::{config_dir, config_file, ensure_dir, log_dir, state_dir};
