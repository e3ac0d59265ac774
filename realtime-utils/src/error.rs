//! Error type for logging setup and local file access

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum UtilsError {
    // === File Errors ===

    #[error("Cannot open {path} for writing: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // === Setup Errors ===

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UtilsError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, UtilsError>;
