//! Error types for the suite runner, configuration and CLI layers

use std::io;

use crate::core::HarnessError;

#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Case '{case}' failed: {source}")]
    Harness {
        case: String,
        #[source]
        source: HarnessError,
    },

    #[error("Logging setup failed: {0}")]
    Logging(String),
}
