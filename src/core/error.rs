use std::io;

/// Failures raised by the harness itself.
///
/// Failures of the unit of work are not represented here: panics propagate
/// to the caller unchanged.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("invalid repetition count {value}: must be a non-negative integer")]
    InvalidCount { value: String },

    #[error("failed to spawn worker thread after launching {launched} unit(s): {source}")]
    Spawn {
        launched: usize,
        #[source]
        source: io::Error,
    },

    #[error("concurrent unit was cancelled before completing")]
    Cancelled,
}
