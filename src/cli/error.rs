//! Aggregate CLI error type.

use crate::checkpoint::{CheckpointError, SearchError};
use crate::client::ApiError;
use crate::config::ConfigError;

/// Exit code for operator mistakes (bad flags, unknown checkpoint names).
pub const USAGE_EXIT_CODE: i32 = 2;

/// Exit code for runtime failures (network, API, persistence).
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Any error a CLI command can surface.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Profile or logging configuration problem
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Transport or API failure
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Checkpoint persistence failure
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    /// Failure while consuming a checkpointed search stream
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Failure writing rendered output
    #[error("output error: {0}")]
    Output(#[from] std::io::Error),

    /// Failure writing CSV output
    #[error("CSV output error: {0}")]
    Csv(#[from] csv::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// Referencing a checkpoint name that does not exist is an operator
    /// mistake, not a runtime failure, and exits with the usage code.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Checkpoint(CheckpointError::NotFound { .. }) => USAGE_EXIT_CODE,
            CliError::Search(SearchError::Checkpoint(CheckpointError::NotFound { .. })) => {
                USAGE_EXIT_CODE
            }
            _ => FAILURE_EXIT_CODE,
        }
    }
}
