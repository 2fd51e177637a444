//! Harness error types

use rgw_client::{ClientError, UploadError};
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors raised while loading or running cases
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("case file error: {0}")]
    CaseFile(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("unsupported para type: {0}")]
    UnsupportedParamType(String),

    #[error("{operation} takes a {expected} parameter, case gave {actual}")]
    ParameterMismatch {
        operation: String,
        expected: &'static str,
        actual: String,
    },

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Upload(#[from] UploadError),
}
