use std::path::PathBuf;

use sureclick_core_types::EngineError;
use thiserror::Error;

/// Failures while layering or validating an [`crate::EnginePolicy`].
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("cannot read policy file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed policy ({origin}): {message}")]
    Malformed { origin: String, message: String },
    #[error("{0} must be greater than 0")]
    ZeroDuration(String),
    #[error("unsupported policy path: {0}")]
    UnsupportedPath(String),
    #[error("invalid value for {path}: {reason}")]
    InvalidValue { path: String, reason: String },
}

impl PolicyError {
    pub(crate) fn malformed(origin: impl Into<String>, err: impl std::fmt::Display) -> Self {
        PolicyError::Malformed {
            origin: origin.into(),
            message: err.to_string(),
        }
    }
}

impl From<PolicyError> for EngineError {
    fn from(value: PolicyError) -> Self {
        EngineError::InvalidSpec(value.to_string())
    }
}
