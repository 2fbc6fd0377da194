use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
    #[error("please log in to save your changes")]
    Unauthenticated,
    #[error("failed to save changes: {0}")]
    Backend(#[from] BackendError),
}

impl SaveError {
    pub fn is_auth(&self) -> bool {
        matches!(self, SaveError::Unauthenticated)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("no field is bound to {0:?}")]
    UnknownField(String),
    #[error("{action} is not available on this plan")]
    NotPermitted { action: &'static str },
    #[error("item {index} is out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("field {0:?} is not editable")]
    Disabled(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse editor config: {0}")]
    Parse(#[from] serde_json::Error),
}
