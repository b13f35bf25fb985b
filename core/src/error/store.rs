use thiserror::Error;

use super::{ErrorCode, ModelError};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("task not found: {0}")]
    NotFound(String),

    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serde(String),

    #[error("invalid task record: {0}")]
    Model(#[from] ModelError),
}

impl StoreError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::TaskNotFound,
            Self::Model(e) => e.error_code(),
            _ => ErrorCode::StorageError,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}
