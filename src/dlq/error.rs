// Dead Letter Queue error type

use thiserror::Error;

pub type DlqResult<T> = std::result::Result<T, DlqError>;

#[derive(Error, Debug)]
pub enum DlqError {
    #[error("DLQ item not found: {0}")]
    NotFound(uuid::Uuid),

    #[error("DLQ storage error: {0}")]
    StorageError(String),

    #[error("DLQ processing error: {0}")]
    ProcessingError(String),
}

impl From<crate::domain::CoreError> for DlqError {
    fn from(e: crate::domain::CoreError) -> Self {
        DlqError::StorageError(e.to_string())
    }
}
