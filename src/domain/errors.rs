use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("operation failed: {0}")]
    OperationFailed(String),
    #[error("cannot decode image: {0}")]
    Decode(String),
    #[error("malformed detection: {0}")]
    MalformedDetection(String),
    #[error("class id {class_id} out of range for {len} labels")]
    LabelOutOfRange { class_id: usize, len: usize },
}

impl DomainError {
    /// Failures caused by what the caller sent, as opposed to the service itself.
    pub fn is_client_error(&self) -> bool {
        matches!(self, DomainError::InvalidInput(_) | DomainError::Decode(_))
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
