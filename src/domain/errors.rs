use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Model load failed: {0}")]
    ModelLoad(String),
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
