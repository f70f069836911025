use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Falta el campo `image` en el formulario.
    #[error("No image provided")]
    MissingInput,
    #[error("cannot decode image: {0}")]
    Decode(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("failed to save output image: {0}")]
    Persist(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Solo la falta de imagen es corregible por el cliente.
    pub fn is_client_error(&self) -> bool {
        matches!(self, DomainError::MissingInput)
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
