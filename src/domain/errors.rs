use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("No encontrado: {0}")]
    NotFound(String),
    #[error("Entrada inválida: {0}")]
    InvalidInput(String),
    #[error("Error de operación: {0}")]
    OperationFailed(String),
    #[error("Error de inferencia: {0}")]
    Inference(String),
    #[error("Error de almacenamiento: {0}")]
    Storage(#[from] std::io::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;

/// Fallo de un fichero concreto dentro de un lote; aborta el resto del lote.
#[derive(Debug, Error)]
#[error("Failed to process file {filename}: {source}")]
pub struct FileFailure {
    pub filename: String,
    #[source]
    pub source: DomainError,
}
