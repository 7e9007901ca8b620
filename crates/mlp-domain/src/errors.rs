// errors.rs
use thiserror::Error;

/// Errores de las computaciones del dominio (split, scaler, modelo, métricas).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    #[error("schema: {0}")]
    Schema(String),

    #[error("empty split (train rows = {train_rows}, test rows = {test_rows})")]
    EmptySplit { train_rows: usize, test_rows: usize },

    #[error("training: {0}")]
    Training(String),

    #[error("dimension mismatch: expected {expected} features, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("codec: {0}")]
    Codec(String),
}

impl From<csv::Error> for DomainError {
    fn from(e: csv::Error) -> Self {
        DomainError::Codec(e.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Codec(e.to_string())
    }
}
