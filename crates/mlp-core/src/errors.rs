//! Errores del core.
//!
//! `PipelineError` es la taxonomía que el executor registra contra un stage.
//! Es `Clone + Serialize` porque viaja dentro de los eventos (`StageFailed`,
//! `RunFailed`). `StoreError` es el contrato de error del `ArtifactStore`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum PipelineError {
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("schema error: {0}")]
    SchemaError(String),
    #[error("empty split (train rows = {train_rows}, test rows = {test_rows})")]
    EmptySplit { train_rows: usize, test_rows: usize },
    #[error("training error: {0}")]
    TrainingError(String),
    #[error("dimension mismatch: model was fit on {expected} features, got {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("io error: {0}")]
    Io(String),
    #[error("artifact not found: {0}")]
    NotFound(String),
    #[error("stage timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },
    #[error("run cancelled")]
    Cancelled,
    #[error("missing required inputs: {0:?}")]
    MissingInputs(Vec<String>),
    #[error("stage produced undeclared or incomplete outputs: {0}")]
    UndeclaredOutput(String),
    #[error("cannot decode artifact '{artifact}': {reason}")]
    Decode { artifact: String, reason: String },
    #[error("first stage must be source kind")]
    FirstStageMustBeSource,
    #[error("invalid pipeline definition: {0}")]
    InvalidDefinition(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Nombre estable del tipo de error (lo que el coordinador muestra).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceUnavailable(_) => "SourceUnavailable",
            Self::SchemaError(_) => "SchemaError",
            Self::EmptySplit { .. } => "EmptySplitError",
            Self::TrainingError(_) => "TrainingError",
            Self::DimensionMismatch { .. } => "DimensionMismatchError",
            Self::Io(_) => "IOError",
            Self::NotFound(_) => "NotFoundError",
            Self::Timeout { .. } => "Timeout",
            Self::Cancelled => "Cancelled",
            Self::MissingInputs(_) => "MissingInputs",
            Self::UndeclaredOutput(_) => "UndeclaredOutput",
            Self::Decode { .. } => "DecodeError",
            Self::FirstStageMustBeSource => "FirstStageMustBeSource",
            Self::InvalidDefinition(_) => "InvalidDefinition",
            Self::Internal(_) => "Internal",
        }
    }
}

/// Clasificación usada por la política de reintentos `Classified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Puede desaparecer sin cambios aguas arriba (red, disco, timeout).
    Retryable,
    /// Violación de contrato de datos; reintentar produce el mismo fallo.
    Permanent,
}

/// Clasifica un error según si tiene sentido reintentarlo.
pub fn classify_error(err: &PipelineError) -> ErrorClass {
    match err {
        PipelineError::SourceUnavailable(_)
        | PipelineError::Io(_)
        | PipelineError::NotFound(_)
        | PipelineError::Timeout { .. } => ErrorClass::Retryable,
        _ => ErrorClass::Permanent,
    }
}

/// Errores del contrato `ArtifactStore`.
#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum StoreError {
    #[error("artifact store io: {0}")]
    Io(String),
    #[error("artifact '{0}' not found")]
    NotFound(String),
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io(msg) => PipelineError::Io(msg),
            StoreError::NotFound(name) => PipelineError::NotFound(name),
        }
    }
}
