//! Traducción de errores de dominio a la taxonomía del pipeline.

use mlp_core::PipelineError;
use mlp_domain::DomainError;

pub fn pipeline_error(e: DomainError) -> PipelineError {
    match e {
        DomainError::Schema(msg) => PipelineError::SchemaError(msg),
        DomainError::EmptySplit { train_rows, test_rows } => PipelineError::EmptySplit { train_rows, test_rows },
        DomainError::Training(msg) => PipelineError::TrainingError(msg),
        DomainError::DimensionMismatch { expected, found } => PipelineError::DimensionMismatch { expected, found },
        DomainError::Codec(msg) => PipelineError::Internal(format!("codec: {msg}")),
    }
}

/// Para entradas del entrenamiento: cualquier defecto de forma es fatal.
pub fn training_error(e: DomainError) -> PipelineError {
    match e {
        DomainError::Training(msg) | DomainError::Schema(msg) | DomainError::Codec(msg) => {
            PipelineError::TrainingError(msg)
        }
        other => pipeline_error(other),
    }
}
