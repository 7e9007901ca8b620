//! Artifacts tipados sobre el `Artifact` neutro.
//!
//! Un tipo que implementa `ArtifactSpec` sabe codificarse a bytes y
//! decodificarse verificando el formato. El executor sigue viendo sólo
//! `Artifact { name, format, hash, blob }`.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use super::{Artifact, ArtifactFormat};
use crate::errors::PipelineError;

/// Errores posibles al decodificar un artifact tipado.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArtifactDecodeError {
    #[error("format mismatch: expected {expected:?}, found {found:?}")]
    FormatMismatch { expected: ArtifactFormat, found: ArtifactFormat },
    #[error("deserialize: {0}")]
    Deserialize(String),
    #[error("validation: {0}")]
    Validation(String),
}

pub trait ArtifactSpec: Sized {
    const FORMAT: ArtifactFormat;

    fn encode(&self) -> Result<Vec<u8>, PipelineError>;

    fn decode(blob: &[u8]) -> Result<Self, ArtifactDecodeError>;

    /// Validación semántica ligera, sin efectos secundarios.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    fn into_artifact(&self, name: &str) -> Result<Artifact, PipelineError> {
        Ok(Artifact::new(name, Self::FORMAT, self.encode()?))
    }

    fn from_artifact(a: &Artifact) -> Result<Self, ArtifactDecodeError> {
        if a.format != Self::FORMAT {
            return Err(ArtifactDecodeError::FormatMismatch { expected: Self::FORMAT,
                                                             found: a.format });
        }
        let decoded = Self::decode(&a.blob)?;
        decoded.validate().map_err(ArtifactDecodeError::Validation)?;
        Ok(decoded)
    }
}

/// Codificación JSON con indentación estable (objetos ajustados, métricas).
pub fn encode_json<T: Serialize>(value: &T) -> Result<Vec<u8>, PipelineError> {
    serde_json::to_vec_pretty(value).map_err(|e| PipelineError::Internal(format!("serialize: {e}")))
}

pub fn decode_json<T: DeserializeOwned>(blob: &[u8]) -> Result<T, ArtifactDecodeError> {
    serde_json::from_slice(blob).map_err(|e| ArtifactDecodeError::Deserialize(e.to_string()))
}
