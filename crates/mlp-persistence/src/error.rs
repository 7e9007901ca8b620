//! Errores de persistencia.
//! Mapea errores de IO a variantes semánticas y éstas al contrato del store.

use std::io;
use std::path::PathBuf;

use mlp_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid artifact name '{0}'")]
    InvalidName(String),
    #[error("artifact '{0}' not found")]
    NotFound(String),
}

impl PersistenceError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io { path: path.into(),
                   source }
    }

    /// Errores de IO que suelen desaparecer al reintentar.
    pub fn is_transient(&self) -> bool {
        matches!(self,
                 Self::Io { source, .. } if matches!(source.kind(),
                                                     io::ErrorKind::Interrupted
                                                     | io::ErrorKind::WouldBlock
                                                     | io::ErrorKind::TimedOut))
    }
}

impl From<PersistenceError> for StoreError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound(name) => StoreError::NotFound(name),
            other => StoreError::Io(other.to_string()),
        }
    }
}

/// Errores al construir la configuración desde el entorno.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}' ({reason})")]
    Invalid { var: &'static str, value: String, reason: String },
}
