//! Artifact del pipeline.
//!
//! Un `Artifact` es la unidad de datos intercambiada entre stages:
//! - `name` es el nombre lógico (p. ej. `raw-dataset`), que también es el
//!   nombre de archivo en el store.
//! - `format` etiqueta el tipo de dato; el executor no interpreta el `blob`.
//! - `hash` es blake3 sobre el `blob` y se calcula al construir, de modo que
//!   un artifact leído del store y uno recién producido son comparables.
use serde::{Deserialize, Serialize};

use crate::hashing::hash_bytes;

/// Etiqueta de formato de un artifact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ArtifactFormat {
    /// Tabla delimitada (CSV con cabecera).
    Tabular,
    /// Clasificador ajustado serializado.
    Model,
    /// Transformador de features ajustado serializado.
    Transformer,
    /// Registro de métricas clave/valor.
    Metrics,
}

impl ArtifactFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tabular => "tabular",
            Self::Model => "model",
            Self::Transformer => "transformer",
            Self::Metrics => "metrics",
        }
    }
}

/// Declaración de un artifact en la firma de un stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArtifactDecl {
    pub name: &'static str,
    pub format: ArtifactFormat,
}

impl ArtifactDecl {
    pub const fn new(name: &'static str, format: ArtifactFormat) -> Self {
        Self { name, format }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub format: ArtifactFormat,
    pub hash: String,
    pub blob: Vec<u8>,
}

impl Artifact {
    pub fn new(name: impl Into<String>, format: ArtifactFormat, blob: Vec<u8>) -> Self {
        let hash = hash_bytes(&blob);
        Self { name: name.into(),
               format,
               hash,
               blob }
    }

    pub fn len(&self) -> usize {
        self.blob.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blob.is_empty()
    }
}
