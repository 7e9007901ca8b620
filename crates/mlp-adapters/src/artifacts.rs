//! Artifacts tipados del pipeline.
//!
//! - Tablas (`raw-dataset`, features, labels) → CSV con cabecera.
//! - Objetos ajustados (`scaler`, `model`) → JSON.
//! - Métricas → JSON clave/valor.
//!
//! Los blobs son deterministas: el mismo valor produce los mismos bytes, y
//! por lo tanto el mismo hash.

use mlp_core::model::{decode_json, encode_json, ArtifactDecodeError};
use mlp_core::{ArtifactFormat, ArtifactSpec, PipelineError};
use mlp_domain::csv_codec::{read_table, write_table};
use mlp_domain::dataset::{labels_from_table, labels_table};
use mlp_domain::{ClassificationMetrics, FittedStandardScaler, Table, TrainedLogisticRegression};

use crate::errors::pipeline_error;

/// Tabla numérica (dataset crudo o features).
#[derive(Debug, Clone, PartialEq)]
pub struct TableArtifact(pub Table);

impl ArtifactSpec for TableArtifact {
    const FORMAT: ArtifactFormat = ArtifactFormat::Tabular;

    fn encode(&self) -> Result<Vec<u8>, PipelineError> {
        write_table(&self.0).map_err(pipeline_error)
    }

    fn decode(blob: &[u8]) -> Result<Self, ArtifactDecodeError> {
        read_table(blob).map(Self)
                        .map_err(|e| ArtifactDecodeError::Deserialize(e.to_string()))
    }
}

/// Etiquetas binarias en una única columna `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelsArtifact(pub Vec<u8>);

impl ArtifactSpec for LabelsArtifact {
    const FORMAT: ArtifactFormat = ArtifactFormat::Tabular;

    fn encode(&self) -> Result<Vec<u8>, PipelineError> {
        write_table(&labels_table(&self.0)).map_err(pipeline_error)
    }

    fn decode(blob: &[u8]) -> Result<Self, ArtifactDecodeError> {
        read_table(blob).and_then(|t| labels_from_table(&t))
                        .map(Self)
                        .map_err(|e| ArtifactDecodeError::Deserialize(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalerArtifact(pub FittedStandardScaler);

impl ArtifactSpec for ScalerArtifact {
    const FORMAT: ArtifactFormat = ArtifactFormat::Transformer;

    fn encode(&self) -> Result<Vec<u8>, PipelineError> {
        encode_json(&self.0)
    }

    fn decode(blob: &[u8]) -> Result<Self, ArtifactDecodeError> {
        decode_json(blob).map(Self)
    }

    fn validate(&self) -> Result<(), String> {
        self.0.validate()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact(pub TrainedLogisticRegression);

impl ArtifactSpec for ModelArtifact {
    const FORMAT: ArtifactFormat = ArtifactFormat::Model;

    fn encode(&self) -> Result<Vec<u8>, PipelineError> {
        encode_json(&self.0)
    }

    fn decode(blob: &[u8]) -> Result<Self, ArtifactDecodeError> {
        decode_json(blob).map(Self)
    }

    fn validate(&self) -> Result<(), String> {
        self.0.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsArtifact(pub ClassificationMetrics);

impl ArtifactSpec for MetricsArtifact {
    const FORMAT: ArtifactFormat = ArtifactFormat::Metrics;

    fn encode(&self) -> Result<Vec<u8>, PipelineError> {
        encode_json(&self.0)
    }

    fn decode(blob: &[u8]) -> Result<Self, ArtifactDecodeError> {
        decode_json(blob).map(Self)
    }

    fn validate(&self) -> Result<(), String> {
        self.0.validate()
    }
}
