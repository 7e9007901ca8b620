//! Fuentes del dataset crudo.
//!
//! Una fuente entrega la tabla completa (features + `target`). No valida la
//! etiqueta: eso es contrato de Transform. Sí exige cabecera, celdas
//! numéricas y al menos una fila.

use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;

use log::debug;
use mlp_core::{DataSourceSpec, PipelineError};
use mlp_domain::csv_codec::read_table;
use mlp_domain::synthetic::make_classification;
use mlp_domain::Table;
use serde_json::{json, Value};

use crate::errors::pipeline_error;

pub trait DataSource: Send + Sync + Debug {
    /// Descripción determinista; entra en los params de Ingest.
    fn describe(&self) -> Value;

    fn load(&self) -> Result<Table, PipelineError>;
}

/// CSV en disco. Archivo ausente o ilegible → `SourceUnavailable`.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DataSource for CsvFileSource {
    fn describe(&self) -> Value {
        json!({"kind": "csv", "path": self.path.display().to_string()})
    }

    fn load(&self) -> Result<Table, PipelineError> {
        let bytes = std::fs::read(&self.path).map_err(|e| {
                                                  PipelineError::SourceUnavailable(format!("{}: {e}",
                                                                                           self.path.display()))
                                              })?;
        debug!("source:csv path={} bytes={}", self.path.display(), bytes.len());
        let table = read_table(&bytes).map_err(pipeline_error)?;
        non_empty(table)
    }
}

/// Dataset sintético determinista.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticSource {
    pub rows: usize,
    pub features: usize,
    pub seed: u64,
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self { rows: 569,
               features: 30,
               seed: 42 }
    }
}

impl DataSource for SyntheticSource {
    fn describe(&self) -> Value {
        json!({"kind": "synthetic", "rows": self.rows, "features": self.features, "seed": self.seed})
    }

    fn load(&self) -> Result<Table, PipelineError> {
        let ds = make_classification(self.rows, self.features, self.seed).map_err(pipeline_error)?;
        non_empty(ds.to_table())
    }
}

fn non_empty(table: Table) -> Result<Table, PipelineError> {
    if table.n_rows() == 0 {
        return Err(PipelineError::SchemaError("dataset has no rows".into()));
    }
    Ok(table)
}

pub fn source_from_spec(spec: &DataSourceSpec) -> Arc<dyn DataSource> {
    match spec {
        DataSourceSpec::Synthetic { rows, features, seed } => Arc::new(SyntheticSource { rows: *rows,
                                                                                        features: *features,
                                                                                        seed: *seed }),
        DataSourceSpec::Csv { path } => Arc::new(CsvFileSource::new(path.clone())),
    }
}
