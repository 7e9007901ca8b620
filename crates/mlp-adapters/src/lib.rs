//! mlp-adapters: capa de adaptación Dominio ↔ Core.
//!
//! Este crate provee:
//! - Nombres y declaraciones de los artifacts del pipeline (`names`).
//! - Artifacts tipados sobre `ArtifactSpec` (tablas CSV, objetos JSON).
//! - Fuentes de datos (`DataSource`): CSV en disco o dataset sintético.
//! - Los cuatro stages concretos: Ingest → Transform → Fit → Evaluate.
//! - La definición fija del pipeline (`ml_pipeline_definition`).
//!
//! El core sólo ve `Artifact { name, format, hash, blob }`; la semántica de ML
//! vive en `mlp-domain` y se traduce aquí.

pub mod artifacts;
pub mod errors;
pub mod names;
pub mod pipeline;
pub mod source;
pub mod stages;

pub use pipeline::{metrics_of, ml_pipeline_definition, ml_pipeline_with_source};
pub use source::{source_from_spec, CsvFileSource, DataSource, SyntheticSource};
pub use stages::{EvaluateStage, FitStage, IngestStage, TransformStage};
