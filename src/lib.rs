//! mlpipe Rust Library
//!
//! Fachada sobre los crates del workspace:
//! - `core`: executor, store, eventos y coordinador de corridas.
//! - `domain`: tablas, split, scaler, regresión logística y métricas.
//! - `adapters`: los cuatro stages y la definición del pipeline.
//! - `persistence`: store en disco y configuración por entorno.
//!
//! El binario vive en `crates/mlp-cli` (`mlpipe`).

pub use mlp_adapters as adapters;
pub use mlp_core as core;
pub use mlp_domain as domain;
pub use mlp_persistence as persistence;

pub use mlp_adapters::{metrics_of, ml_pipeline_definition, ml_pipeline_with_source};
pub use mlp_core::{PipelineConfig, PipelineExecutor, RunCoordinator, RunResult};
pub use mlp_persistence::{pipeline_config_from_env, FsArtifactStore};

/// Ejecuta el pipeline completo sobre el store en disco descrito por `config`.
pub fn run_pipeline(config: &PipelineConfig) -> Result<RunResult, mlp_core::PipelineError> {
    let definition = ml_pipeline_definition(config)?;
    let store = FsArtifactStore::from_config(config);
    Ok(PipelineExecutor::new(store, config.run.clone()).execute_run(&definition))
}
