//! Builder para `PipelineExecutor`.
//!
//! Obliga a declarar primero el stage fuente y luego encadenar el resto. La
//! validación completa (ids únicos, inputs producidos antes) ocurre en
//! `build`, que devuelve error en vez de entrar en pánico.
//!
//! ```ignore
//! let mut executor = PipelineExecutor::builder(store, RunConfig::default())
//!     .first_stage(IngestStage::new(source))
//!     .add_stage(TransformStage::new())
//!     .add_stage(FitStage::new())
//!     .add_stage(EvaluateStage::new())
//!     .build()?;
//! let result = executor.run()?;
//! ```

use std::sync::Arc;

use super::core::PipelineExecutor;
use crate::config::RunConfig;
use crate::errors::PipelineError;
use crate::repo::build_pipeline_definition;
use crate::stage::Stage;
use crate::store::ArtifactStore;

/// Estado inicial: store y configuración presentes, sin stages.
#[derive(Debug)]
pub struct ExecutorBuilderInit<S: ArtifactStore> {
    pub store: S,
    pub config: RunConfig,
}

impl<S: ArtifactStore> ExecutorBuilderInit<S> {
    #[inline]
    pub fn first_stage<T: Stage + 'static>(self, stage: T) -> ExecutorBuilder<S> {
        ExecutorBuilder { store: self.store,
                          config: self.config,
                          stages: vec![Arc::new(stage)] }
    }
}

#[derive(Debug)]
pub struct ExecutorBuilder<S: ArtifactStore> {
    store: S,
    config: RunConfig,
    stages: Vec<Arc<dyn Stage>>,
}

impl<S: ArtifactStore> ExecutorBuilder<S> {
    #[inline]
    pub fn add_stage<T: Stage + 'static>(mut self, stage: T) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Valida la definición y la fija como definición por defecto.
    pub fn build(self) -> Result<PipelineExecutor<S>, PipelineError> {
        let definition = build_pipeline_definition(self.stages)?;
        let mut executor = PipelineExecutor::new(self.store, self.config);
        executor.set_default_definition(definition);
        Ok(executor)
    }
}
