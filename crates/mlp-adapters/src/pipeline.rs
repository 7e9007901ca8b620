//! Definición fija del pipeline: Ingest → Transform → Fit → Evaluate.

use std::sync::Arc;
use std::time::Duration;

use mlp_core::{build_pipeline_definition, ArtifactSpec, PipelineConfig, PipelineDefinition, PipelineError, RunResult,
               Stage};
use mlp_domain::ClassificationMetrics;

use crate::artifacts::MetricsArtifact;
use crate::names::METRICS;
use crate::source::{source_from_spec, DataSource};
use crate::stages::{EvaluateStage, FitStage, IngestStage, TransformStage};

/// Pipeline de ML con la fuente y el timeout de la configuración.
pub fn ml_pipeline_definition(config: &PipelineConfig) -> Result<PipelineDefinition, PipelineError> {
    ml_pipeline_with_source(source_from_spec(&config.source), config.source_timeout)
}

pub fn ml_pipeline_with_source(source: Arc<dyn DataSource>,
                               source_timeout: Duration)
                               -> Result<PipelineDefinition, PipelineError> {
    let stages: Vec<Arc<dyn Stage>> = vec![Arc::new(IngestStage::new(source, source_timeout)),
                                           Arc::new(TransformStage::new()),
                                           Arc::new(FitStage::new()),
                                           Arc::new(EvaluateStage::new()),];
    build_pipeline_definition(stages)
}

/// Métricas de una corrida exitosa.
pub fn metrics_of(result: &RunResult) -> Option<ClassificationMetrics> {
    let artifact = result.output(METRICS.name)?;
    MetricsArtifact::from_artifact(artifact).ok().map(|m| m.0)
}
