//! EvaluateStage (Sink): métricas del modelo sobre test.

use log::info;
use mlp_core::{Artifact, ArtifactDecl, ExecutionContext, PipelineError, Stage, StageKind, StageRunResult};
use mlp_domain::csv_codec::read_table;
use mlp_domain::dataset::labels_from_table;
use mlp_domain::ClassificationMetrics;
use serde_json::{json, Value};

use super::emit;
use crate::artifacts::{MetricsArtifact, ModelArtifact};
use crate::errors::pipeline_error;
use crate::names::{METRICS, MODEL, TEST_FEATURES, TEST_LABELS};

const INPUTS: [ArtifactDecl; 3] = [MODEL, TEST_FEATURES, TEST_LABELS];
const OUTPUTS: [ArtifactDecl; 1] = [METRICS];

#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluateStage;

impl EvaluateStage {
    pub fn new() -> Self {
        Self
    }

    fn evaluate(&self, ctx: &ExecutionContext) -> Result<Vec<Artifact>, PipelineError> {
        let ModelArtifact(model) = ctx.decode(MODEL.name)?;
        let x = read_table(&ctx.input(TEST_FEATURES.name)?.blob).map_err(pipeline_error)?;
        let y = read_table(&ctx.input(TEST_LABELS.name)?.blob).and_then(|t| labels_from_table(&t))
                                                                .map_err(pipeline_error)?;
        if x.n_rows() != y.len() {
            return Err(PipelineError::SchemaError(format!("{} test rows but {} test labels", x.n_rows(), y.len())));
        }
        let predictions = model.predict(&x).map_err(pipeline_error)?;
        let metrics = ClassificationMetrics::compute(&y, &predictions).map_err(pipeline_error)?;
        info!("evaluate: accuracy={:.4} precision={:.4} recall={:.4} f1={:.4}",
              metrics.accuracy,
              metrics.precision,
              metrics.recall,
              metrics.f1);
        Ok(vec![emit(METRICS, &MetricsArtifact(metrics))?])
    }
}

impl Stage for EvaluateStage {
    fn id(&self) -> &str {
        "evaluate"
    }

    fn kind(&self) -> StageKind {
        StageKind::Sink
    }

    fn inputs(&self) -> &[ArtifactDecl] {
        &INPUTS
    }

    fn outputs(&self) -> &[ArtifactDecl] {
        &OUTPUTS
    }

    fn base_params(&self) -> Value {
        json!({ "positive_label": 1, "zero_division": 0 })
    }

    fn run(&self, ctx: &ExecutionContext) -> StageRunResult {
        self.evaluate(ctx).into()
    }
}
