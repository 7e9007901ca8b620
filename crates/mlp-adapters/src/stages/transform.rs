//! TransformStage: split 80/20 determinista + standard scaler.
//!
//! El scaler se ajusta sólo con train y se aplica a train y test. Los cinco
//! outputs se emiten juntos; si algo falla no se emite ninguno.

use log::info;
use mlp_core::{ArtifactDecl, ExecutionContext, PipelineError, Stage, StageKind, StageRunResult};
use mlp_domain::csv_codec::read_table;
use mlp_domain::{LabeledDataset, StandardScaler, LABEL_COLUMN, SPLIT_SEED, TEST_RATIO};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::emit;
use crate::artifacts::{LabelsArtifact, ScalerArtifact, TableArtifact};
use crate::errors::pipeline_error;
use crate::names::{RAW_DATASET, SCALER, TEST_FEATURES, TEST_LABELS, TRAIN_FEATURES, TRAIN_LABELS};

const INPUTS: [ArtifactDecl; 1] = [RAW_DATASET];
const OUTPUTS: [ArtifactDecl; 5] = [TRAIN_FEATURES, TEST_FEATURES, TRAIN_LABELS, TEST_LABELS, SCALER];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransformParams {
    pub test_ratio: f64,
    pub seed: u64,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self { test_ratio: TEST_RATIO,
               seed: SPLIT_SEED }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransformStage {
    params: TransformParams,
}

impl TransformStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: TransformParams) -> Self {
        Self { params }
    }

    fn transform(&self, ctx: &ExecutionContext) -> Result<Vec<mlp_core::Artifact>, PipelineError> {
        let p: TransformParams = ctx.params_as()?;
        let raw = read_table(&ctx.input(RAW_DATASET.name)?.blob).map_err(pipeline_error)?;
        let dataset = LabeledDataset::from_table(&raw, LABEL_COLUMN).map_err(pipeline_error)?;
        let (train, test) = dataset.split(p.test_ratio, p.seed).map_err(pipeline_error)?;

        let scaler = StandardScaler::new().fit(&train.features).map_err(pipeline_error)?;
        let x_train = scaler.transform(&train.features).map_err(pipeline_error)?;
        let x_test = scaler.transform(&test.features).map_err(pipeline_error)?;
        info!("transform: train_rows={} test_rows={} features={}",
              train.len(),
              test.len(),
              scaler.n_features());

        Ok(vec![emit(TRAIN_FEATURES, &TableArtifact(x_train))?,
                emit(TEST_FEATURES, &TableArtifact(x_test))?,
                emit(TRAIN_LABELS, &LabelsArtifact(train.labels))?,
                emit(TEST_LABELS, &LabelsArtifact(test.labels))?,
                emit(SCALER, &ScalerArtifact(scaler))?])
    }
}

impl Stage for TransformStage {
    fn id(&self) -> &str {
        "transform"
    }

    fn kind(&self) -> StageKind {
        StageKind::Transform
    }

    fn inputs(&self) -> &[ArtifactDecl] {
        &INPUTS
    }

    fn outputs(&self) -> &[ArtifactDecl] {
        &OUTPUTS
    }

    fn base_params(&self) -> Value {
        serde_json::to_value(&self.params).unwrap_or(Value::Null)
    }

    fn run(&self, ctx: &ExecutionContext) -> StageRunResult {
        self.transform(ctx).into()
    }
}
