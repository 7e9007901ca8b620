//! FitStage: entrena la regresión logística sobre train.
//!
//! La no convergencia no es fatal: el modelo se emite igual junto con la
//! señal `CONVERGENCE_WARNING`.

use log::{info, warn};
use mlp_core::constants::SIGNAL_CONVERGENCE_WARNING;
use mlp_core::{ArtifactDecl, ExecutionContext, PipelineError, Stage, StageKind, StageRunResult, StageSignal};
use mlp_domain::csv_codec::read_table;
use mlp_domain::dataset::labels_from_table;
use mlp_domain::{LogisticRegression, LogisticRegressionConfig};
use serde_json::{json, Value};

use super::emit;
use crate::artifacts::ModelArtifact;
use crate::errors::training_error;
use crate::names::{MODEL, TRAIN_FEATURES, TRAIN_LABELS};

const INPUTS: [ArtifactDecl; 2] = [TRAIN_FEATURES, TRAIN_LABELS];
const OUTPUTS: [ArtifactDecl; 1] = [MODEL];

#[derive(Debug, Clone, Default)]
pub struct FitStage {
    config: LogisticRegressionConfig,
}

impl FitStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LogisticRegressionConfig) -> Self {
        Self { config }
    }
}

impl Stage for FitStage {
    fn id(&self) -> &str {
        "fit"
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
        serde_json::to_value(&self.config).unwrap_or(Value::Null)
    }

    fn run(&self, ctx: &ExecutionContext) -> StageRunResult {
        let fitted = (|| -> Result<_, PipelineError> {
            let config: LogisticRegressionConfig = ctx.params_as()?;
            let x = read_table(&ctx.input(TRAIN_FEATURES.name)?.blob).map_err(training_error)?;
            let y = read_table(&ctx.input(TRAIN_LABELS.name)?.blob).and_then(|t| labels_from_table(&t))
                                                                     .map_err(training_error)?;
            let model = LogisticRegression::new(config).fit(&x, &y).map_err(training_error)?;
            let artifact = emit(MODEL, &ModelArtifact(model.clone()))?;
            Ok((model, artifact))
        })();

        match fitted {
            Err(error) => StageRunResult::Failure { error },
            Ok((model, artifact)) if model.converged => {
                info!("fit: converged n_iter={}", model.n_iter);
                StageRunResult::Success { outputs: vec![artifact] }
            }
            Ok((model, artifact)) => {
                warn!("fit: did not converge within max_iter={}", model.config.max_iter);
                let signal = StageSignal { signal: SIGNAL_CONVERGENCE_WARNING.to_string(),
                                           data: json!({ "n_iter": model.n_iter, "max_iter": model.config.max_iter }) };
                StageRunResult::SuccessWithSignals { outputs: vec![artifact],
                                                     signals: vec![signal] }
            }
        }
    }
}
