use crate::{errors::PipelineError, model::Artifact};

/// Señal ligera emitida por un stage (no altera el resultado).
#[derive(Debug, Clone)]
pub struct StageSignal {
    pub signal: String,
    pub data: serde_json::Value,
}

/// Resultado abstracto de un intento.
#[derive(Debug)]
pub enum StageRunResult {
    Success { outputs: Vec<Artifact> },
    SuccessWithSignals { outputs: Vec<Artifact>, signals: Vec<StageSignal> },
    Failure { error: PipelineError },
}

impl From<Result<Vec<Artifact>, PipelineError>> for StageRunResult {
    fn from(res: Result<Vec<Artifact>, PipelineError>) -> Self {
        match res {
            Ok(outputs) => Self::Success { outputs },
            Err(error) => Self::Failure { error },
        }
    }
}
