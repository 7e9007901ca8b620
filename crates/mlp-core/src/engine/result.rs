use serde::Serialize;
use uuid::Uuid;

use crate::model::Artifact;
use crate::repo::{RunStatus, StageSlot};

/// Resultado de `execute_run`: estado global, estado por stage y los outputs
/// del último stage cuando la corrida terminó bien.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub owner: Option<String>,
    pub status: RunStatus,
    pub stages: Vec<StageSlot>,
    pub run_fingerprint: Option<String>,
    #[serde(skip)]
    pub terminal_outputs: Vec<Artifact>,
}

impl RunResult {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Succeeded
    }

    /// Id del primer stage que falló, si lo hay.
    pub fn failed_stage(&self) -> Option<&str> {
        match &self.status {
            RunStatus::Failed { stage_id, .. } => Some(stage_id.as_str()),
            _ => None,
        }
    }

    pub fn stage(&self, stage_id: &str) -> Option<&StageSlot> {
        self.stages.iter().find(|s| s.stage_id == stage_id)
    }

    pub fn output(&self, name: &str) -> Option<&Artifact> {
        self.terminal_outputs.iter().find(|a| a.name == name)
    }
}
