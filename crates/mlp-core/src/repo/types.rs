//! Tipos de repositorio: estado reconstruido (`RunInstance`) y definición
//! (`PipelineDefinition`).
//!
//! El repositorio aplica un replay lineal: consume eventos en orden y
//! actualiza un slot por stage. Sólo guarda hashes de outputs; los bytes
//! viven en el `ArtifactStore`.
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::errors::PipelineError;
use crate::event::{RunEvent, RunEventKind};
use crate::hashing::hash_value;
use crate::stage::{Stage, StageKind, StageStatus};

/// Estado agregado de una corrida.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Pending,
    Running,
    Succeeded,
    /// Primer stage que falló y su error.
    Failed { stage_id: String, error: PipelineError },
    Cancelled { stage_id: Option<String> },
}

#[derive(Debug, Clone)]
pub struct RunInstance {
    pub id: Uuid,
    pub owner: Option<String>,
    pub stages: Vec<StageSlot>,
    pub cursor: usize,
    pub status: RunStatus,
    pub run_fingerprint: Option<String>,
}

/// Estado de un stage en la instancia.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSlot {
    pub stage_id: String,
    pub status: StageStatus,
    pub attempts: u32,
    pub fingerprint: Option<String>,
    pub outputs: Vec<String>, // hashes
    pub signals: Vec<String>,
    pub last_error: Option<PipelineError>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl StageSlot {
    fn pending(stage_id: &str) -> Self {
        Self { stage_id: stage_id.to_string(),
               status: StageStatus::Pending,
               attempts: 0,
               fingerprint: None,
               outputs: vec![],
               signals: vec![],
               last_error: None,
               started_at: None,
               finished_at: None }
    }
}

/// Trait para reconstruir (`replay`) el estado de una corrida a partir de eventos.
pub trait RunRepository {
    fn load(&self, run_id: Uuid, events: &[RunEvent], definition: &PipelineDefinition) -> RunInstance;
}

/// Definición inmutable del pipeline.
#[derive(Clone)]
pub struct PipelineDefinition {
    pub stages: Vec<Arc<dyn Stage>>,
    pub definition_hash: String,
}

impl std::fmt::Debug for PipelineDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineDefinition")
         .field("stages", &self.stage_ids())
         .field("definition_hash", &self.definition_hash)
         .finish()
    }
}

impl PipelineDefinition {
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage_ids(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.id()).collect()
    }

    pub fn position(&self, stage_id: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.id() == stage_id)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRunRepository;

impl InMemoryRunRepository {
    pub fn new() -> Self {
        Self
    }
}

impl RunRepository for InMemoryRunRepository {
    fn load(&self, run_id: Uuid, events: &[RunEvent], definition: &PipelineDefinition) -> RunInstance {
        let mut stages: Vec<StageSlot> = definition.stages.iter().map(|s| StageSlot::pending(s.id())).collect();
        let mut status = RunStatus::Pending;
        let mut owner = None;
        let mut run_fingerprint = None;
        for ev in events {
            match &ev.kind {
                RunEventKind::RunInitialized { owner: o, .. } => {
                    owner = Some(o.clone());
                    status = RunStatus::Running;
                }
                RunEventKind::StageStarted { stage_index, attempt, .. } => {
                    if let Some(slot) = stages.get_mut(*stage_index) {
                        slot.status = StageStatus::Running;
                        slot.attempts = *attempt;
                        if slot.started_at.is_none() {
                            slot.started_at = Some(ev.ts);
                        }
                        slot.finished_at = None;
                    }
                }
                RunEventKind::StageFinished { stage_index,
                                              outputs,
                                              fingerprint,
                                              .. } => {
                    if let Some(slot) = stages.get_mut(*stage_index) {
                        slot.status = StageStatus::Succeeded;
                        slot.fingerprint = Some(fingerprint.clone());
                        slot.outputs = outputs.clone();
                        slot.finished_at = Some(ev.ts);
                    }
                }
                RunEventKind::StageSignal { stage_index, signal, .. } => {
                    if let Some(slot) = stages.get_mut(*stage_index) {
                        slot.signals.push(signal.clone());
                    }
                }
                RunEventKind::StageFailed { stage_index,
                                            error,
                                            fingerprint,
                                            .. } => {
                    if let Some(slot) = stages.get_mut(*stage_index) {
                        slot.status = StageStatus::Failed;
                        slot.fingerprint = Some(fingerprint.clone());
                        slot.last_error = Some(error.clone());
                        slot.finished_at = Some(ev.ts);
                    }
                }
                RunEventKind::RetryScheduled { .. } => {}
                RunEventKind::RunCompleted { run_fingerprint: fp } => {
                    status = RunStatus::Succeeded;
                    run_fingerprint = Some(fp.clone());
                }
                RunEventKind::RunFailed { stage_id, error } => {
                    status = RunStatus::Failed { stage_id: stage_id.clone(),
                                                 error: error.clone() };
                }
                RunEventKind::RunCancelled { stage_id } => {
                    status = RunStatus::Cancelled { stage_id: stage_id.clone() };
                }
            }
        }
        let cursor = stages.iter()
                           .position(|s| s.status != StageStatus::Succeeded)
                           .unwrap_or(stages.len());
        RunInstance { id: run_id,
                      owner,
                      stages,
                      cursor,
                      status,
                      run_fingerprint }
    }
}

/// Construye y valida la definición de un pipeline lineal.
///
/// Reglas:
/// - al menos un stage, y el primero es `Source`;
/// - ids únicos;
/// - cada input declarado lo produce un stage anterior;
/// - ningún artifact tiene dos productores.
pub fn build_pipeline_definition(stages: Vec<Arc<dyn Stage>>) -> Result<PipelineDefinition, PipelineError> {
    let first = stages.first()
                      .ok_or_else(|| PipelineError::InvalidDefinition("pipeline has no stages".into()))?;
    if first.kind() != StageKind::Source {
        return Err(PipelineError::FirstStageMustBeSource);
    }

    let mut ids: HashSet<&str> = HashSet::new();
    let mut produced: HashSet<&str> = HashSet::new();
    for stage in &stages {
        if !ids.insert(stage.id()) {
            return Err(PipelineError::InvalidDefinition(format!("duplicate stage id '{}'", stage.id())));
        }
        let missing: Vec<String> = stage.inputs()
                                        .iter()
                                        .filter(|d| !produced.contains(d.name))
                                        .map(|d| d.name.to_string())
                                        .collect();
        if !missing.is_empty() {
            return Err(PipelineError::InvalidDefinition(format!("stage '{}' reads {:?} before any stage produces them",
                                                                stage.id(),
                                                                missing)));
        }
        for out in stage.outputs() {
            if !produced.insert(out.name) {
                return Err(PipelineError::InvalidDefinition(format!("artifact '{}' has more than one producer",
                                                                    out.name)));
            }
        }
    }

    let shape: Vec<serde_json::Value> =
        stages.iter()
              .map(|s| {
                  json!({
                      "id": s.id(),
                      "kind": format!("{:?}", s.kind()),
                      "inputs": s.inputs().iter().map(|d| d.name).collect::<Vec<_>>(),
                      "outputs": s.outputs().iter().map(|d| d.name).collect::<Vec<_>>(),
                      "params": s.base_params(),
                  })
              })
              .collect();
    let definition_hash = hash_value(&json!(shape));
    Ok(PipelineDefinition { stages, definition_hash })
}
