//! Tipos de evento de una corrida y estructura `RunEvent`.
//!
//! Rol en el pipeline:
//! - Cada transición del executor emite un evento a un `EventStore`
//!   append-only.
//! - Los eventos permiten reconstruir el estado por stage (status, intentos,
//!   timestamps) vía `RunRepository` sin estructuras mutables compartidas.
//! - `RunEventKind` es el contrato observable que consume el coordinador.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunEventKind {
    /// Primer evento de un `run_id`: fija la definición y el owner.
    RunInitialized { definition_hash: String, stage_count: usize, owner: String },
    /// Comienza un intento de un stage. No implica éxito.
    StageStarted { stage_index: usize, stage_id: String, attempt: u32 },
    /// El intento terminó y sus outputs quedaron confirmados en el store.
    StageFinished {
        stage_index: usize,
        stage_id: String,
        attempt: u32,
        outputs: Vec<String>,
        fingerprint: String,
    },
    /// Diagnóstico no fatal emitido por el stage (p. ej. no convergencia).
    StageSignal {
        stage_index: usize,
        stage_id: String,
        signal: String,
        data: serde_json::Value,
    },
    /// El intento falló; no se confirmó ningún output.
    StageFailed {
        stage_index: usize,
        stage_id: String,
        attempt: u32,
        error: PipelineError,
        fingerprint: String,
    },
    /// Se programó un nuevo intento tras `delay_ms`.
    RetryScheduled {
        stage_index: usize,
        stage_id: String,
        next_attempt: u32,
        delay_ms: u64,
        reason: String,
    },
    /// Cierre exitoso con fingerprint agregado de la corrida.
    RunCompleted { run_fingerprint: String },
    /// Cierre por fallo irrecuperable del primer stage que falló.
    RunFailed { stage_id: String, error: PipelineError },
    /// Cierre por cancelación del coordinador.
    RunCancelled { stage_id: Option<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    pub seq: u64,
    pub run_id: Uuid,
    pub kind: RunEventKind,
    pub ts: DateTime<Utc>, // metadato (no entra en fingerprint)
}
