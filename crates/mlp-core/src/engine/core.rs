//! `PipelineExecutor`: ejecución lineal de stages con reintentos.
//!
//! Por cada stage en orden:
//! 1. comprueba cancelación;
//! 2. lee los inputs declarados (deben haberse producido en esta corrida);
//! 3. invoca el stage (en un hilo aparte si declara timeout);
//! 4. valida que los outputs coincidan con los declarados;
//! 5. confirma el lote completo en el store (`put_batch`).
//!
//! Un fallo agota la política de reintentos y detiene la corrida: ningún
//! stage posterior se ejecuta. Todas las transiciones quedan como eventos y
//! el `RunResult` se reconstruye por replay.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use log::{debug, error, info, warn};
use serde_json::json;
use uuid::Uuid;

use super::builder::ExecutorBuilderInit;
use super::cancel::CancellationToken;
use super::result::RunResult;
use crate::config::RunConfig;
use crate::constants::ENGINE_VERSION;
use crate::errors::PipelineError;
use crate::event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
use crate::hashing::hash_value;
use crate::model::{Artifact, ExecutionContext, StageFingerprintInput};
use crate::repo::{InMemoryRunRepository, PipelineDefinition, RunRepository, RunStatus};
use crate::stage::{Stage, StageRunResult, StageSignal};
use crate::store::ArtifactStore;

/// Artifacts confirmados en la corrida actual: nombre → hash.
type Committed = HashMap<String, String>;

#[derive(Debug)]
pub struct PipelineExecutor<S, E = InMemoryEventStore, R = InMemoryRunRepository>
    where S: ArtifactStore,
          E: EventStore,
          R: RunRepository
{
    store: S,
    event_store: E,
    repository: R,
    config: RunConfig,
    cancel: CancellationToken,
    default_definition: Option<PipelineDefinition>,
}

impl<S: ArtifactStore> PipelineExecutor<S, InMemoryEventStore, InMemoryRunRepository> {
    /// Executor con eventos y repositorio en memoria.
    pub fn new(store: S, config: RunConfig) -> Self {
        Self::with_stores(store, InMemoryEventStore::default(), InMemoryRunRepository::new(), config)
    }

    /// Builder que fija la definición por defecto (`first_stage` → `add_stage`).
    #[inline]
    pub fn builder(store: S, config: RunConfig) -> ExecutorBuilderInit<S> {
        ExecutorBuilderInit { store, config }
    }
}

impl<S, E, R> PipelineExecutor<S, E, R>
    where S: ArtifactStore,
          E: EventStore,
          R: RunRepository
{
    pub fn with_stores(store: S, event_store: E, repository: R, config: RunConfig) -> Self {
        Self { store,
               event_store,
               repository,
               config,
               cancel: CancellationToken::new(),
               default_definition: None }
    }

    /// Reemplaza el token de cancelación (el coordinador comparte el suyo).
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn set_default_definition(&mut self, definition: PipelineDefinition) {
        self.default_definition = Some(definition);
    }

    pub fn default_definition(&self) -> Option<&PipelineDefinition> {
        self.default_definition.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn events_for(&self, run_id: Uuid) -> Vec<RunEvent> {
        self.event_store.list(run_id)
    }

    /// Ejecuta la definición por defecto con un `run_id` nuevo.
    pub fn run(&mut self) -> Result<RunResult, PipelineError> {
        let def = self.default_definition
                      .take()
                      .ok_or_else(|| PipelineError::Internal("no default definition configured".into()))?;
        let result = self.execute_run(&def);
        self.default_definition = Some(def);
        Ok(result)
    }

    pub fn execute_run(&mut self, definition: &PipelineDefinition) -> RunResult {
        self.execute_run_with_id(Uuid::new_v4(), definition)
    }

    /// Ejecuta todos los stages en orden bajo un `run_id` dado.
    pub fn execute_run_with_id(&mut self, run_id: Uuid, definition: &PipelineDefinition) -> RunResult {
        self.drive(run_id, definition, 0..definition.len(), true)
    }

    /// Ejecuta un único stage contra el contenido actual del store.
    ///
    /// Los inputs se leen tal como están (producidos por corridas anteriores),
    /// sin exigir que pertenezcan a esta corrida. Útil para re-ejecutar un
    /// stage aislado desde la CLI.
    pub fn execute_stage(&mut self, definition: &PipelineDefinition, stage_id: &str) -> Result<RunResult, PipelineError> {
        let index = definition.position(stage_id)
                              .ok_or_else(|| PipelineError::InvalidDefinition(format!("unknown stage '{stage_id}'")))?;
        Ok(self.drive(Uuid::new_v4(), definition, index..index + 1, false))
    }

    /// Reconstruye el resultado de una corrida a partir de sus eventos.
    pub fn run_result(&self, run_id: Uuid, definition: &PipelineDefinition) -> RunResult {
        self.assemble_result(run_id, definition, Vec::new())
    }

    fn drive(&mut self,
             run_id: Uuid,
             definition: &PipelineDefinition,
             range: std::ops::Range<usize>,
             require_in_run: bool)
             -> RunResult {
        self.event_store.append_kind(run_id,
                                     RunEventKind::RunInitialized { definition_hash: definition.definition_hash.clone(),
                                                                    stage_count: definition.len(),
                                                                    owner: self.config.owner.clone() });
        info!("run:start run_id={run_id} owner={} stages={:?}",
              self.config.owner,
              definition.stage_ids());

        let mut committed: Committed = HashMap::new();
        let mut stage_fps: Vec<String> = Vec::new();
        let mut last_outputs: Vec<Artifact> = Vec::new();

        for index in range {
            let stage = Arc::clone(&definition.stages[index]);
            if self.cancel.is_cancelled() {
                return self.cancel_run(run_id, definition, Some(stage.id()));
            }
            match self.run_stage(run_id, definition, index, &stage, &committed, require_in_run) {
                Ok((outputs, fingerprint)) => {
                    for a in &outputs {
                        committed.insert(a.name.clone(), a.hash.clone());
                    }
                    stage_fps.push(fingerprint);
                    last_outputs = outputs;
                }
                Err(PipelineError::Cancelled) => return self.cancel_run(run_id, definition, Some(stage.id())),
                Err(err) => {
                    error!("run:failed run_id={run_id} stage={} kind={} error={err}",
                           stage.id(),
                           err.kind());
                    self.event_store.append_kind(run_id,
                                                 RunEventKind::RunFailed { stage_id: stage.id().to_string(),
                                                                           error: err });
                    return self.assemble_result(run_id, definition, Vec::new());
                }
            }
        }

        let run_fingerprint = hash_value(&json!({
                                             "engine_version": ENGINE_VERSION,
                                             "definition_hash": definition.definition_hash,
                                             "stage_fingerprints": stage_fps,
                                         }));
        self.event_store
            .append_kind(run_id, RunEventKind::RunCompleted { run_fingerprint: run_fingerprint.clone() });
        info!("run:completed run_id={run_id} fingerprint={run_fingerprint}");
        self.assemble_result(run_id, definition, last_outputs)
    }

    fn cancel_run(&mut self, run_id: Uuid, definition: &PipelineDefinition, stage_id: Option<&str>) -> RunResult {
        warn!("run:cancelled run_id={run_id} at_stage={stage_id:?}");
        self.event_store.append_kind(run_id,
                                     RunEventKind::RunCancelled { stage_id: stage_id.map(str::to_string) });
        self.assemble_result(run_id, definition, Vec::new())
    }

    fn assemble_result(&self, run_id: Uuid, definition: &PipelineDefinition, terminal_outputs: Vec<Artifact>) -> RunResult {
        let events = self.event_store.list(run_id);
        let instance = self.repository.load(run_id, &events, definition);
        let terminal_outputs = if instance.status == RunStatus::Succeeded {
            terminal_outputs
        } else {
            Vec::new()
        };
        RunResult { run_id,
                    owner: instance.owner,
                    status: instance.status,
                    stages: instance.stages,
                    run_fingerprint: instance.run_fingerprint,
                    terminal_outputs }
    }

    /// Intentos de un stage hasta éxito o agotar la política. Devuelve los
    /// outputs confirmados y el fingerprint del intento exitoso.
    fn run_stage(&mut self,
                 run_id: Uuid,
                 definition: &PipelineDefinition,
                 index: usize,
                 stage: &Arc<dyn Stage>,
                 committed: &Committed,
                 require_in_run: bool)
                 -> Result<(Vec<Artifact>, String), PipelineError> {
        let mut attempt: u32 = 1;
        loop {
            self.event_store.append_kind(run_id,
                                         RunEventKind::StageStarted { stage_index: index,
                                                                      stage_id: stage.id().to_string(),
                                                                      attempt });
            debug!("stage:start run_id={run_id} stage={} attempt={attempt}", stage.id());

            let mut input_hashes: Vec<String> = Vec::new();
            let outcome = self.attempt(run_id, stage, attempt, committed, require_in_run, &mut input_hashes);
            match outcome {
                Ok((outputs, signals)) => {
                    for s in signals {
                        warn!("stage:signal run_id={run_id} stage={} signal={} data={}",
                              stage.id(),
                              s.signal,
                              s.data);
                        self.event_store.append_kind(run_id,
                                                     RunEventKind::StageSignal { stage_index: index,
                                                                                 stage_id: stage.id().to_string(),
                                                                                 signal: s.signal,
                                                                                 data: s.data });
                    }
                    let output_hashes: Vec<String> = outputs.iter().map(|a| a.hash.clone()).collect();
                    let fingerprint = stage_fingerprint(definition, index, stage.as_ref(), &input_hashes, &output_hashes);
                    self.event_store.append_kind(run_id,
                                                 RunEventKind::StageFinished { stage_index: index,
                                                                               stage_id: stage.id().to_string(),
                                                                               attempt,
                                                                               outputs: output_hashes,
                                                                               fingerprint: fingerprint.clone() });
                    info!("stage:finished run_id={run_id} stage={} attempt={attempt} outputs={:?}",
                          stage.id(),
                          outputs.iter().map(|a| a.name.as_str()).collect::<Vec<_>>());
                    return Ok((outputs, fingerprint));
                }
                Err(err) => {
                    let fingerprint = stage_fingerprint(definition, index, stage.as_ref(), &input_hashes, &[]);
                    self.event_store.append_kind(run_id,
                                                 RunEventKind::StageFailed { stage_index: index,
                                                                             stage_id: stage.id().to_string(),
                                                                             attempt,
                                                                             error: err.clone(),
                                                                             fingerprint });
                    if !self.config.retry.should_retry(attempt, &err) {
                        return Err(err);
                    }
                    let delay = self.config.retry.retry_delay;
                    warn!("stage:retry run_id={run_id} stage={} attempt={attempt} delay_ms={} error={err}",
                          stage.id(),
                          duration_ms(delay));
                    self.event_store.append_kind(run_id,
                                                 RunEventKind::RetryScheduled { stage_index: index,
                                                                                stage_id: stage.id().to_string(),
                                                                                next_attempt: attempt + 1,
                                                                                delay_ms: duration_ms(delay),
                                                                                reason: err.to_string() });
                    if self.cancel.wait_timeout(delay) {
                        return Err(PipelineError::Cancelled);
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Un intento: lectura de inputs, invocación, validación y commit.
    fn attempt(&self,
               run_id: Uuid,
               stage: &Arc<dyn Stage>,
               attempt: u32,
               committed: &Committed,
               require_in_run: bool,
               input_hashes: &mut Vec<String>)
               -> Result<(Vec<Artifact>, Vec<StageSignal>), PipelineError> {
        let inputs = self.load_inputs(stage.as_ref(), committed, require_in_run)?;
        input_hashes.extend(inputs.values().map(|a| a.hash.clone()));

        let ctx = ExecutionContext { run_id,
                                     stage_id: stage.id().to_string(),
                                     attempt,
                                     inputs,
                                     params: stage.base_params() };
        let (outputs, signals) = match invoke(stage, ctx)? {
            StageRunResult::Success { outputs } => (outputs, Vec::new()),
            StageRunResult::SuccessWithSignals { outputs, signals } => (outputs, signals),
            StageRunResult::Failure { error } => return Err(error),
        };
        validate_outputs(stage.as_ref(), &outputs)?;

        // Último punto de cancelación: tras el commit el stage cuenta como hecho.
        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        self.store.put_batch(&outputs)?;
        Ok((outputs, signals))
    }

    fn load_inputs(&self,
                   stage: &dyn Stage,
                   committed: &Committed,
                   require_in_run: bool)
                   -> Result<BTreeMap<String, Artifact>, PipelineError> {
        if require_in_run {
            let missing: Vec<String> = stage.inputs()
                                            .iter()
                                            .filter(|d| !committed.contains_key(d.name))
                                            .map(|d| d.name.to_string())
                                            .collect();
            if !missing.is_empty() {
                return Err(PipelineError::MissingInputs(missing));
            }
        }
        let mut inputs = BTreeMap::new();
        for decl in stage.inputs() {
            let artifact = self.store.load(decl)?;
            if require_in_run && committed.get(decl.name) != Some(&artifact.hash) {
                return Err(PipelineError::Io(format!("artifact '{}' changed after it was committed", decl.name)));
            }
            inputs.insert(decl.name.to_string(), artifact);
        }
        Ok(inputs)
    }
}

/// Invoca el stage. Con timeout, corre en un hilo aparte y se abandona si no
/// responde a tiempo (sus outputs nunca se confirman).
fn invoke(stage: &Arc<dyn Stage>, ctx: ExecutionContext) -> Result<StageRunResult, PipelineError> {
    let Some(timeout) = stage.timeout() else {
        return Ok(stage.run(&ctx));
    };
    let (tx, rx) = mpsc::channel();
    let worker = Arc::clone(stage);
    std::thread::Builder::new().name(format!("stage-{}", stage.id()))
                               .spawn(move || {
                                   let _ = tx.send(worker.run(&ctx));
                               })
                               .map_err(|e| PipelineError::Internal(format!("spawn stage worker: {e}")))?;
    match rx.recv_timeout(timeout) {
        Ok(res) => Ok(res),
        Err(mpsc::RecvTimeoutError::Timeout) => Err(PipelineError::Timeout { after_ms: duration_ms(timeout) }),
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(PipelineError::Internal(format!("stage '{}' worker terminated without a result", stage.id())))
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Los outputs deben ser exactamente los declarados, con el formato declarado.
fn validate_outputs(stage: &dyn Stage, outputs: &[Artifact]) -> Result<(), PipelineError> {
    let declared: BTreeSet<&str> = stage.outputs().iter().map(|d| d.name).collect();
    let produced: BTreeSet<&str> = outputs.iter().map(|a| a.name.as_str()).collect();
    if declared != produced || produced.len() != outputs.len() {
        return Err(PipelineError::UndeclaredOutput(format!("stage '{}' declared {:?}, produced {:?}",
                                                           stage.id(),
                                                           declared,
                                                           outputs.iter().map(|a| a.name.as_str()).collect::<Vec<_>>())));
    }
    for decl in stage.outputs() {
        if let Some(a) = outputs.iter().find(|a| a.name == decl.name) {
            if a.format != decl.format {
                return Err(PipelineError::UndeclaredOutput(format!("artifact '{}' declared as {} but produced as {}",
                                                                   decl.name,
                                                                   decl.format.as_str(),
                                                                   a.format.as_str())));
            }
        }
    }
    Ok(())
}

fn stage_fingerprint(definition: &PipelineDefinition,
                     index: usize,
                     stage: &dyn Stage,
                     input_hashes: &[String],
                     output_hashes: &[String])
                     -> String {
    let params = stage.base_params();
    let input = StageFingerprintInput { engine_version: ENGINE_VERSION,
                                        definition_hash: &definition.definition_hash,
                                        stage_index: index,
                                        stage_id: stage.id(),
                                        input_hashes,
                                        output_hashes,
                                        params: &params };
    serde_json::to_value(&input).map(|v| hash_value(&v)).unwrap_or_default()
}
