//! Coordinador de corridas de referencia.
//!
//! Acepta corridas (`submit`), expone su estado (`status`), permite esperar
//! el resultado (`wait`) y cancelarlas (`cancel`). Cada corrida se ejecuta en
//! su propio hilo con un `PipelineExecutor`; las corridas que comparten el
//! mismo store se serializan con un lock de namespace, de modo que dos
//! corridas nunca escriben los mismos nombres de artifact a la vez.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use dashmap::DashMap;
use log::{info, warn};
use uuid::Uuid;

use crate::config::RunConfig;
use crate::engine::{CancellationToken, PipelineExecutor, RunResult};
use crate::repo::PipelineDefinition;
use crate::store::ArtifactStore;

/// Estado observable de una corrida enviada.
#[derive(Debug, Clone)]
pub enum RunState {
    Queued,
    Running,
    Finished(Box<RunResult>),
}

impl RunState {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished(_))
    }
}

#[derive(Debug)]
struct RunEntry {
    state: RunState,
    cancel: CancellationToken,
}

pub struct RunCoordinator<S: ArtifactStore + 'static> {
    store: Arc<S>,
    namespace: Arc<Mutex<()>>,
    /// Una entrada por corrida enviada; no se purgan mientras viva el coordinador.
    runs: Arc<DashMap<Uuid, RunEntry>>,
    handles: Mutex<HashMap<Uuid, JoinHandle<()>>>,
}

impl<S: ArtifactStore + 'static> RunCoordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store,
               namespace: Arc::new(Mutex::new(())),
               runs: Arc::new(DashMap::new()),
               handles: Mutex::new(HashMap::new()) }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Encola una corrida y devuelve su id inmediatamente.
    pub fn submit(&self, definition: PipelineDefinition, config: RunConfig) -> Uuid {
        let run_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        self.runs.insert(run_id,
                         RunEntry { state: RunState::Queued,
                                    cancel: cancel.clone() });
        info!("coordinator:submit run_id={run_id} owner={}", config.owner);

        let store = Arc::clone(&self.store);
        let namespace = Arc::clone(&self.namespace);
        let runs = Arc::clone(&self.runs);
        let handle = std::thread::spawn(move || {
            let _guard = namespace.lock().unwrap_or_else(|p| p.into_inner());
            if let Some(mut entry) = runs.get_mut(&run_id) {
                entry.state = RunState::Running;
            }
            let mut executor = PipelineExecutor::new(store, config).with_cancellation(cancel);
            let result = executor.execute_run_with_id(run_id, &definition);
            if let Some(mut entry) = runs.get_mut(&run_id) {
                entry.state = RunState::Finished(Box::new(result));
            }
        });
        self.handles
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(run_id, handle);
        run_id
    }

    pub fn status(&self, run_id: Uuid) -> Option<RunState> {
        self.runs.get(&run_id).map(|e| e.state.clone())
    }

    /// Bloquea hasta que la corrida termine. `None` si el id es desconocido.
    pub fn wait(&self, run_id: Uuid) -> Option<RunResult> {
        let handle = self.handles
                         .lock()
                         .unwrap_or_else(|p| p.into_inner())
                         .remove(&run_id);
        if let Some(h) = handle {
            if h.join().is_err() {
                warn!("coordinator:worker_panicked run_id={run_id}");
            }
        }
        match self.status(run_id)? {
            RunState::Finished(result) => Some(*result),
            _ => None,
        }
    }

    /// Solicita la cancelación. Devuelve `false` si la corrida no existe o
    /// ya terminó.
    pub fn cancel(&self, run_id: Uuid) -> bool {
        match self.runs.get(&run_id) {
            Some(entry) if !entry.state.is_finished() => {
                info!("coordinator:cancel run_id={run_id}");
                entry.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    /// Ids conocidos por el coordinador.
    pub fn runs(&self) -> Vec<Uuid> {
        self.runs.iter().map(|e| *e.key()).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::{json, Value};

    use super::*;
    use crate::config::RetryPolicy;
    use crate::model::{Artifact, ArtifactDecl, ArtifactFormat, ExecutionContext};
    use crate::repo::{build_pipeline_definition, RunStatus};
    use crate::stage::{Stage, StageKind, StageRunResult};
    use crate::store::InMemoryArtifactStore;

    const OUT: ArtifactDecl = ArtifactDecl::new("out", ArtifactFormat::Tabular);

    #[derive(Debug)]
    struct Slow(Duration);

    impl Stage for Slow {
        fn id(&self) -> &str {
            "slow"
        }
        fn kind(&self) -> StageKind {
            StageKind::Source
        }
        fn inputs(&self) -> &[ArtifactDecl] {
            &[]
        }
        fn outputs(&self) -> &[ArtifactDecl] {
            std::slice::from_ref(&OUT)
        }
        fn base_params(&self) -> Value {
            json!({})
        }
        fn run(&self, _ctx: &ExecutionContext) -> StageRunResult {
            std::thread::sleep(self.0);
            StageRunResult::Success { outputs: vec![Artifact::new("out", ArtifactFormat::Tabular, b"x".to_vec())] }
        }
    }

    fn definition(d: Duration) -> PipelineDefinition {
        build_pipeline_definition(vec![Arc::new(Slow(d))]).unwrap()
    }

    fn config() -> RunConfig {
        RunConfig { retry: RetryPolicy { retries: 0,
                                         retry_delay: Duration::ZERO,
                                         ..RetryPolicy::default() },
                    owner: "coord".into() }
    }

    #[test]
    fn submit_then_wait_returns_result() {
        let coord = RunCoordinator::new(Arc::new(InMemoryArtifactStore::new()));
        let id = coord.submit(definition(Duration::ZERO), config());
        let result = coord.wait(id).unwrap();
        assert_eq!(result.run_id, id);
        assert!(result.is_success());
        assert!(coord.status(id).unwrap().is_finished());
        assert!(coord.store().exists("out"));
    }

    #[test]
    fn runs_on_same_store_are_serialized() {
        let coord = RunCoordinator::new(Arc::new(InMemoryArtifactStore::new()));
        let first = coord.submit(definition(Duration::from_millis(150)), config());
        let second = coord.submit(definition(Duration::ZERO), config());
        std::thread::sleep(Duration::from_millis(50));
        // Sólo una puede estar en ejecución.
        let running = [first, second].iter()
                                     .filter(|id| matches!(coord.status(**id), Some(RunState::Running)))
                                     .count();
        assert!(running <= 1);
        assert!(coord.wait(first).unwrap().is_success());
        assert!(coord.wait(second).unwrap().is_success());
    }

    #[test]
    fn cancel_queued_run() {
        let coord = RunCoordinator::new(Arc::new(InMemoryArtifactStore::new()));
        let blocker = coord.submit(definition(Duration::from_millis(150)), config());
        let queued = coord.submit(definition(Duration::from_millis(150)), config());
        assert!(coord.cancel(queued));
        let result = coord.wait(queued).unwrap();
        assert!(matches!(result.status, RunStatus::Cancelled { .. }));
        assert!(coord.wait(blocker).is_some());
        assert!(!coord.cancel(queued));
    }

    #[test]
    fn unknown_run_is_none() {
        let coord = RunCoordinator::new(Arc::new(InMemoryArtifactStore::new()));
        assert!(coord.status(Uuid::new_v4()).is_none());
        assert!(coord.wait(Uuid::new_v4()).is_none());
    }
}
