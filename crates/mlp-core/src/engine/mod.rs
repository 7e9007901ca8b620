//! Executor del pipeline: orquestación lineal, reintentos, timeout y
//! cancelación.

pub mod builder;
pub mod cancel;
pub mod core;
pub mod result;

pub use builder::{ExecutorBuilder, ExecutorBuilderInit};
pub use cancel::CancellationToken;
pub use core::PipelineExecutor;
pub use result::RunResult;

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::{json, Value};

    use super::*;
    use crate::config::{RetryMode, RetryPolicy, RunConfig};
    use crate::errors::PipelineError;
    use crate::event::RunEventKind;
    use crate::model::{Artifact, ArtifactDecl, ArtifactFormat, ExecutionContext};
    use crate::repo::{build_pipeline_definition, PipelineDefinition, RunStatus};
    use crate::stage::{Stage, StageKind, StageRunResult, StageSignal, StageStatus};
    use crate::store::{ArtifactStore, InMemoryArtifactStore};

    const A: ArtifactDecl = ArtifactDecl::new("a", ArtifactFormat::Tabular);
    const B: ArtifactDecl = ArtifactDecl::new("b", ArtifactFormat::Tabular);
    const C: ArtifactDecl = ArtifactDecl::new("c", ArtifactFormat::Metrics);

    /// Stage configurable: falla las primeras `fail_first` veces.
    #[derive(Debug)]
    struct Scripted {
        id: &'static str,
        kind: StageKind,
        inputs: Vec<ArtifactDecl>,
        outputs: Vec<ArtifactDecl>,
        fail_first: u32,
        error: PipelineError,
        calls: Arc<AtomicU32>,
        sleep: Option<Duration>,
        timeout: Option<Duration>,
        signal: bool,
    }

    impl Scripted {
        fn new(id: &'static str, kind: StageKind, inputs: &[ArtifactDecl], outputs: &[ArtifactDecl]) -> Self {
            Self { id,
                   kind,
                   inputs: inputs.to_vec(),
                   outputs: outputs.to_vec(),
                   fail_first: 0,
                   error: PipelineError::TrainingError("boom".into()),
                   calls: Arc::new(AtomicU32::new(0)),
                   sleep: None,
                   timeout: None,
                   signal: false }
        }

        fn failing(mut self, times: u32, error: PipelineError) -> Self {
            self.fail_first = times;
            self.error = error;
            self
        }
    }

    impl Stage for Scripted {
        fn id(&self) -> &str {
            self.id
        }
        fn kind(&self) -> StageKind {
            self.kind
        }
        fn inputs(&self) -> &[ArtifactDecl] {
            &self.inputs
        }
        fn outputs(&self) -> &[ArtifactDecl] {
            &self.outputs
        }
        fn base_params(&self) -> Value {
            json!({"id": self.id})
        }
        fn timeout(&self) -> Option<Duration> {
            self.timeout
        }
        fn run(&self, ctx: &ExecutionContext) -> StageRunResult {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(d) = self.sleep {
                std::thread::sleep(d);
            }
            if n <= self.fail_first {
                return StageRunResult::Failure { error: self.error.clone() };
            }
            let seed: usize = ctx.inputs.values().map(|a| a.len()).sum();
            let outputs = self.outputs
                              .iter()
                              .map(|d| Artifact::new(d.name, d.format, format!("{}:{seed}", self.id).into_bytes()))
                              .collect();
            if self.signal {
                StageRunResult::SuccessWithSignals { outputs,
                                                     signals: vec![StageSignal { signal: "CONVERGENCE_WARNING".into(),
                                                                                 data: json!({"n_iter": 3}) }] }
            } else {
                StageRunResult::Success { outputs }
            }
        }
    }

    fn fast_config(retries: u32) -> RunConfig {
        RunConfig { retry: RetryPolicy { retries,
                                         retry_delay: Duration::ZERO,
                                         mode: RetryMode::Blind },
                    owner: "test".into() }
    }

    fn chain(stages: Vec<Scripted>) -> PipelineDefinition {
        build_pipeline_definition(stages.into_iter().map(|s| Arc::new(s) as Arc<dyn Stage>).collect()).unwrap()
    }

    #[test]
    fn linear_run_commits_every_stage() {
        let def = chain(vec![Scripted::new("src", StageKind::Source, &[], &[A]),
                             Scripted::new("mid", StageKind::Transform, &[A], &[B]),
                             Scripted::new("end", StageKind::Sink, &[B], &[C]),]);
        let store = Arc::new(InMemoryArtifactStore::new());
        let mut ex = PipelineExecutor::new(Arc::clone(&store), fast_config(0));
        let result = ex.execute_run(&def);

        assert!(result.is_success());
        assert!(result.stages.iter().all(|s| s.status == StageStatus::Succeeded));
        assert_eq!(store.names(), vec!["a", "b", "c"]);
        assert!(result.output("c").is_some());
        assert!(result.run_fingerprint.is_some());
    }

    #[test]
    fn failure_halts_downstream_stages() {
        let def = chain(vec![Scripted::new("src", StageKind::Source, &[], &[A]),
                             Scripted::new("mid", StageKind::Transform, &[A], &[B]).failing(5,
                                                                                      PipelineError::SchemaError("bad".into())),
                             Scripted::new("end", StageKind::Sink, &[B], &[C]),]);
        let store = Arc::new(InMemoryArtifactStore::new());
        let mut ex = PipelineExecutor::new(Arc::clone(&store), fast_config(1));
        let result = ex.execute_run(&def);

        assert_eq!(result.failed_stage(), Some("mid"));
        assert_eq!(result.stage("mid").unwrap().attempts, 2);
        assert_eq!(result.stage("end").unwrap().status, StageStatus::Pending);
        assert!(!store.exists("b"));
        assert!(result.terminal_outputs.is_empty());
    }

    #[test]
    fn transient_failure_recovers_on_retry() {
        let def = chain(vec![Scripted::new("src", StageKind::Source, &[], &[A]).failing(1,
                                                                                PipelineError::SourceUnavailable("down".into()))]);
        let mut ex = PipelineExecutor::new(InMemoryArtifactStore::new(), fast_config(1));
        let result = ex.execute_run(&def);

        assert!(result.is_success());
        assert_eq!(result.stage("src").unwrap().attempts, 2);
        let events = ex.events_for(result.run_id);
        assert!(events.iter().any(|e| matches!(e.kind, RunEventKind::RetryScheduled { next_attempt: 2, .. })));
    }

    #[test]
    fn classified_mode_does_not_retry_permanent_errors() {
        let stage = Scripted::new("src", StageKind::Source, &[], &[A]).failing(1, PipelineError::SchemaError("x".into()));
        let calls = Arc::clone(&stage.calls);
        let def = chain(vec![stage]);
        let mut cfg = fast_config(3);
        cfg.retry.mode = RetryMode::Classified;
        let result = PipelineExecutor::new(InMemoryArtifactStore::new(), cfg).execute_run(&def);

        assert!(matches!(result.status, RunStatus::Failed { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn retried_attempts_share_fingerprint() {
        let def = chain(vec![Scripted::new("src", StageKind::Source, &[], &[A]).failing(1,
                                                                                PipelineError::Io("flaky".into()))]);
        let mut ex = PipelineExecutor::new(InMemoryArtifactStore::new(), fast_config(1));
        let once = ex.execute_run(&def);
        let def2 = chain(vec![Scripted::new("src", StageKind::Source, &[], &[A])]);
        let clean = ex.execute_run(&def2);
        assert_eq!(once.stage("src").unwrap().fingerprint, clean.stage("src").unwrap().fingerprint);
    }

    #[test]
    fn undeclared_output_fails_without_commit() {
        #[derive(Debug)]
        struct Liar;
        impl Stage for Liar {
            fn id(&self) -> &str {
                "liar"
            }
            fn kind(&self) -> StageKind {
                StageKind::Source
            }
            fn inputs(&self) -> &[ArtifactDecl] {
                &[]
            }
            fn outputs(&self) -> &[ArtifactDecl] {
                &[A, B]
            }
            fn base_params(&self) -> Value {
                json!({})
            }
            fn run(&self, _ctx: &ExecutionContext) -> StageRunResult {
                StageRunResult::Success { outputs: vec![Artifact::new("a", ArtifactFormat::Tabular, b"x".to_vec())] }
            }
        }
        let def = build_pipeline_definition(vec![Arc::new(Liar)]).unwrap();
        let store = Arc::new(InMemoryArtifactStore::new());
        let result = PipelineExecutor::new(Arc::clone(&store), fast_config(0)).execute_run(&def);

        match result.status {
            RunStatus::Failed { error, .. } => assert_eq!(error.kind(), "UndeclaredOutput"),
            other => panic!("unexpected status {other:?}"),
        }
        assert!(store.names().is_empty());
    }

    #[test]
    fn stale_inputs_from_previous_runs_are_not_used() {
        let store = Arc::new(InMemoryArtifactStore::new());
        store.put("a", b"stale", ArtifactFormat::Tabular).unwrap();
        // Definición sin validar: el stage lee `a` pero nadie la produce en la corrida.
        let def = PipelineDefinition { stages: vec![Arc::new(Scripted::new("mid", StageKind::Transform, &[A], &[B]))],
                                       definition_hash: "h".into() };
        let result = PipelineExecutor::new(Arc::clone(&store), fast_config(0)).execute_run(&def);

        match result.status {
            RunStatus::Failed { error, .. } => assert_eq!(error, PipelineError::MissingInputs(vec!["a".into()])),
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[test]
    fn execute_stage_reads_inputs_already_in_store() {
        let store = Arc::new(InMemoryArtifactStore::new());
        store.put("a", b"from-earlier-run", ArtifactFormat::Tabular).unwrap();
        let def = chain(vec![Scripted::new("src", StageKind::Source, &[], &[A]),
                             Scripted::new("mid", StageKind::Transform, &[A], &[B]),]);
        let result = PipelineExecutor::new(Arc::clone(&store), fast_config(0)).execute_stage(&def, "mid")
                                                                               .unwrap();
        assert!(result.is_success());
        assert_eq!(result.stage("src").unwrap().status, StageStatus::Pending);
        assert!(store.exists("b"));
    }

    #[test]
    fn slow_stage_times_out() {
        let mut slow = Scripted::new("src", StageKind::Source, &[], &[A]);
        slow.sleep = Some(Duration::from_millis(300));
        slow.timeout = Some(Duration::from_millis(20));
        let def = chain(vec![slow]);
        let store = Arc::new(InMemoryArtifactStore::new());
        let result = PipelineExecutor::new(Arc::clone(&store), fast_config(0)).execute_run(&def);

        match result.status {
            RunStatus::Failed { error, .. } => assert_eq!(error, PipelineError::Timeout { after_ms: 20 }),
            other => panic!("unexpected status {other:?}"),
        }
        assert!(!store.exists("a"));
    }

    #[test]
    fn cancelled_before_start_runs_nothing() {
        let stage = Scripted::new("src", StageKind::Source, &[], &[A]);
        let calls = Arc::clone(&stage.calls);
        let def = chain(vec![stage]);
        let ex = PipelineExecutor::new(InMemoryArtifactStore::new(), fast_config(0));
        ex.cancellation_token().cancel();
        let mut ex = ex;
        let result = ex.execute_run(&def);

        assert_eq!(result.status, RunStatus::Cancelled { stage_id: Some("src".into()) });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cancel_while_stage_runs_commits_nothing() {
        let mut stage = Scripted::new("src", StageKind::Source, &[], &[A]);
        stage.sleep = Some(Duration::from_millis(200));
        let calls = Arc::clone(&stage.calls);
        let def = chain(vec![stage]);
        let store = Arc::new(InMemoryArtifactStore::new());
        let mut ex = PipelineExecutor::new(Arc::clone(&store), fast_config(1));
        let token = ex.cancellation_token();
        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            token.cancel();
        });

        let result = ex.execute_run(&def);
        canceller.join().unwrap();

        assert_eq!(result.status, RunStatus::Cancelled { stage_id: Some("src".into()) });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!store.exists(A.name));
        assert!(result.output(A.name).is_none());
    }

    #[test]
    fn signals_are_recorded_on_the_slot() {
        let mut s = Scripted::new("src", StageKind::Source, &[], &[A]);
        s.signal = true;
        let result = PipelineExecutor::new(InMemoryArtifactStore::new(), fast_config(0)).execute_run(&chain(vec![s]));
        assert_eq!(result.stage("src").unwrap().signals, vec!["CONVERGENCE_WARNING".to_string()]);
    }

    #[test]
    fn builder_rejects_non_source_first_stage() {
        let err = PipelineExecutor::builder(InMemoryArtifactStore::new(), RunConfig::default())
            .first_stage(Scripted::new("mid", StageKind::Transform, &[], &[B]))
            .build()
            .unwrap_err();
        assert_eq!(err, PipelineError::FirstStageMustBeSource);
    }

    #[test]
    fn builder_sets_default_definition() {
        let mut ex = PipelineExecutor::builder(InMemoryArtifactStore::new(), fast_config(0))
            .first_stage(Scripted::new("src", StageKind::Source, &[], &[A]))
            .add_stage(Scripted::new("end", StageKind::Sink, &[A], &[C]))
            .build()
            .unwrap();
        let result = ex.run().unwrap();
        assert!(result.is_success());
        assert_eq!(result.owner.as_deref(), Some("test"));
    }
}
