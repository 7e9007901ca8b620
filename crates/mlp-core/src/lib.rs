//! mlp-core: executor lineal determinista para pipelines de ML.
//!
//! Contiene los contratos neutrales (stage, artifact, store, eventos), el
//! `PipelineExecutor` con reintentos/timeout/cancelación y un coordinador de
//! referencia. No conoce ningún algoritmo de ML: eso vive en `mlp-domain` y
//! `mlp-adapters`.
pub mod config;
pub mod constants;
pub mod coordinator;
pub mod engine;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod model;
pub mod repo;
pub mod stage;
pub mod store;

pub use config::{DataSourceSpec, PipelineConfig, RetryMode, RetryPolicy, RunConfig};
pub use coordinator::{RunCoordinator, RunState};
pub use engine::{CancellationToken, PipelineExecutor, RunResult};
pub use errors::{classify_error, ErrorClass, PipelineError, StoreError};
pub use event::{EventStore, InMemoryEventStore, RunEvent, RunEventKind};
pub use model::{Artifact, ArtifactDecl, ArtifactFormat, ArtifactSpec, ExecutionContext};
pub use repo::{build_pipeline_definition, InMemoryRunRepository, PipelineDefinition, RunRepository, RunStatus, StageSlot};
pub use stage::{Stage, StageKind, StageRunResult, StageSignal, StageStatus};
pub use store::{ArtifactStore, InMemoryArtifactStore};
