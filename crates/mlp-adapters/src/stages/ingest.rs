//! IngestStage (Source): carga el dataset crudo desde la fuente configurada.

use std::sync::Arc;
use std::time::Duration;

use log::info;
use mlp_core::{ArtifactDecl, ExecutionContext, Stage, StageKind, StageRunResult};
use serde_json::{json, Value};

use super::emit;
use crate::artifacts::TableArtifact;
use crate::names::RAW_DATASET;
use crate::source::DataSource;

const OUTPUTS: [ArtifactDecl; 1] = [RAW_DATASET];

#[derive(Debug, Clone)]
pub struct IngestStage {
    source: Arc<dyn DataSource>,
    timeout: Duration,
}

impl IngestStage {
    pub fn new(source: Arc<dyn DataSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }
}

impl Stage for IngestStage {
    fn id(&self) -> &str {
        "ingest"
    }

    fn kind(&self) -> StageKind {
        StageKind::Source
    }

    fn inputs(&self) -> &[ArtifactDecl] {
        &[]
    }

    fn outputs(&self) -> &[ArtifactDecl] {
        &OUTPUTS
    }

    fn base_params(&self) -> Value {
        json!({ "source": self.source.describe() })
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }

    fn run(&self, _ctx: &ExecutionContext) -> StageRunResult {
        let result = self.source.load().and_then(|table| {
                                           info!("ingest: loaded rows={} columns={}", table.n_rows(), table.n_cols());
                                           Ok(vec![emit(RAW_DATASET, &TableArtifact(table))?])
                                       });
        result.into()
    }
}
