use std::time::Duration;

use serde_json::Value;

use super::run_result::StageRunResult;
use crate::model::{ArtifactDecl, ExecutionContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Source,
    Transform,
    Sink,
}

/// Contrato de un stage. Implementaciones deben ser puras respecto a inputs +
/// params: el único efecto visible son los outputs declarados, que el
/// executor confirma en el store.
pub trait Stage: Send + Sync + std::fmt::Debug {
    /// Identificador estable y único dentro del pipeline.
    fn id(&self) -> &str;

    fn kind(&self) -> StageKind;

    /// Artifacts requeridos, en orden.
    fn inputs(&self) -> &[ArtifactDecl];

    /// Artifacts producidos. Un intento exitoso debe producir exactamente
    /// este conjunto.
    fn outputs(&self) -> &[ArtifactDecl];

    /// Parámetros deterministas; forman parte del fingerprint.
    fn base_params(&self) -> Value;

    /// Límite de tiempo por intento. `None` = sin límite.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    fn run(&self, ctx: &ExecutionContext) -> StageRunResult;
}
