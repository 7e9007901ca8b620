//! Stages concretos del pipeline.

mod evaluate;
mod fit;
mod ingest;
mod transform;

pub use evaluate::EvaluateStage;
pub use fit::FitStage;
pub use ingest::IngestStage;
pub use transform::TransformStage;

use mlp_core::{Artifact, ArtifactDecl, ArtifactSpec, PipelineError};

/// Codifica un artifact tipado con el nombre de su declaración.
pub(crate) fn emit<T: ArtifactSpec>(decl: ArtifactDecl, value: &T) -> Result<Artifact, PipelineError> {
    value.into_artifact(decl.name)
}
