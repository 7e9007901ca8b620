use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use super::{Artifact, ArtifactSpec};
use crate::errors::PipelineError;

/// Contexto de ejecución entregado a `Stage::run`.
///
/// `inputs` contiene exactamente los artifacts declarados por el stage, ya
/// leídos del store y producidos en la corrida actual.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub run_id: Uuid,
    pub stage_id: String,
    pub attempt: u32,
    pub inputs: BTreeMap<String, Artifact>,
    pub params: Value,
}

impl ExecutionContext {
    /// Artifact de entrada por nombre lógico.
    pub fn input(&self, name: &str) -> Result<&Artifact, PipelineError> {
        self.inputs
            .get(name)
            .ok_or_else(|| PipelineError::MissingInputs(vec![name.to_string()]))
    }

    /// Decodifica un input a su tipo concreto.
    pub fn decode<T: ArtifactSpec>(&self, name: &str) -> Result<T, PipelineError> {
        let artifact = self.input(name)?;
        T::from_artifact(artifact).map_err(|e| PipelineError::Decode { artifact: name.to_string(),
                                                                       reason: e.to_string() })
    }

    /// Params deserializados al tipo del stage.
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, PipelineError> {
        serde_json::from_value(self.params.clone()).map_err(|e| PipelineError::Internal(format!("params: {e}")))
    }
}
