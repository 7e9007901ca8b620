use std::path::PathBuf;

use mlp_core::PipelineConfig;

use crate::error::PersistenceError;

/// Ubicación física de cada artifact.
///
/// - `raw-dataset` → `raw_data_path` (ruta de archivo completa);
/// - splits y `scaler` → `processed_dir/<nombre>`;
/// - el resto (`model`, `metrics`, ...) → `results_dir/<nombre>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    raw_data_path: PathBuf,
    processed_dir: PathBuf,
    results_dir: PathBuf,
}

const PROCESSED: [&str; 5] = ["train-features", "test-features", "train-labels", "test-labels", "scaler"];

impl ArtifactLayout {
    pub fn new(raw_data_path: PathBuf, processed_dir: PathBuf, results_dir: PathBuf) -> Self {
        Self { raw_data_path,
               processed_dir,
               results_dir }
    }

    pub fn single_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self::new(dir.join("raw-dataset"), dir.clone(), dir)
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.raw_data_path.clone(),
                  config.processed_data_path.clone(),
                  config.results_dir.clone())
    }

    pub fn path_for(&self, name: &str) -> Result<PathBuf, PersistenceError> {
        validate_name(name)?;
        Ok(match name {
            "raw-dataset" => self.raw_data_path.clone(),
            n if PROCESSED.contains(&n) => self.processed_dir.join(n),
            n => self.results_dir.join(n),
        })
    }
}

/// Nombres planos: `[A-Za-z0-9._-]`, sin separadores ni prefijo `.`.
fn validate_name(name: &str) -> Result<(), PersistenceError> {
    let ok = !name.is_empty()
             && !name.starts_with('.')
             && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if ok {
        Ok(())
    } else {
        Err(PersistenceError::InvalidName(name.to_string()))
    }
}
