//! Configuración explícita de una corrida.
//!
//! Nada aquí se lee del entorno: la carga desde variables/`.env` vive en
//! `mlp-persistence::config` y produce un `PipelineConfig` que se pasa al
//! executor al inicio de la corrida.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{classify_error, ErrorClass, PipelineError};

/// Cómo decide el executor si reintentar un intento fallido.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RetryMode {
    /// Reintenta cualquier fallo hasta agotar `retries`.
    #[default]
    Blind,
    /// Sólo reintenta errores clasificados como `Retryable`.
    Classified,
}

impl std::str::FromStr for RetryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blind" => Ok(Self::Blind),
            "classified" => Ok(Self::Classified),
            other => Err(format!("unknown retry mode '{other}' (expected blind|classified)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Reintentos adicionales tras el primer intento.
    pub retries: u32,
    pub retry_delay: Duration,
    pub mode: RetryMode,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { retries: 1,
               retry_delay: Duration::from_secs(60),
               mode: RetryMode::Blind }
    }
}

impl RetryPolicy {
    /// `attempt` empieza en 1. La cancelación nunca se reintenta.
    pub fn should_retry(&self, attempt: u32, error: &PipelineError) -> bool {
        if matches!(error, PipelineError::Cancelled) || attempt > self.retries {
            return false;
        }
        match self.mode {
            RetryMode::Blind => true,
            RetryMode::Classified => classify_error(error) == ErrorClass::Retryable,
        }
    }
}

/// Configuración reconocida por una corrida (`{retries, retry_delay, owner}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub retry: RetryPolicy,
    pub owner: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { retry: RetryPolicy::default(),
               owner: "mlpipe".to_string() }
    }
}

/// Origen del dataset crudo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DataSourceSpec {
    /// Dataset sintético determinista.
    Synthetic { rows: usize, features: usize, seed: u64 },
    /// CSV externo con columna `target`.
    Csv { path: PathBuf },
}

impl Default for DataSourceSpec {
    fn default() -> Self {
        Self::Synthetic { rows: 569,
                          features: 30,
                          seed: 42 }
    }
}

/// Configuración completa del pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Ubicación del artifact `raw-dataset`.
    pub raw_data_path: PathBuf,
    /// Directorio de splits y scaler.
    pub processed_data_path: PathBuf,
    /// Directorio de `model` y `metrics`.
    pub results_dir: PathBuf,
    pub source: DataSourceSpec,
    pub source_timeout: Duration,
    pub run: RunConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { raw_data_path: PathBuf::from("results/raw-dataset"),
               processed_data_path: PathBuf::from("results"),
               results_dir: PathBuf::from("results"),
               source: DataSourceSpec::default(),
               source_timeout: Duration::from_secs(30),
               run: RunConfig::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_one_blind_retry_after_a_minute() {
        let p = RetryPolicy::default();
        assert_eq!(p.retries, 1);
        assert_eq!(p.retry_delay, Duration::from_secs(60));
        assert!(p.should_retry(1, &PipelineError::SchemaError("x".into())));
        assert!(!p.should_retry(2, &PipelineError::SchemaError("x".into())));
    }

    #[test]
    fn classified_mode_skips_permanent_errors() {
        let p = RetryPolicy { mode: RetryMode::Classified,
                              ..RetryPolicy::default() };
        assert!(!p.should_retry(1, &PipelineError::TrainingError("bad".into())));
        assert!(p.should_retry(1, &PipelineError::SourceUnavailable("down".into())));
    }

    #[test]
    fn cancellation_is_never_retried() {
        assert!(!RetryPolicy::default().should_retry(1, &PipelineError::Cancelled));
    }

    #[test]
    fn retry_mode_parses_case_insensitively() {
        assert_eq!("Classified".parse::<RetryMode>(), Ok(RetryMode::Classified));
        assert!("sometimes".parse::<RetryMode>().is_err());
    }
}
