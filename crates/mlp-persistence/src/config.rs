//! Carga de `PipelineConfig` desde variables de entorno.
//!
//! Variables reconocidas (todas opcionales):
//! `RAW_DATA_PATH`, `PROCESSED_DATA_PATH`, `RESULTS_DIR`, `DATA_SOURCE`
//! (`synthetic` o ruta a un CSV), `PIPELINE_RETRIES`,
//! `PIPELINE_RETRY_DELAY_SECS`, `PIPELINE_RETRY_MODE` (`blind` |
//! `classified`), `PIPELINE_OWNER`, `SOURCE_TIMEOUT_SECS`.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;
use log::debug;
use mlp_core::{DataSourceSpec, PipelineConfig, RetryMode};
use once_cell::sync::Lazy;

use crate::error::ConfigError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

pub fn pipeline_config_from_env() -> Result<PipelineConfig, ConfigError> {
    init_dotenv();
    pipeline_config_from_lookup(|k| env::var(k).ok())
}

/// Igual que `pipeline_config_from_env` pero con un lookup inyectable.
pub fn pipeline_config_from_lookup<F>(lookup: F) -> Result<PipelineConfig, ConfigError>
    where F: Fn(&str) -> Option<String>
{
    let mut cfg = PipelineConfig::default();
    let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(v) = get("RAW_DATA_PATH") {
        cfg.raw_data_path = PathBuf::from(v);
    }
    if let Some(v) = get("PROCESSED_DATA_PATH") {
        cfg.processed_data_path = PathBuf::from(v);
    }
    if let Some(v) = get("RESULTS_DIR") {
        cfg.results_dir = PathBuf::from(v);
    }
    if let Some(v) = get("DATA_SOURCE") {
        cfg.source = if v.eq_ignore_ascii_case("synthetic") {
            DataSourceSpec::default()
        } else {
            DataSourceSpec::Csv { path: PathBuf::from(v) }
        };
    }
    if let Some(v) = get("PIPELINE_RETRIES") {
        cfg.run.retry.retries = parse("PIPELINE_RETRIES", &v)?;
    }
    if let Some(v) = get("PIPELINE_RETRY_DELAY_SECS") {
        cfg.run.retry.retry_delay = Duration::from_secs(parse("PIPELINE_RETRY_DELAY_SECS", &v)?);
    }
    if let Some(v) = get("PIPELINE_RETRY_MODE") {
        cfg.run.retry.mode = v.parse::<RetryMode>()
                              .map_err(|reason| ConfigError::Invalid { var: "PIPELINE_RETRY_MODE",
                                                                       value: v.clone(),
                                                                       reason })?;
    }
    if let Some(v) = get("PIPELINE_OWNER") {
        cfg.run.owner = v;
    }
    if let Some(v) = get("SOURCE_TIMEOUT_SECS") {
        cfg.source_timeout = Duration::from_secs(parse("SOURCE_TIMEOUT_SECS", &v)?);
    }
    debug!("config: {cfg:?}");
    Ok(cfg)
}

fn parse<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
    where T: FromStr,
          T::Err: std::fmt::Display
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid { var,
                                                            value: value.to_string(),
                                                            reason: e.to_string() })
}
