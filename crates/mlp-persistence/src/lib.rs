//! mlp-persistence
//!
//! Implementación en disco del `ArtifactStore` y carga de configuración
//! desde el entorno.
//!
//! Módulos:
//! - `fs`: store de archivos con escrituras atómicas (temp + rename) y
//!   layout configurable por artifact.
//! - `config`: `PipelineConfig` desde variables de entorno / `.env`.
//! - `error`: errores de persistencia y configuración.

pub mod config;
pub mod error;
pub mod fs;

pub use config::{init_dotenv, pipeline_config_from_env, pipeline_config_from_lookup};
pub use error::{ConfigError, PersistenceError};
pub use fs::{ArtifactLayout, FsArtifactStore};
