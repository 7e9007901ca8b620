//! CLI del pipeline.
//!
//! `mlpipe run` ejecuta Ingest → Transform → Fit → Evaluate;
//! `mlpipe stage <id>` re-ejecuta un stage contra los artifacts existentes;
//! `mlpipe metrics` imprime el artifact `metrics` actual.
//!
//! La configuración sale del entorno (`.env` incluido) y los flags la
//! sobreescriben. Códigos de salida: 0 ok, 2 uso, 3 configuración,
//! 4 corrida fallida, 5 interno.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::error;
use mlp_adapters::artifacts::MetricsArtifact;
use mlp_adapters::names::METRICS;
use mlp_adapters::{metrics_of, ml_pipeline_definition};
use mlp_core::{ArtifactSpec, ArtifactStore, DataSourceSpec, PipelineConfig, PipelineExecutor, RetryMode, RunResult,
               RunStatus, StoreError};
use mlp_persistence::{pipeline_config_from_env, FsArtifactStore};
use serde_json::json;
use tracing_subscriber::EnvFilter;

const EXIT_OK: u8 = 0;
const EXIT_USAGE: u8 = 2;
const EXIT_CONFIG: u8 = 3;
const EXIT_RUN_FAILED: u8 = 4;
const EXIT_INTERNAL: u8 = 5;

#[derive(Parser, Debug)]
#[command(name = "mlpipe", version, about = "Linear ML pipeline: ingest, transform, fit, evaluate")]
struct Cli {
    /// Ruta del artifact raw-dataset (RAW_DATA_PATH)
    #[arg(long, global = true)]
    raw_data_path: Option<PathBuf>,

    /// Directorio de splits y scaler (PROCESSED_DATA_PATH)
    #[arg(long, global = true)]
    processed_data_path: Option<PathBuf>,

    /// Directorio de model y metrics (RESULTS_DIR)
    #[arg(long, global = true)]
    results_dir: Option<PathBuf>,

    /// `synthetic` o ruta a un CSV con columna `target` (DATA_SOURCE)
    #[arg(long, global = true)]
    data_source: Option<String>,

    /// Reintentos por stage (PIPELINE_RETRIES)
    #[arg(long, global = true)]
    retries: Option<u32>,

    /// Espera entre reintentos en segundos (PIPELINE_RETRY_DELAY_SECS)
    #[arg(long, global = true)]
    retry_delay_secs: Option<u64>,

    /// blind | classified (PIPELINE_RETRY_MODE)
    #[arg(long, global = true)]
    retry_mode: Option<RetryMode>,

    /// Dueño de la corrida (PIPELINE_OWNER)
    #[arg(long, global = true)]
    owner: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ejecuta el pipeline completo
    Run,
    /// Ejecuta un único stage (ingest | transform | fit | evaluate)
    Stage { id: String },
    /// Imprime las métricas guardadas
    Metrics,
}

impl Cli {
    fn apply(&self, cfg: &mut PipelineConfig) {
        if let Some(p) = &self.raw_data_path {
            cfg.raw_data_path = p.clone();
        }
        if let Some(p) = &self.processed_data_path {
            cfg.processed_data_path = p.clone();
        }
        if let Some(p) = &self.results_dir {
            cfg.results_dir = p.clone();
        }
        if let Some(s) = &self.data_source {
            cfg.source = if s.eq_ignore_ascii_case("synthetic") {
                DataSourceSpec::default()
            } else {
                DataSourceSpec::Csv { path: PathBuf::from(s) }
            };
        }
        if let Some(n) = self.retries {
            cfg.run.retry.retries = n;
        }
        if let Some(secs) = self.retry_delay_secs {
            cfg.run.retry.retry_delay = std::time::Duration::from_secs(secs);
        }
        if let Some(mode) = self.retry_mode {
            cfg.run.retry.mode = mode;
        }
        if let Some(owner) = &self.owner {
            cfg.run.owner = owner.clone();
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // `try_init` también instala el puente `log` → `tracing`.
    let _ = tracing_subscriber::fmt().with_env_filter(filter)
                                     .with_writer(std::io::stderr)
                                     .with_target(true)
                                     .try_init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_USAGE } else { EXIT_OK };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };
    init_logging();

    let mut cfg = match pipeline_config_from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("[mlpipe] configuration error: {e}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    cli.apply(&mut cfg);

    ExitCode::from(match &cli.command {
                       Command::Run => run_pipeline(&cfg, None),
                       Command::Stage { id } => run_pipeline(&cfg, Some(id)),
                       Command::Metrics => print_metrics(&cfg),
                   })
}

fn run_pipeline(cfg: &PipelineConfig, stage: Option<&str>) -> u8 {
    let definition = match ml_pipeline_definition(cfg) {
        Ok(d) => d,
        Err(e) => {
            error!("invalid pipeline definition: {e}");
            return EXIT_INTERNAL;
        }
    };
    let store = FsArtifactStore::from_config(cfg);
    let mut executor = PipelineExecutor::new(store, cfg.run.clone());
    let result = match stage {
        None => executor.execute_run(&definition),
        Some(id) => match executor.execute_stage(&definition, id) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("[mlpipe] {e}; known stages: {:?}", definition.stage_ids());
                return EXIT_USAGE;
            }
        },
    };
    match serde_json::to_string_pretty(&summary(&result)) {
        Ok(s) => println!("{s}"),
        Err(e) => {
            error!("cannot render run summary: {e}");
            return EXIT_INTERNAL;
        }
    }
    exit_code_for(&result)
}

fn summary(result: &RunResult) -> serde_json::Value {
    let (failed_stage, error_kind, error) = match &result.status {
        RunStatus::Failed { stage_id, error } => (Some(stage_id.clone()), Some(error.kind()), Some(error.to_string())),
        _ => (None, None, None),
    };
    json!({
        "run_id": result.run_id,
        "owner": result.owner,
        "status": result.status,
        "failed_stage": failed_stage,
        "error_kind": error_kind,
        "error": error,
        "stages": result.stages,
        "run_fingerprint": result.run_fingerprint,
        "metrics": metrics_of(result),
    })
}

fn exit_code_for(result: &RunResult) -> u8 {
    match &result.status {
        RunStatus::Succeeded => EXIT_OK,
        RunStatus::Failed { error, .. } if error.kind() == "Internal" => EXIT_INTERNAL,
        _ => EXIT_RUN_FAILED,
    }
}

fn print_metrics(cfg: &PipelineConfig) -> u8 {
    let store = FsArtifactStore::from_config(cfg);
    let artifact = match store.load(&METRICS) {
        Ok(a) => a,
        Err(StoreError::NotFound(_)) => {
            eprintln!("[mlpipe] no metrics yet; run the pipeline first");
            return EXIT_RUN_FAILED;
        }
        Err(e) => {
            eprintln!("[mlpipe] {e}");
            return EXIT_INTERNAL;
        }
    };
    match MetricsArtifact::from_artifact(&artifact) {
        Ok(MetricsArtifact(m)) => {
            println!("{}", json!({ "accuracy": m.accuracy, "precision": m.precision, "recall": m.recall, "f1": m.f1 }));
            EXIT_OK
        }
        Err(e) => {
            eprintln!("[mlpipe] metrics artifact is corrupt: {e}");
            EXIT_INTERNAL
        }
    }
}
