//! Corridas completas sobre el store en disco con fuentes CSV.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mlp_adapters::artifacts::{LabelsArtifact, ScalerArtifact, TableArtifact};
use mlp_adapters::names::{self, METRICS, RAW_DATASET};
use mlp_adapters::{metrics_of, ml_pipeline_with_source, CsvFileSource, EvaluateStage, FitStage, IngestStage,
                   TransformStage};
use mlp_core::{build_pipeline_definition, ArtifactSpec, ArtifactStore, PipelineExecutor, RetryPolicy, RunConfig,
               RunCoordinator, RunState, RunStatus, Stage, StageStatus};
use mlp_domain::csv_codec::read_table;
use mlp_domain::{train_test_split, LogisticRegressionConfig, Table, SPLIT_SEED, TEST_RATIO};
use mlp_persistence::FsArtifactStore;
use tempfile::TempDir;

fn run_config() -> RunConfig {
    RunConfig { retry: RetryPolicy { retries: 0,
                                     retry_delay: Duration::ZERO,
                                     ..RetryPolicy::default() },
                owner: "e2e".into() }
}

/// 30 filas, 4 features, clases balanceadas y separables por `f0`.
fn separable_csv() -> String {
    let mut out = String::from("f0,f1,f2,f3,target\n");
    for i in 0..30 {
        let label = i % 2;
        let f0 = if label == 1 { 3.0 + (i % 5) as f64 * 0.1 } else { -3.0 - (i % 5) as f64 * 0.1 };
        let f1 = ((i * 7) % 11) as f64 / 10.0;
        let f2 = ((i * 3) % 5) as f64 - 2.0;
        let f3 = (i % 4) as f64 * 0.5;
        writeln!(out, "{f0},{f1},{f2},{f3},{label}").unwrap();
    }
    out
}

fn write_csv(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

fn csv_pipeline(path: &Path) -> mlp_core::PipelineDefinition {
    ml_pipeline_with_source(Arc::new(CsvFileSource::new(path)), Duration::from_secs(5)).unwrap()
}

fn assert_no_transform_outputs(store: &FsArtifactStore) {
    for decl in [names::TRAIN_FEATURES,
                 names::TEST_FEATURES,
                 names::TRAIN_LABELS,
                 names::TEST_LABELS,
                 names::SCALER]
    {
        assert!(!store.exists(decl.name), "{} must not be written", decl.name);
    }
}

#[test]
fn csv_run_commits_every_artifact_and_bounded_metrics() {
    let tmp = TempDir::new().unwrap();
    let csv = write_csv(tmp.path(), "input.csv", &separable_csv());
    let store = Arc::new(FsArtifactStore::in_dir(tmp.path().join("out")));

    let result = PipelineExecutor::new(Arc::clone(&store), run_config()).execute_run(&csv_pipeline(&csv));

    assert!(result.is_success(), "{:?}", result.status);
    assert!(result.stages.iter().all(|s| s.status == StageStatus::Succeeded));
    for decl in names::ALL {
        assert!(store.exists(decl.name), "missing {}", decl.name);
    }
    let m = metrics_of(&result).unwrap();
    for v in [m.accuracy, m.precision, m.recall, m.f1] {
        assert!((0.0..=1.0).contains(&v));
    }
}

#[test]
fn split_is_eighty_twenty_and_preserves_rows() {
    let tmp = TempDir::new().unwrap();
    let csv = write_csv(tmp.path(), "input.csv", &separable_csv());
    let store = Arc::new(FsArtifactStore::in_dir(tmp.path().join("out")));
    assert!(PipelineExecutor::new(Arc::clone(&store), run_config()).execute_run(&csv_pipeline(&csv))
                                                                    .is_success());

    let train_x = TableArtifact::from_artifact(&store.load(&names::TRAIN_FEATURES).unwrap()).unwrap();
    let test_x = TableArtifact::from_artifact(&store.load(&names::TEST_FEATURES).unwrap()).unwrap();
    let train_y = LabelsArtifact::from_artifact(&store.load(&names::TRAIN_LABELS).unwrap()).unwrap();
    let test_y = LabelsArtifact::from_artifact(&store.load(&names::TEST_LABELS).unwrap()).unwrap();
    assert_eq!(test_x.0.n_rows(), 6);
    assert_eq!(train_x.0.n_rows(), 24);
    assert_eq!(train_y.0.len(), 24);
    assert_eq!(test_y.0.len(), 6);
    assert_eq!(train_x.0.columns(), ["f0", "f1", "f2", "f3"]);
}

#[test]
fn separable_data_is_classified_perfectly() {
    let tmp = TempDir::new().unwrap();
    let csv = write_csv(tmp.path(), "input.csv", &separable_csv());
    let store = Arc::new(FsArtifactStore::in_dir(tmp.path().join("out")));
    let result = PipelineExecutor::new(Arc::clone(&store), run_config()).execute_run(&csv_pipeline(&csv));

    let m = metrics_of(&result).unwrap();
    let test_y = LabelsArtifact::from_artifact(&store.load(&names::TEST_LABELS).unwrap()).unwrap();
    assert!(test_y.0.contains(&1) && test_y.0.contains(&0));
    assert_eq!(m.accuracy, 1.0);
    assert_eq!(m.precision, 1.0);
    assert_eq!(m.recall, 1.0);
    assert_eq!(m.f1, 1.0);
}

#[test]
fn scaler_is_fit_on_train_partition_only() {
    let tmp = TempDir::new().unwrap();
    let body = separable_csv();
    let csv = write_csv(tmp.path(), "input.csv", &body);
    let store = Arc::new(FsArtifactStore::in_dir(tmp.path().join("out")));
    assert!(PipelineExecutor::new(Arc::clone(&store), run_config()).execute_run(&csv_pipeline(&csv))
                                                                    .is_success());

    let scaler = ScalerArtifact::from_artifact(&store.load(&names::SCALER).unwrap()).unwrap().0;
    let raw = read_table(body.as_bytes()).unwrap();
    let split = train_test_split(raw.n_rows(), TEST_RATIO, SPLIT_SEED).unwrap();
    assert_eq!(scaler.n_samples_seen, split.train.len());
    assert_eq!(scaler.n_samples_seen, 24);
    assert_eq!(scaler.mean.len(), 4);

    for (col, mean) in scaler.mean.iter().enumerate() {
        let train_mean = split.train.iter().map(|&r| raw.rows()[r][col]).sum::<f64>() / split.train.len() as f64;
        assert!((mean - train_mean).abs() < 1e-9, "column {col}: {mean} vs train mean {train_mean}");
    }
}

#[test]
fn reruns_are_reproducible() {
    let tmp = TempDir::new().unwrap();
    let csv = write_csv(tmp.path(), "input.csv", &separable_csv());
    let store = Arc::new(FsArtifactStore::in_dir(tmp.path().join("out")));
    let def = csv_pipeline(&csv);

    let first = PipelineExecutor::new(Arc::clone(&store), run_config()).execute_run(&def);
    let snapshot: Vec<Vec<u8>> = names::ALL.iter().map(|d| store.get(d.name).unwrap()).collect();
    let second = PipelineExecutor::new(Arc::clone(&store), run_config()).execute_run(&def);

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(first.run_fingerprint, second.run_fingerprint);
    for (decl, before) in names::ALL.iter().zip(snapshot) {
        assert_eq!(store.get(decl.name).unwrap(), before, "{} changed between runs", decl.name);
    }
}

#[test]
fn fit_failure_halts_before_evaluate() {
    let tmp = TempDir::new().unwrap();
    let csv = write_csv(tmp.path(), "input.csv", &separable_csv());
    let store = Arc::new(FsArtifactStore::in_dir(tmp.path().join("out")));
    let bad_fit = FitStage::with_config(LogisticRegressionConfig { c: -1.0,
                                                                   ..LogisticRegressionConfig::default() });
    let stages: Vec<Arc<dyn Stage>> = vec![Arc::new(IngestStage::new(Arc::new(CsvFileSource::new(&csv)),
                                                                     Duration::from_secs(5))),
                                           Arc::new(TransformStage::new()),
                                           Arc::new(bad_fit),
                                           Arc::new(EvaluateStage::new())];
    let def = build_pipeline_definition(stages).unwrap();

    let result = PipelineExecutor::new(Arc::clone(&store), run_config()).execute_run(&def);

    assert_eq!(result.failed_stage(), Some("fit"));
    match &result.status {
        RunStatus::Failed { error, .. } => assert_eq!(error.kind(), "TrainingError"),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(result.stage("evaluate").unwrap().status, StageStatus::Pending);
    assert!(metrics_of(&result).is_none());
    assert!(!store.exists(METRICS.name));
    assert!(!store.exists(names::MODEL.name));
    assert!(store.exists(names::SCALER.name));
}

#[test]
fn missing_target_column_fails_transform_without_partial_outputs() {
    let tmp = TempDir::new().unwrap();
    let csv = write_csv(tmp.path(), "input.csv", "a,b,label\n1,2,0\n2,3,1\n3,4,0\n4,5,1\n5,6,0\n");
    let store = Arc::new(FsArtifactStore::in_dir(tmp.path().join("out")));

    let result = PipelineExecutor::new(Arc::clone(&store), run_config()).execute_run(&csv_pipeline(&csv));

    assert_eq!(result.failed_stage(), Some("transform"));
    match &result.status {
        RunStatus::Failed { error, .. } => assert_eq!(error.kind(), "SchemaError"),
        other => panic!("unexpected {other:?}"),
    }
    assert!(store.exists(RAW_DATASET.name));
    assert_no_transform_outputs(&store);
}

#[test]
fn single_row_dataset_fails_transform_with_empty_split() {
    let tmp = TempDir::new().unwrap();
    let csv = write_csv(tmp.path(), "input.csv", "f0,f1,target\n0.5,1.5,1\n");
    let store = Arc::new(FsArtifactStore::in_dir(tmp.path().join("out")));

    let result = PipelineExecutor::new(Arc::clone(&store), run_config()).execute_run(&csv_pipeline(&csv));

    assert_eq!(result.failed_stage(), Some("transform"));
    match &result.status {
        RunStatus::Failed { error, .. } => {
            assert_eq!(error.kind(), "EmptySplitError");
            assert_eq!(*error, mlp_core::PipelineError::EmptySplit { train_rows: 0, test_rows: 1 });
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_no_transform_outputs(&store);
}

#[test]
fn non_binary_target_fails_transform_with_schema_error() {
    let tmp = TempDir::new().unwrap();
    let csv = write_csv(tmp.path(), "input.csv", "a,b,target\n1,2,0\n2,3,1\n3,4,2\n4,5,1\n5,6,0\n");
    let store = Arc::new(FsArtifactStore::in_dir(tmp.path().join("out")));

    let result = PipelineExecutor::new(Arc::clone(&store), run_config()).execute_run(&csv_pipeline(&csv));

    assert_eq!(result.failed_stage(), Some("transform"));
    match &result.status {
        RunStatus::Failed { error, .. } => assert_eq!(error.kind(), "SchemaError"),
        other => panic!("unexpected {other:?}"),
    }
    assert!(store.exists(RAW_DATASET.name));
    assert_no_transform_outputs(&store);
}

#[test]
fn evaluate_with_narrower_test_features_writes_no_metrics() {
    let tmp = TempDir::new().unwrap();
    let csv = write_csv(tmp.path(), "input.csv", &separable_csv());
    let store = Arc::new(FsArtifactStore::in_dir(tmp.path().join("out")));
    let def = csv_pipeline(&csv);
    let mut executor = PipelineExecutor::new(Arc::clone(&store), run_config());
    assert!(executor.execute_run(&def).is_success());

    std::fs::remove_file(store.path_of(METRICS.name).unwrap()).unwrap();
    let narrow = Table::new(vec!["f0".into(), "f1".into(), "f2".into()],
                            (0..6).map(|i| vec![i as f64, 0.0, 1.0]).collect()).unwrap();
    store.put_batch(&[TableArtifact(narrow).into_artifact(names::TEST_FEATURES.name).unwrap()])
         .unwrap();

    let result = executor.execute_stage(&def, "evaluate").unwrap();

    match &result.status {
        RunStatus::Failed { stage_id, error } => {
            assert_eq!(stage_id, "evaluate");
            assert_eq!(error.kind(), "DimensionMismatchError");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(!store.exists(METRICS.name));
}

#[test]
fn coordinator_runs_submitted_pipeline_to_completion() {
    let tmp = TempDir::new().unwrap();
    let csv = write_csv(tmp.path(), "input.csv", &separable_csv());
    let coordinator = RunCoordinator::new(Arc::new(FsArtifactStore::in_dir(tmp.path().join("out"))));

    let run_id = coordinator.submit(csv_pipeline(&csv), run_config());
    let result = coordinator.wait(run_id).unwrap();

    assert_eq!(result.run_id, run_id);
    assert!(result.is_success(), "{:?}", result.status);
    assert!(matches!(coordinator.status(run_id), Some(RunState::Finished(_))));
    let summary = serde_json::to_value(&result).unwrap();
    assert_eq!(summary["owner"], "e2e");
    assert!(coordinator.store().exists(METRICS.name));
}
