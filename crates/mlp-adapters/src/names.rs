//! Nombres lógicos de artifacts (también nombres de archivo en el store).

use mlp_core::{ArtifactDecl, ArtifactFormat};

pub const RAW_DATASET: ArtifactDecl = ArtifactDecl::new("raw-dataset", ArtifactFormat::Tabular);
pub const TRAIN_FEATURES: ArtifactDecl = ArtifactDecl::new("train-features", ArtifactFormat::Tabular);
pub const TEST_FEATURES: ArtifactDecl = ArtifactDecl::new("test-features", ArtifactFormat::Tabular);
pub const TRAIN_LABELS: ArtifactDecl = ArtifactDecl::new("train-labels", ArtifactFormat::Tabular);
pub const TEST_LABELS: ArtifactDecl = ArtifactDecl::new("test-labels", ArtifactFormat::Tabular);
pub const SCALER: ArtifactDecl = ArtifactDecl::new("scaler", ArtifactFormat::Transformer);
pub const MODEL: ArtifactDecl = ArtifactDecl::new("model", ArtifactFormat::Model);
pub const METRICS: ArtifactDecl = ArtifactDecl::new("metrics", ArtifactFormat::Metrics);

/// Todos los artifacts, en orden de producción.
pub const ALL: [ArtifactDecl; 8] = [RAW_DATASET,
                                    TRAIN_FEATURES,
                                    TEST_FEATURES,
                                    TRAIN_LABELS,
                                    TEST_LABELS,
                                    SCALER,
                                    MODEL,
                                    METRICS];
