// mlp-domain library entry point
pub mod csv_codec;
pub mod dataset;
pub mod errors;
pub mod logistic;
pub mod metrics;
pub mod scaler;
pub mod split;
pub mod synthetic;

pub use dataset::{LabeledDataset, Table, LABEL_COLUMN};
pub use errors::DomainError;
pub use logistic::{LogisticRegression, LogisticRegressionConfig, TrainedLogisticRegression};
pub use metrics::ClassificationMetrics;
pub use scaler::{FittedStandardScaler, StandardScaler};
pub use split::{train_test_split, SplitIndices, TEST_RATIO, SPLIT_SEED};
