//! Split train/test determinista.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::dataset::LabeledDataset;
use crate::errors::DomainError;

/// Fracción de filas que va a test.
pub const TEST_RATIO: f64 = 0.2;
/// Semilla fija del barajado.
pub const SPLIT_SEED: u64 = 42;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Baraja `0..n` con `seed` y toma las primeras `ceil(n * test_ratio)`
/// posiciones como test. `EmptySplit` si alguna partición queda vacía.
pub fn train_test_split(n: usize, test_ratio: f64, seed: u64) -> Result<SplitIndices, DomainError> {
    let n_test = ((n as f64) * test_ratio).ceil() as usize;
    let n_test = n_test.min(n);
    if n_test == 0 || n_test == n {
        return Err(DomainError::EmptySplit { train_rows: n - n_test,
                                             test_rows: n_test });
    }
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);
    let train = order.split_off(n_test);
    Ok(SplitIndices { train, test: order })
}

impl LabeledDataset {
    /// Aplica `train_test_split` y devuelve `(train, test)`.
    pub fn split(&self, test_ratio: f64, seed: u64) -> Result<(Self, Self), DomainError> {
        let idx = train_test_split(self.len(), test_ratio, seed)?;
        Ok((self.select(&idx.train), self.select(&idx.test)))
    }
}
