//! Dataset sintético determinista para clasificación binaria.
//!
//! Sustituye al dataset de referencia embebido (569 filas × 30 features):
//! features gaussianas, las primeras `features / 3` desplazadas según la
//! clase, y una proporción de positivos cercana a 0.63.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::dataset::{LabeledDataset, Table};
use crate::errors::DomainError;

const POSITIVE_RATE: f64 = 0.627;
const CLASS_SHIFT: f64 = 1.0;

pub fn make_classification(rows: usize, features: usize, seed: u64) -> Result<LabeledDataset, DomainError> {
    if rows < 2 {
        return Err(DomainError::Schema(format!("synthetic dataset needs at least 2 rows, got {rows}")));
    }
    if features == 0 {
        return Err(DomainError::Schema("synthetic dataset needs at least one feature".into()));
    }
    let informative = (features / 3).max(1);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut labels = Vec::with_capacity(rows);
    let mut data = Vec::with_capacity(rows);
    for r in 0..rows {
        // Las dos primeras filas fijan ambas clases.
        let label: u8 = match r {
            0 => 0,
            1 => 1,
            _ => u8::from(rng.random::<f64>() < POSITIVE_RATE),
        };
        let sign = if label == 1 { 1.0 } else { -1.0 };
        let row = (0..features).map(|c| {
                                   let shift = if c < informative { sign * CLASS_SHIFT } else { 0.0 };
                                   standard_normal(&mut rng) + shift
                               })
                               .collect();
        labels.push(label);
        data.push(row);
    }
    let columns = (0..features).map(|c| format!("feature_{c:02}")).collect();
    LabeledDataset::new(Table::new(columns, data)?, labels)
}

/// Box-Muller.
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
