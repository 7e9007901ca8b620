//! Standard scaler (z-score).
//!
//! `z = (x - mean) / scale`, con `scale` la desviación estándar poblacional
//! (ddof = 0) de cada feature. Una feature constante usa `scale = 1`.
//!
//! El tipo sin ajustar sólo sabe `fit`; el ajustado sólo sabe `transform`.
//! Así no se puede transformar sin ajustar ni re-ajustar sobre test.

use serde::{Deserialize, Serialize};

use crate::dataset::Table;
use crate::errors::DomainError;

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardScaler;

impl StandardScaler {
    pub fn new() -> Self {
        Self
    }

    pub fn fit(self, data: &Table) -> Result<FittedStandardScaler, DomainError> {
        let rows = data.n_rows();
        if rows == 0 {
            return Err(DomainError::Schema("cannot fit scaler on empty data".into()));
        }
        let cols = data.n_cols();
        let n = rows as f64;
        let mut mean = vec![0.0; cols];
        for row in data.rows() {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut var = vec![0.0; cols];
        for row in data.rows() {
            for ((s, v), m) in var.iter_mut().zip(row).zip(&mean) {
                *s += (v - m) * (v - m);
            }
        }
        let scale = var.into_iter()
                       .map(|s| {
                           let std = (s / n).sqrt();
                           if std == 0.0 {
                               1.0
                           } else {
                               std
                           }
                       })
                       .collect();
        Ok(FittedStandardScaler { feature_names: data.columns().to_vec(),
                                  mean,
                                  scale,
                                  n_samples_seen: rows })
    }
}

/// Parámetros ajustados; es lo que se persiste como artifact `scaler`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedStandardScaler {
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    pub n_samples_seen: usize,
}

impl FittedStandardScaler {
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, data: &Table) -> Result<Table, DomainError> {
        if data.n_cols() != self.n_features() {
            return Err(DomainError::DimensionMismatch { expected: self.n_features(),
                                                        found: data.n_cols() });
        }
        let rows = data.rows()
                       .iter()
                       .map(|row| {
                           row.iter()
                              .zip(self.mean.iter().zip(&self.scale))
                              .map(|(v, (m, s))| (v - m) / s)
                              .collect()
                       })
                       .collect();
        Ok(data.with_rows(rows))
    }

    /// Consistencia interna tras deserializar.
    pub fn validate(&self) -> Result<(), String> {
        if self.mean.len() != self.scale.len() || self.mean.len() != self.feature_names.len() {
            return Err("scaler mean/scale/feature_names lengths differ".into());
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err("scaler scale must be finite and positive".into());
        }
        Ok(())
    }
}
