//! Métricas de clasificación binaria (clase positiva = 1).

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Registro persistido como artifact `metrics`. Divisiones por cero valen 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl ClassificationMetrics {
    pub fn compute(y_true: &[u8], y_pred: &[u8]) -> Result<Self, DomainError> {
        if y_true.len() != y_pred.len() {
            return Err(DomainError::Schema(format!("{} labels but {} predictions", y_true.len(), y_pred.len())));
        }
        if y_true.is_empty() {
            return Err(DomainError::Schema("cannot evaluate on zero rows".into()));
        }
        let (mut tp, mut fp, mut fn_, mut tn) = (0usize, 0usize, 0usize, 0usize);
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (t, p) {
                (1, 1) => tp += 1,
                (0, 1) => fp += 1,
                (1, 0) => fn_ += 1,
                (0, 0) => tn += 1,
                _ => return Err(DomainError::Schema(format!("non-binary pair (true={t}, pred={p})"))),
            }
        }
        Ok(Self { accuracy: ratio(tp + tn, y_true.len()),
                  precision: ratio(tp, tp + fp),
                  recall: ratio(tp, tp + fn_),
                  f1: ratio(2 * tp, 2 * tp + fp + fn_) })
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, v) in [("accuracy", self.accuracy),
                          ("precision", self.precision),
                          ("recall", self.recall),
                          ("f1", self.f1)]
        {
            if !(0.0..=1.0).contains(&v) {
                return Err(format!("{name} = {v} outside [0, 1]"));
            }
        }
        Ok(())
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}
