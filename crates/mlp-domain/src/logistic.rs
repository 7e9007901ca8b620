//! Regresión logística binaria con regularización L2.
//!
//! Minimiza la log-loss media más `||w||² / (2·C·n)` (el bias no se
//! regulariza), que es el objetivo `C·Σ loss + ½||w||²` escalado por `1/(C·n)`.
//! El ajuste parte de ceros y usa iteraciones de Newton con backtracking de
//! Armijo; si el hessiano no es definido positivo ese paso usa el gradiente.
//! Todo es determinista: mismos datos y config dan los mismos pesos.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::dataset::Table;
use crate::errors::DomainError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegressionConfig {
    /// Inverso de la fuerza de regularización.
    pub c: f64,
    pub max_iter: usize,
    /// Umbral sobre `max |∇|` para declarar convergencia.
    pub tol: f64,
    /// Se registra en el modelo; el ajuste no usa aleatoriedad.
    pub random_state: u64,
}

impl Default for LogisticRegressionConfig {
    fn default() -> Self {
        Self { c: 1.0,
               max_iter: 1000,
               tol: 1e-4,
               random_state: 42 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogisticRegression {
    config: LogisticRegressionConfig,
}

impl LogisticRegression {
    pub fn new(config: LogisticRegressionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LogisticRegressionConfig {
        &self.config
    }

    pub fn fit(&self, x: &Table, y: &[u8]) -> Result<TrainedLogisticRegression, DomainError> {
        let rows = x.n_rows();
        let d = x.n_cols();
        if rows == 0 {
            return Err(DomainError::Training("no training rows".into()));
        }
        if d == 0 {
            return Err(DomainError::Training("no feature columns".into()));
        }
        if rows != y.len() {
            return Err(DomainError::Training(format!("{rows} feature rows but {} labels", y.len())));
        }
        if let Some(bad) = y.iter().find(|&&l| l > 1) {
            return Err(DomainError::Training(format!("label {bad} is not binary")));
        }
        if y.iter().all(|&l| l == y[0]) {
            return Err(DomainError::Training(format!("training labels contain a single class ({})", y[0])));
        }
        if !(self.config.c > 0.0 && self.config.c.is_finite()) {
            return Err(DomainError::Training(format!("C must be positive, got {}", self.config.c)));
        }

        let lambda = 1.0 / (self.config.c * rows as f64);
        let problem = Problem { x: x.rows(),
                                y,
                                lambda };
        let mut theta = vec![0.0; d + 1];
        let mut loss = problem.objective(&theta);
        let mut n_iter = 0;
        let mut converged = false;

        'outer: while n_iter < self.config.max_iter {
            let (grad, hess) = problem.derivatives(&theta);
            if max_abs(&grad) <= self.config.tol {
                converged = true;
                break;
            }
            let dir = cholesky_solve(hess, &grad).unwrap_or_else(|| grad.clone());
            let slope = dot(&grad, &dir);
            let mut t = 1.0;
            loop {
                let cand: Vec<f64> = theta.iter().zip(&dir).map(|(th, g)| th - t * g).collect();
                let cand_loss = problem.objective(&cand);
                if cand_loss <= loss - 1e-4 * t * slope {
                    theta = cand;
                    loss = cand_loss;
                    break;
                }
                t *= 0.5;
                if t < 1e-10 {
                    // sin descenso posible a precisión de máquina
                    n_iter += 1;
                    break 'outer;
                }
            }
            n_iter += 1;
        }
        if !loss.is_finite() {
            return Err(DomainError::Training("objective diverged".into()));
        }
        if !converged {
            converged = max_abs(&problem.derivatives(&theta).0) <= self.config.tol;
        }
        debug!("logistic:fit rows={rows} features={d} n_iter={n_iter} converged={converged} loss={loss}");

        let bias = theta.pop().unwrap_or(0.0);
        Ok(TrainedLogisticRegression { feature_names: x.columns().to_vec(),
                                       weights: theta,
                                       bias,
                                       n_iter,
                                       converged,
                                       config: self.config.clone() })
    }
}

/// Modelo ajustado; es lo que se persiste como artifact `model`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedLogisticRegression {
    pub feature_names: Vec<String>,
    pub weights: Vec<f64>,
    pub bias: f64,
    pub n_iter: usize,
    pub converged: bool,
    pub config: LogisticRegressionConfig,
}

impl TrainedLogisticRegression {
    pub fn n_features(&self) -> usize {
        self.weights.len()
    }

    fn check_width(&self, x: &Table) -> Result<(), DomainError> {
        if x.n_cols() != self.n_features() {
            return Err(DomainError::DimensionMismatch { expected: self.n_features(),
                                                        found: x.n_cols() });
        }
        Ok(())
    }

    pub fn decision_function(&self, x: &Table) -> Result<Vec<f64>, DomainError> {
        self.check_width(x)?;
        Ok(x.rows().iter().map(|r| dot(&self.weights, r) + self.bias).collect())
    }

    /// Clase 1 cuando el logit es positivo.
    pub fn predict(&self, x: &Table) -> Result<Vec<u8>, DomainError> {
        Ok(self.decision_function(x)?.into_iter().map(|z| u8::from(z > 0.0)).collect())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.weights.len() != self.feature_names.len() {
            return Err(format!("model has {} weights but {} feature names",
                               self.weights.len(),
                               self.feature_names.len()));
        }
        if !self.bias.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err("model parameters must be finite".into());
        }
        Ok(())
    }
}

struct Problem<'a> {
    x: &'a [Vec<f64>],
    y: &'a [u8],
    lambda: f64,
}

impl Problem<'_> {
    fn n(&self) -> f64 {
        self.x.len() as f64
    }

    fn logit(&self, theta: &[f64], row: &[f64]) -> f64 {
        let d = row.len();
        dot(&theta[..d], row) + theta[d]
    }

    fn objective(&self, theta: &[f64]) -> f64 {
        let d = theta.len() - 1;
        let data: f64 = self.x
                            .iter()
                            .zip(self.y)
                            .map(|(row, &y)| {
                                let z = self.logit(theta, row);
                                softplus(z) - f64::from(y) * z
                            })
                            .sum();
        data / self.n() + 0.5 * self.lambda * dot(&theta[..d], &theta[..d])
    }

    /// Gradiente y hessiano (denso, fila mayor) sobre `[w, b]`.
    fn derivatives(&self, theta: &[f64]) -> (Vec<f64>, Vec<Vec<f64>>) {
        let p = theta.len();
        let d = p - 1;
        let n = self.n();
        let mut grad = vec![0.0; p];
        let mut hess = vec![vec![0.0; p]; p];
        for (row, &y) in self.x.iter().zip(self.y) {
            let prob = sigmoid(self.logit(theta, row));
            let r = prob - f64::from(y);
            let w = prob * (1.0 - prob);
            for i in 0..p {
                let xi = if i < d { row[i] } else { 1.0 };
                grad[i] += r * xi;
                for j in 0..=i {
                    let xj = if j < d { row[j] } else { 1.0 };
                    hess[i][j] += w * xi * xj;
                }
            }
        }
        for i in 0..p {
            grad[i] /= n;
            for j in 0..=i {
                hess[i][j] /= n;
                hess[j][i] = hess[i][j];
            }
        }
        for i in 0..d {
            grad[i] += self.lambda * theta[i];
            hess[i][i] += self.lambda;
        }
        hess[d][d] += 1e-10;
        (grad, hess)
    }
}

/// Resuelve `A·x = b` con `A` simétrica definida positiva. `None` si no lo es.
fn cholesky_solve(mut a: Vec<Vec<f64>>, b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    for j in 0..n {
        let mut diag = a[j][j];
        for k in 0..j {
            diag -= a[j][k] * a[j][k];
        }
        if diag <= 0.0 || !diag.is_finite() {
            return None;
        }
        let diag = diag.sqrt();
        a[j][j] = diag;
        for i in (j + 1)..n {
            let mut s = a[i][j];
            for k in 0..j {
                s -= a[i][k] * a[j][k];
            }
            a[i][j] = s / diag;
        }
    }
    // L·y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let s: f64 = (0..i).map(|k| a[i][k] * y[k]).sum();
        y[i] = (b[i] - s) / a[i][i];
    }
    // Lᵀ·x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let s: f64 = ((i + 1)..n).map(|k| a[k][i] * x[k]).sum();
        x[i] = (y[i] - s) / a[i][i];
    }
    Some(x)
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn max_abs(v: &[f64]) -> f64 {
    v.iter().fold(0.0, |m, x| m.max(x.abs()))
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^z)` estable.
fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}
