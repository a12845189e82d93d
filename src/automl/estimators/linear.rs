use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::{Classifier, Dense, check_fit_input};
use crate::automl::error::AutoMlError;

// ---------------------------------------------------------------------------
// Logistic regression
// ---------------------------------------------------------------------------

/// Multinomial logistic regression with L2 penalty, fitted by full-batch
/// gradient descent from a zero start (deterministic).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub c: f64,
    pub max_iter: usize,
    pub learning_rate: f64,
    weights: Dense,
    bias: Vec<f64>,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 500,
            learning_rate: 0.5,
            weights: Dense::default(),
            bias: Vec::new(),
        }
    }
}

fn softmax_rows(logits: &mut Array2<f64>) {
    for mut row in logits.rows_mut() {
        let max = row.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row /= sum;
    }
}

impl LogisticRegression {
    fn logits(&self, x: &Array2<f64>) -> Array2<f64> {
        let w = self.weights.to_array();
        let b = Array1::from_vec(self.bias.clone());
        x.dot(&w.t()) + &b
    }
}

impl Classifier for LogisticRegression {
    fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &[usize],
        n_classes: usize,
        _rng: &mut StdRng,
    ) -> Result<(), AutoMlError> {
        check_fit_input("LogisticRegression", x, y, n_classes)?;
        let n = x.nrows() as f64;
        let mut w = Array2::<f64>::zeros((n_classes, x.ncols()));
        let mut b = Array1::<f64>::zeros(n_classes);
        let mut onehot = Array2::<f64>::zeros((x.nrows(), n_classes));
        for (i, &c) in y.iter().enumerate() {
            onehot[[i, c]] = 1.0;
        }

        for _ in 0..self.max_iter {
            let mut p = x.dot(&w.t()) + &b;
            softmax_rows(&mut p);
            let err = p - &onehot;
            let grad_w = err.t().dot(x) / n + &w * (1.0 / (self.c * n));
            let grad_b = err.sum_axis(Axis(0)) / n;
            w.scaled_add(-self.learning_rate, &grad_w);
            b.scaled_add(-self.learning_rate, &grad_b);
        }

        self.weights = Dense::from_array(&w);
        self.bias = b.to_vec();
        Ok(())
    }

    fn decision(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut p = self.logits(x);
        softmax_rows(&mut p);
        p
    }
}

// ---------------------------------------------------------------------------
// Ridge classifier
// ---------------------------------------------------------------------------

/// One-vs-rest ridge regression on ±1 targets, solved in closed form.
/// Produces decision values, not probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeClassifier {
    pub alpha: f64,
    weights: Dense,
    bias: Vec<f64>,
}

impl Default for RidgeClassifier {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            weights: Dense::default(),
            bias: Vec::new(),
        }
    }
}

impl Classifier for RidgeClassifier {
    fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &[usize],
        n_classes: usize,
        _rng: &mut StdRng,
    ) -> Result<(), AutoMlError> {
        check_fit_input("RidgeClassifier", x, y, n_classes)?;
        let m = x.ncols();

        let x_mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(m));
        let xc = x - &x_mean;

        let mut targets = Array2::<f64>::from_elem((x.nrows(), n_classes), -1.0);
        for (i, &c) in y.iter().enumerate() {
            targets[[i, c]] = 1.0;
        }
        let y_mean = targets
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(n_classes));
        let yc = &targets - &y_mean;

        let mut gram = xc.t().dot(&xc);
        for j in 0..m {
            gram[[j, j]] += self.alpha;
        }
        let rhs = xc.t().dot(&yc);
        let w = solve(gram, rhs).ok_or_else(|| AutoMlError::Fit {
            model: "RidgeClassifier".into(),
            reason: "singular system".into(),
        })?;

        // w: m x k
        let bias = &y_mean - &x_mean.dot(&w);
        self.weights = Dense::from_array(&w.t().to_owned());
        self.bias = bias.to_vec();
        Ok(())
    }

    fn decision(&self, x: &Array2<f64>) -> Array2<f64> {
        let w = self.weights.to_array();
        let b = Array1::from_vec(self.bias.clone());
        x.dot(&w.t()) + &b
    }

    fn has_proba(&self) -> bool {
        false
    }
}

/// Solve `a · X = b` by Gaussian elimination with partial pivoting.
fn solve(mut a: Array2<f64>, mut b: Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))?;
        if a[[pivot, col]].abs() < 1e-12 {
            return None;
        }
        if pivot != col {
            for k in 0..n {
                a.swap([pivot, k], [col, k]);
            }
            for k in 0..b.ncols() {
                b.swap([pivot, k], [col, k]);
            }
        }
        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            for k in 0..b.ncols() {
                b[[row, k]] -= factor * b[[col, k]];
            }
        }
    }
    let mut x = Array2::<f64>::zeros(b.raw_dim());
    for row in (0..n).rev() {
        for k in 0..b.ncols() {
            let mut acc = b[[row, k]];
            for j in (row + 1)..n {
                acc -= a[[row, j]] * x[[j, k]];
            }
            x[[row, k]] = acc / a[[row, row]];
        }
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    #[test]
    fn test_solve_small_system() {
        let a = array![[2.0, 1.0], [1.0, 3.0]];
        let b = array![[3.0], [5.0]];
        let x = solve(a, b).unwrap();
        assert!((x[[0, 0]] - 0.8).abs() < 1e-12);
        assert!((x[[1, 0]] - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_logistic_probabilities_sum_to_one() {
        let (x, y) = super::super::testing::blobs();
        let mut lr = LogisticRegression::default();
        lr.fit(&x, &y, 2, &mut StdRng::seed_from_u64(0)).unwrap();
        for row in lr.decision(&x).rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_ridge_has_no_probabilities() {
        let (x, y) = super::super::testing::blobs();
        let mut ridge = RidgeClassifier::default();
        ridge.fit(&x, &y, 2, &mut StdRng::seed_from_u64(0)).unwrap();
        assert!(!ridge.has_proba());
        assert_eq!(ridge.predict(&x), y);
    }
}
