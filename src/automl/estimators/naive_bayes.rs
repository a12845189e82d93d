use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::{Classifier, Dense, check_fit_input};
use crate::automl::error::AutoMlError;

/// Gaussian naive Bayes. Variances are smoothed by `var_smoothing` times
/// the largest feature variance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianNb {
    pub var_smoothing: f64,
    log_priors: Vec<f64>,
    means: Dense,
    variances: Dense,
}

impl Default for GaussianNb {
    fn default() -> Self {
        Self {
            var_smoothing: 1e-9,
            log_priors: Vec::new(),
            means: Dense::default(),
            variances: Dense::default(),
        }
    }
}

impl Classifier for GaussianNb {
    fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &[usize],
        n_classes: usize,
        _rng: &mut StdRng,
    ) -> Result<(), AutoMlError> {
        check_fit_input("GaussianNB", x, y, n_classes)?;
        let m = x.ncols();
        let epsilon = self.var_smoothing
            * x.var_axis(Axis(0), 0.0)
                .iter()
                .fold(0.0_f64, |a, &b| a.max(b))
                .max(1e-12);

        let mut means = Array2::<f64>::zeros((n_classes, m));
        let mut variances = Array2::<f64>::from_elem((n_classes, m), epsilon);
        let mut log_priors = vec![f64::NEG_INFINITY; n_classes];
        for class in 0..n_classes {
            let members: Vec<usize> = (0..y.len()).filter(|&i| y[i] == class).collect();
            if members.is_empty() {
                continue;
            }
            let rows = x.select(Axis(0), &members);
            if let Some(mean) = rows.mean_axis(Axis(0)) {
                means.row_mut(class).assign(&mean);
            }
            let var = rows.var_axis(Axis(0), 0.0);
            variances.row_mut(class).assign(&(var + epsilon));
            log_priors[class] = (members.len() as f64 / y.len() as f64).ln();
        }

        self.log_priors = log_priors;
        self.means = Dense::from_array(&means);
        self.variances = Dense::from_array(&variances);
        Ok(())
    }

    fn decision(&self, x: &Array2<f64>) -> Array2<f64> {
        let means = self.means.to_array();
        let variances = self.variances.to_array();
        let k = self.log_priors.len();
        let mut out = Array2::<f64>::zeros((x.nrows(), k));
        for (i, row) in x.rows().into_iter().enumerate() {
            for c in 0..k {
                let mut ll = self.log_priors[c];
                for j in 0..row.len() {
                    let var = variances[[c, j]];
                    let diff = row[j] - means[[c, j]];
                    ll -= 0.5 * ((2.0 * std::f64::consts::PI * var).ln() + diff * diff / var);
                }
                out[[i, c]] = ll;
            }
            // normalize joint log-likelihoods into probabilities
            let mut r = out.row_mut(i);
            let max = r.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
            r.mapv_inplace(|v| (v - max).exp());
            let sum = r.sum();
            r /= sum;
        }
        out
    }
}
