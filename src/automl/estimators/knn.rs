use ndarray::Array2;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::{Classifier, Dense, check_fit_input};
use crate::automl::error::AutoMlError;

/// k-nearest neighbours with uniform votes and Euclidean distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KNeighbors {
    pub k: usize,
    train: Dense,
    labels: Vec<usize>,
    n_classes: usize,
}

impl Default for KNeighbors {
    fn default() -> Self {
        Self {
            k: 5,
            train: Dense::default(),
            labels: Vec::new(),
            n_classes: 0,
        }
    }
}

impl Classifier for KNeighbors {
    fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &[usize],
        n_classes: usize,
        _rng: &mut StdRng,
    ) -> Result<(), AutoMlError> {
        check_fit_input("KNeighborsClassifier", x, y, n_classes)?;
        self.train = Dense::from_array(x);
        self.labels = y.to_vec();
        self.n_classes = n_classes;
        Ok(())
    }

    fn decision(&self, x: &Array2<f64>) -> Array2<f64> {
        let train = self.train.to_array();
        let k = self.k.min(self.labels.len()).max(1);
        let mut out = Array2::<f64>::zeros((x.nrows(), self.n_classes));
        if self.labels.is_empty() {
            return out;
        }
        for (i, query) in x.rows().into_iter().enumerate() {
            let mut dist: Vec<(f64, usize)> = train
                .rows()
                .into_iter()
                .enumerate()
                .map(|(j, t)| {
                    let d: f64 = t.iter().zip(query.iter()).map(|(a, b)| (a - b) * (a - b)).sum();
                    (d, j)
                })
                .collect();
            // ties resolved by training order
            dist.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            for &(_, j) in dist.iter().take(k) {
                out[[i, self.labels[j]]] += 1.0 / k as f64;
            }
        }
        out
    }
}
