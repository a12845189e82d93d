use ndarray::Array2;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::{Classifier, check_fit_input};
use crate::automl::error::AutoMlError;

/// Baseline that ignores the features and predicts the class priors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DummyClassifier {
    priors: Vec<f64>,
}

impl Classifier for DummyClassifier {
    fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &[usize],
        n_classes: usize,
        _rng: &mut StdRng,
    ) -> Result<(), AutoMlError> {
        check_fit_input("DummyClassifier", x, y, n_classes)?;
        let mut counts = vec![0.0; n_classes];
        for &c in y {
            counts[c] += 1.0;
        }
        let n = y.len() as f64;
        self.priors = counts.into_iter().map(|c| c / n).collect();
        Ok(())
    }

    fn decision(&self, x: &Array2<f64>) -> Array2<f64> {
        let k = self.priors.len();
        Array2::from_shape_fn((x.nrows(), k), |(_, c)| self.priors[c])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_predicts_majority_class() {
        let x = Array2::zeros((4, 1));
        let mut dummy = DummyClassifier::default();
        dummy.fit(&x, &[1, 1, 0, 1], 2, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(dummy.predict(&x), vec![1, 1, 1, 1]);
        assert_eq!(dummy.decision(&x)[[0, 1]], 0.75);
    }
}
