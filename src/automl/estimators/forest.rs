use ndarray::Array2;
use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::{Classifier, DecisionTree, check_fit_input};
use crate::automl::error::AutoMlError;

/// Bagged ensemble of decision trees. Covers both random forests
/// (bootstrap rows, best split among `sqrt(m)` features) and extra trees
/// (all rows, random thresholds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_estimators: usize,
    pub bootstrap: bool,
    pub random_splits: bool,
    trees: Vec<DecisionTree>,
    n_classes: usize,
}

impl RandomForest {
    pub fn random_forest() -> Self {
        Self {
            n_estimators: 100,
            bootstrap: true,
            random_splits: false,
            trees: Vec::new(),
            n_classes: 0,
        }
    }

    pub fn extra_trees() -> Self {
        Self {
            n_estimators: 100,
            bootstrap: false,
            random_splits: true,
            trees: Vec::new(),
            n_classes: 0,
        }
    }
}

impl Classifier for RandomForest {
    fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &[usize],
        n_classes: usize,
        rng: &mut StdRng,
    ) -> Result<(), AutoMlError> {
        check_fit_input("RandomForestClassifier", x, y, n_classes)?;
        let n = x.nrows();
        let max_features = ((x.ncols() as f64).sqrt().round() as usize).max(1);

        self.n_classes = n_classes;
        self.trees = (0..self.n_estimators)
            .map(|_| {
                let rows: Vec<usize> = if self.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                let mut tree = DecisionTree::randomized(max_features, self.random_splits);
                tree.fit_rows(x, y, &rows, n_classes, rng);
                tree
            })
            .collect();
        Ok(())
    }

    fn decision(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut out = Array2::<f64>::zeros((x.nrows(), self.n_classes));
        if self.trees.is_empty() {
            return out;
        }
        let weight = 1.0 / self.trees.len() as f64;
        for (i, row) in x.rows().into_iter().enumerate() {
            for tree in &self.trees {
                for (c, p) in tree.leaf_proba(row).iter().enumerate() {
                    out[[i, c]] += p * weight;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = super::super::testing::blobs();
        let mut a = RandomForest::random_forest();
        let mut b = RandomForest::random_forest();
        a.fit(&x, &y, 2, &mut StdRng::seed_from_u64(123)).unwrap();
        b.fit(&x, &y, 2, &mut StdRng::seed_from_u64(123)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_probabilities_are_averaged() {
        let (x, y) = super::super::testing::blobs();
        let mut et = RandomForest::extra_trees();
        et.fit(&x, &y, 2, &mut StdRng::seed_from_u64(7)).unwrap();
        for row in et.decision(&x).rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }
}
