//! Candidate classifiers compared by the engine.
//!
//! Every estimator works on a dense, already preprocessed `Array2<f64>` and
//! label-encoded targets `0..n_classes`. Fitted state is kept in plain
//! vectors so the whole pipeline serializes with bincode.

mod dummy;
mod forest;
mod knn;
mod linear;
mod naive_bayes;
mod tree;

use std::fmt;

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::error::AutoMlError;

pub use dummy::DummyClassifier;
pub use forest::RandomForest;
pub use knn::KNeighbors;
pub use linear::{LogisticRegression, RidgeClassifier};
pub use naive_bayes::GaussianNb;
pub use tree::DecisionTree;

/// Common interface of the candidate models.
pub trait Classifier {
    fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &[usize],
        n_classes: usize,
        rng: &mut StdRng,
    ) -> Result<(), AutoMlError>;

    /// One row of per-class scores per sample. Probabilities when
    /// `has_proba()`, otherwise raw decision values.
    fn decision(&self, x: &Array2<f64>) -> Array2<f64>;

    fn has_proba(&self) -> bool {
        true
    }

    fn predict(&self, x: &Array2<f64>) -> Vec<usize> {
        self.decision(x).rows().into_iter().map(argmax).collect()
    }
}

/// Index of the largest value; the first one wins ties.
pub fn argmax(row: ArrayView1<f64>) -> usize {
    let mut best = 0;
    for (i, &v) in row.iter().enumerate() {
        if v > row[best] {
            best = i;
        }
    }
    best
}

/// Row-major matrix in a bincode-friendly shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dense {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Dense {
    pub fn from_array(a: &Array2<f64>) -> Self {
        Dense {
            rows: a.nrows(),
            cols: a.ncols(),
            data: a.iter().copied().collect(),
        }
    }

    pub fn to_array(&self) -> Array2<f64> {
        Array2::from_shape_vec((self.rows, self.cols), self.data.clone())
            .unwrap_or_else(|_| Array2::zeros((self.rows, self.cols)))
    }
}

// ---------------------------------------------------------------------------
// Model catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    LogisticRegression,
    KNeighbors,
    NaiveBayes,
    DecisionTree,
    Ridge,
    RandomForest,
    ExtraTrees,
    Dummy,
}

impl ModelKind {
    pub const ALL: [ModelKind; 8] = [
        ModelKind::LogisticRegression,
        ModelKind::KNeighbors,
        ModelKind::NaiveBayes,
        ModelKind::DecisionTree,
        ModelKind::Ridge,
        ModelKind::RandomForest,
        ModelKind::ExtraTrees,
        ModelKind::Dummy,
    ];

    pub fn code(self) -> &'static str {
        match self {
            ModelKind::LogisticRegression => "lr",
            ModelKind::KNeighbors => "knn",
            ModelKind::NaiveBayes => "nb",
            ModelKind::DecisionTree => "dt",
            ModelKind::Ridge => "ridge",
            ModelKind::RandomForest => "rf",
            ModelKind::ExtraTrees => "et",
            ModelKind::Dummy => "dummy",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ModelKind::LogisticRegression => "Logistic Regression",
            ModelKind::KNeighbors => "K Neighbors Classifier",
            ModelKind::NaiveBayes => "Naive Bayes",
            ModelKind::DecisionTree => "Decision Tree Classifier",
            ModelKind::Ridge => "Ridge Classifier",
            ModelKind::RandomForest => "Random Forest Classifier",
            ModelKind::ExtraTrees => "Extra Trees Classifier",
            ModelKind::Dummy => "Dummy Classifier",
        }
    }

    /// Unfitted estimator with default hyperparameters.
    pub fn build(self) -> Estimator {
        match self {
            ModelKind::LogisticRegression => Estimator::LogisticRegression(LogisticRegression::default()),
            ModelKind::KNeighbors => Estimator::KNeighbors(KNeighbors::default()),
            ModelKind::NaiveBayes => Estimator::NaiveBayes(GaussianNb::default()),
            ModelKind::DecisionTree => Estimator::DecisionTree(DecisionTree::default()),
            ModelKind::Ridge => Estimator::Ridge(RidgeClassifier::default()),
            ModelKind::RandomForest => Estimator::RandomForest(RandomForest::random_forest()),
            ModelKind::ExtraTrees => Estimator::ExtraTrees(RandomForest::extra_trees()),
            ModelKind::Dummy => Estimator::Dummy(DummyClassifier::default()),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fitted (or fittable) candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Estimator {
    LogisticRegression(LogisticRegression),
    KNeighbors(KNeighbors),
    NaiveBayes(GaussianNb),
    DecisionTree(DecisionTree),
    Ridge(RidgeClassifier),
    RandomForest(RandomForest),
    ExtraTrees(RandomForest),
    Dummy(DummyClassifier),
}

impl Estimator {
    pub fn kind(&self) -> ModelKind {
        match self {
            Estimator::LogisticRegression(_) => ModelKind::LogisticRegression,
            Estimator::KNeighbors(_) => ModelKind::KNeighbors,
            Estimator::NaiveBayes(_) => ModelKind::NaiveBayes,
            Estimator::DecisionTree(_) => ModelKind::DecisionTree,
            Estimator::Ridge(_) => ModelKind::Ridge,
            Estimator::RandomForest(_) => ModelKind::RandomForest,
            Estimator::ExtraTrees(_) => ModelKind::ExtraTrees,
            Estimator::Dummy(_) => ModelKind::Dummy,
        }
    }

    pub fn classifier(&self) -> &dyn Classifier {
        match self {
            Estimator::LogisticRegression(m) => m,
            Estimator::KNeighbors(m) => m,
            Estimator::NaiveBayes(m) => m,
            Estimator::DecisionTree(m) => m,
            Estimator::Ridge(m) => m,
            Estimator::RandomForest(m) | Estimator::ExtraTrees(m) => m,
            Estimator::Dummy(m) => m,
        }
    }

    pub fn classifier_mut(&mut self) -> &mut dyn Classifier {
        match self {
            Estimator::LogisticRegression(m) => m,
            Estimator::KNeighbors(m) => m,
            Estimator::NaiveBayes(m) => m,
            Estimator::DecisionTree(m) => m,
            Estimator::Ridge(m) => m,
            Estimator::RandomForest(m) | Estimator::ExtraTrees(m) => m,
            Estimator::Dummy(m) => m,
        }
    }

    /// Hyperparameters in constructor notation.
    pub fn describe(&self) -> String {
        match self {
            Estimator::LogisticRegression(m) => format!(
                "LogisticRegression(C={}, max_iter={}, learning_rate={})",
                m.c, m.max_iter, m.learning_rate
            ),
            Estimator::KNeighbors(m) => format!("KNeighborsClassifier(n_neighbors={})", m.k),
            Estimator::NaiveBayes(m) => format!("GaussianNB(var_smoothing={:e})", m.var_smoothing),
            Estimator::DecisionTree(m) => format!(
                "DecisionTreeClassifier(criterion=gini, max_depth={}, min_samples_split={})",
                m.max_depth, m.min_samples_split
            ),
            Estimator::Ridge(m) => format!("RidgeClassifier(alpha={})", m.alpha),
            Estimator::RandomForest(m) => format!(
                "RandomForestClassifier(n_estimators={}, max_features=sqrt, bootstrap=true)",
                m.n_estimators
            ),
            Estimator::ExtraTrees(m) => format!(
                "ExtraTreesClassifier(n_estimators={}, max_features=sqrt, bootstrap=false)",
                m.n_estimators
            ),
            Estimator::Dummy(_) => "DummyClassifier(strategy=prior)".to_string(),
        }
    }
}

/// Validate the common preconditions of `fit`.
pub(crate) fn check_fit_input(
    model: &str,
    x: &Array2<f64>,
    y: &[usize],
    n_classes: usize,
) -> Result<(), AutoMlError> {
    let fail = |reason: String| AutoMlError::Fit { model: model.to_string(), reason };
    if x.nrows() == 0 {
        return Err(fail("no training rows".into()));
    }
    if x.nrows() != y.len() {
        return Err(fail(format!("{} rows but {} labels", x.nrows(), y.len())));
    }
    if let Some(&bad) = y.iter().find(|&&c| c >= n_classes) {
        return Err(fail(format!("label {bad} outside 0..{n_classes}")));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(fail("non-finite feature value".into()));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use ndarray::Array2;

    /// Two well separated blobs in 2D: class 0 around (-2, -2), class 1 around (2, 2).
    pub fn blobs() -> (Array2<f64>, Vec<usize>) {
        let mut data = Vec::new();
        let mut y = Vec::new();
        for i in 0..20 {
            let jitter = (i as f64 * 0.37).sin() * 0.5;
            let class = i % 2;
            let center = if class == 0 { -2.0 } else { 2.0 };
            data.push(center + jitter);
            data.push(center - jitter);
            y.push(class);
        }
        (Array2::from_shape_vec((20, 2), data).unwrap(), y)
    }

    pub fn accuracy(pred: &[usize], y: &[usize]) -> f64 {
        pred.iter().zip(y).filter(|(a, b)| a == b).count() as f64 / y.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{accuracy, blobs};
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_every_candidate_separates_blobs() {
        let (x, y) = blobs();
        for kind in ModelKind::ALL {
            if kind == ModelKind::Dummy {
                continue;
            }
            let mut est = kind.build();
            est.classifier_mut()
                .fit(&x, &y, 2, &mut StdRng::seed_from_u64(123))
                .unwrap();
            let pred = est.classifier().predict(&x);
            assert!(accuracy(&pred, &y) >= 0.95, "{kind} accuracy too low");
        }
    }

    #[test]
    fn test_estimators_survive_bincode() {
        let (x, y) = blobs();
        let mut est = ModelKind::RandomForest.build();
        est.classifier_mut()
            .fit(&x, &y, 2, &mut StdRng::seed_from_u64(123))
            .unwrap();
        let bytes = bincode::serialize(&est).unwrap();
        let back: Estimator = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back.classifier().decision(&x), est.classifier().decision(&x));
    }

    #[test]
    fn test_argmax_prefers_first_tie() {
        let row = ndarray::arr1(&[0.5, 0.5, 0.1]);
        assert_eq!(argmax(row.view()), 0);
    }

    #[test]
    fn test_rejects_non_finite_input() {
        let x = Array2::from_shape_vec((2, 1), vec![1.0, f64::NAN]).unwrap();
        assert!(check_fit_input("lr", &x, &[0, 1], 2).is_err());
    }
}
