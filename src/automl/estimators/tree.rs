use ndarray::{Array2, ArrayView1};
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use serde::{Deserialize, Serialize};

use super::{Classifier, check_fit_input};
use crate::automl::error::AutoMlError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        proba: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// CART classification tree with Gini impurity.
///
/// `max_features` limits the features considered per split (drawn from the
/// rng); `random_splits` draws one threshold per feature instead of
/// scanning all of them, as extremely randomized trees do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub max_features: Option<usize>,
    pub random_splits: bool,
    nodes: Vec<Node>,
    n_classes: usize,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self {
            max_depth: 32,
            min_samples_split: 2,
            max_features: None,
            random_splits: false,
            nodes: Vec::new(),
            n_classes: 0,
        }
    }
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn gini(counts: &[f64], total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|c| (c / total) * (c / total)).sum::<f64>()
}

impl DecisionTree {
    /// Unfitted ensemble member: default depth limits, a feature budget per
    /// split and optionally random thresholds.
    pub fn randomized(max_features: usize, random_splits: bool) -> Self {
        Self {
            max_features: Some(max_features),
            random_splits,
            ..Self::default()
        }
    }

    /// Fit on a subset (possibly with repeats) of the rows of `x`.
    pub fn fit_rows(
        &mut self,
        x: &Array2<f64>,
        y: &[usize],
        rows: &[usize],
        n_classes: usize,
        rng: &mut StdRng,
    ) {
        self.nodes.clear();
        self.n_classes = n_classes;
        self.build(x, y, rows.to_vec(), 0, rng);
    }

    fn class_counts(&self, y: &[usize], rows: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.n_classes];
        for &r in rows {
            counts[y[r]] += 1.0;
        }
        counts
    }

    /// Append the subtree for `rows` and return its node index.
    fn build(
        &mut self,
        x: &Array2<f64>,
        y: &[usize],
        rows: Vec<usize>,
        depth: usize,
        rng: &mut StdRng,
    ) -> usize {
        let counts = self.class_counts(y, &rows);
        let total = rows.len() as f64;
        let idx = self.nodes.len();
        let leaf = Node::Leaf {
            proba: counts.iter().map(|c| c / total).collect(),
        };

        let pure = counts.iter().filter(|&&c| c > 0.0).count() <= 1;
        if pure || depth >= self.max_depth || rows.len() < self.min_samples_split {
            self.nodes.push(leaf);
            return idx;
        }

        let Some(split) = self.best_split(x, y, &rows, gini(&counts, total), rng) else {
            self.nodes.push(leaf);
            return idx;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| x[[r, split.feature]] <= split.threshold);

        // placeholder, patched once both children exist
        self.nodes.push(leaf);
        let left = self.build(x, y, left_rows, depth + 1, rng);
        let right = self.build(x, y, right_rows, depth + 1, rng);
        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }

    fn best_split(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        rows: &[usize],
        parent_impurity: f64,
        rng: &mut StdRng,
    ) -> Option<BestSplit> {
        let m = x.ncols();
        let features: Vec<usize> = match self.max_features {
            Some(k) if k < m => {
                let mut f = sample(rng, m, k).into_vec();
                f.sort_unstable();
                f
            }
            _ => (0..m).collect(),
        };

        let mut best: Option<BestSplit> = None;
        for feature in features {
            let candidate = if self.random_splits {
                self.random_threshold(x, y, rows, feature, rng)
            } else {
                self.scan_thresholds(x, y, rows, feature)
            };
            if let Some(c) = candidate {
                if c.impurity < best.as_ref().map_or(parent_impurity - 1e-12, |b| b.impurity) {
                    best = Some(c);
                }
            }
        }
        best
    }

    /// Exhaustive search over midpoints between consecutive distinct values.
    fn scan_thresholds(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        rows: &[usize],
        feature: usize,
    ) -> Option<BestSplit> {
        let mut sorted: Vec<(f64, usize)> = rows.iter().map(|&r| (x[[r, feature]], y[r])).collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total = sorted.len() as f64;
        let mut right = self.class_counts(y, rows);
        let mut left = vec![0.0; self.n_classes];
        let mut best: Option<BestSplit> = None;

        for i in 0..sorted.len().saturating_sub(1) {
            let (value, class) = sorted[i];
            left[class] += 1.0;
            right[class] -= 1.0;
            let next = sorted[i + 1].0;
            if next <= value {
                continue;
            }
            let n_left = (i + 1) as f64;
            let n_right = total - n_left;
            let impurity = (n_left * gini(&left, n_left) + n_right * gini(&right, n_right)) / total;
            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                best = Some(BestSplit {
                    feature,
                    threshold: (value + next) / 2.0,
                    impurity,
                });
            }
        }
        best
    }

    fn random_threshold(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        rows: &[usize],
        feature: usize,
        rng: &mut StdRng,
    ) -> Option<BestSplit> {
        let values = rows.iter().map(|&r| x[[r, feature]]);
        let lo = values.clone().fold(f64::INFINITY, f64::min);
        let hi = values.fold(f64::NEG_INFINITY, f64::max);
        if hi <= lo {
            return None;
        }
        let threshold = rng.gen_range(lo..hi);

        let mut left = vec![0.0; self.n_classes];
        let mut right = vec![0.0; self.n_classes];
        for &r in rows {
            if x[[r, feature]] <= threshold {
                left[y[r]] += 1.0;
            } else {
                right[y[r]] += 1.0;
            }
        }
        let n_left: f64 = left.iter().sum();
        let n_right: f64 = right.iter().sum();
        if n_left == 0.0 || n_right == 0.0 {
            return None;
        }
        let total = n_left + n_right;
        Some(BestSplit {
            feature,
            threshold,
            impurity: (n_left * gini(&left, n_left) + n_right * gini(&right, n_right)) / total,
        })
    }

    /// Class distribution of the leaf reached by `row`.
    pub fn leaf_proba(&self, row: ArrayView1<f64>) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { proba } => return proba,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() { 0 } else { walk(&self.nodes, 0) }
    }
}

impl Classifier for DecisionTree {
    fn fit(
        &mut self,
        x: &Array2<f64>,
        y: &[usize],
        n_classes: usize,
        rng: &mut StdRng,
    ) -> Result<(), AutoMlError> {
        check_fit_input("DecisionTreeClassifier", x, y, n_classes)?;
        let rows: Vec<usize> = (0..x.nrows()).collect();
        self.fit_rows(x, y, &rows, n_classes, rng);
        Ok(())
    }

    fn decision(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut out = Array2::<f64>::zeros((x.nrows(), self.n_classes));
        if self.nodes.is_empty() {
            return out;
        }
        for (i, row) in x.rows().into_iter().enumerate() {
            for (c, p) in self.leaf_proba(row).iter().enumerate() {
                out[[i, c]] = *p;
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
    fn test_stump_on_threshold() {
        let x = Array2::from_shape_vec((6, 1), vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]).unwrap();
        let y = [0, 0, 0, 1, 1, 1];
        let mut tree = DecisionTree::default();
        tree.fit(&x, &y, 2, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict(&x), y.to_vec());
        let query = Array2::from_shape_vec((1, 1), vec![6.4]).unwrap();
        assert_eq!(tree.predict(&query), vec![0]);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let x = Array2::from_shape_vec((4, 1), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let y = [0, 1, 0, 1];
        let mut tree = DecisionTree { max_depth: 1, ..Default::default() };
        tree.fit(&x, &y, 2, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_randomized_member_fits() {
        let (x, y) = super::super::testing::blobs();
        let mut tree = DecisionTree::randomized(1, true);
        assert_eq!(tree.max_features, Some(1));
        assert!(tree.random_splits);
        let rows: Vec<usize> = (0..x.nrows()).collect();
        tree.fit_rows(&x, &y, &rows, 2, &mut StdRng::seed_from_u64(5));
        assert!(tree.depth() >= 1);
        let proba = tree.decision(&x);
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }
}
