//! Classification metrics over label-encoded targets.
//!
//! Binary problems report recall/precision/F1 for class `1`; multiclass
//! problems report the support-weighted average over classes. AUC is only
//! available when the estimator produces class probabilities.

use serde::{Deserialize, Serialize};

use super::setup::RankingMetric;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub accuracy: f64,
    pub auc: Option<f64>,
    pub recall: f64,
    pub precision: f64,
    pub f1: f64,
    pub kappa: f64,
    pub mcc: f64,
}

impl Scores {
    /// Value used for ranking. A missing AUC ranks as 0.
    pub fn get(&self, metric: RankingMetric) -> f64 {
        match metric {
            RankingMetric::Accuracy => self.accuracy,
            RankingMetric::Auc => self.auc.unwrap_or(0.0),
            RankingMetric::Recall => self.recall,
            RankingMetric::Precision => self.precision,
            RankingMetric::F1 => self.f1,
            RankingMetric::Kappa => self.kappa,
            RankingMetric::Mcc => self.mcc,
        }
    }

    /// Per-field mean. AUC is kept only if every fold produced one.
    pub fn mean(all: &[Scores]) -> Scores {
        if all.is_empty() {
            return Scores::default();
        }
        let n = all.len() as f64;
        let avg = |f: fn(&Scores) -> f64| all.iter().map(f).sum::<f64>() / n;
        let auc = all
            .iter()
            .map(|s| s.auc)
            .collect::<Option<Vec<f64>>>()
            .map(|v| v.iter().sum::<f64>() / n);
        Scores {
            accuracy: avg(|s| s.accuracy),
            auc,
            recall: avg(|s| s.recall),
            precision: avg(|s| s.precision),
            f1: avg(|s| s.f1),
            kappa: avg(|s| s.kappa),
            mcc: avg(|s| s.mcc),
        }
    }
}

/// Score predictions. `proba` holds one probability row per sample.
pub fn score(
    y_true: &[usize],
    y_pred: &[usize],
    proba: Option<&[Vec<f64>]>,
    n_classes: usize,
) -> Scores {
    let n = y_true.len();
    if n == 0 {
        return Scores::default();
    }

    // confusion[t][p]
    let mut confusion = vec![vec![0usize; n_classes]; n_classes];
    for (&t, &p) in y_true.iter().zip(y_pred) {
        confusion[t][p] += 1;
    }
    let actual: Vec<f64> = confusion.iter().map(|r| r.iter().sum::<usize>() as f64).collect();
    let predicted: Vec<f64> = (0..n_classes)
        .map(|p| confusion.iter().map(|r| r[p]).sum::<usize>() as f64)
        .collect();
    let correct: f64 = (0..n_classes).map(|k| confusion[k][k] as f64).sum();
    let total = n as f64;

    let per_class = |k: usize| {
        let tp = confusion[k][k] as f64;
        let precision = ratio(tp, predicted[k]);
        let recall = ratio(tp, actual[k]);
        let f1 = ratio(2.0 * precision * recall, precision + recall);
        (precision, recall, f1)
    };

    let (precision, recall, f1) = if n_classes == 2 {
        per_class(1)
    } else {
        (0..n_classes).fold((0.0, 0.0, 0.0), |acc, k| {
            let (p, r, f) = per_class(k);
            let w = actual[k] / total;
            (acc.0 + w * p, acc.1 + w * r, acc.2 + w * f)
        })
    };

    let accuracy = correct / total;
    let expected: f64 = (0..n_classes).map(|k| actual[k] * predicted[k]).sum::<f64>() / (total * total);
    let kappa = if (1.0 - expected).abs() < f64::EPSILON {
        0.0
    } else {
        (accuracy - expected) / (1.0 - expected)
    };

    let cov_tp = correct * total - (0..n_classes).map(|k| actual[k] * predicted[k]).sum::<f64>();
    let cov_pp = total * total - predicted.iter().map(|p| p * p).sum::<f64>();
    let cov_tt = total * total - actual.iter().map(|t| t * t).sum::<f64>();
    let mcc = ratio(cov_tp, (cov_pp * cov_tt).sqrt());

    Scores {
        accuracy,
        auc: proba.and_then(|p| roc_auc(y_true, p, n_classes)),
        recall,
        precision,
        f1,
        kappa,
        mcc,
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 || !den.is_finite() {
        0.0
    } else {
        num / den
    }
}

/// ROC AUC: class 1 for binary problems, macro one-vs-rest otherwise.
/// `None` when some class needed for the computation is absent.
pub fn roc_auc(y_true: &[usize], proba: &[Vec<f64>], n_classes: usize) -> Option<f64> {
    if n_classes == 2 {
        let scores: Vec<f64> = proba.iter().map(|p| p[1]).collect();
        let positive: Vec<bool> = y_true.iter().map(|&y| y == 1).collect();
        return binary_auc(&positive, &scores);
    }
    let mut total = 0.0;
    for k in 0..n_classes {
        let scores: Vec<f64> = proba.iter().map(|p| p[k]).collect();
        let positive: Vec<bool> = y_true.iter().map(|&y| y == k).collect();
        total += binary_auc(&positive, &scores)?;
    }
    Some(total / n_classes as f64)
}

/// Mann-Whitney formulation with average ranks for ties.
fn binary_auc(positive: &[bool], scores: &[f64]) -> Option<f64> {
    let n_pos = positive.iter().filter(|&&p| p).count();
    let n_neg = positive.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        i = j + 1;
    }

    let pos_rank_sum: f64 = (0..scores.len()).filter(|&i| positive[i]).map(|i| ranks[i]).sum();
    let n_pos = n_pos as f64;
    Some((pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_perfect_binary() {
        let y = [0, 1, 1, 0];
        let proba = vec![vec![0.9, 0.1], vec![0.2, 0.8], vec![0.3, 0.7], vec![0.6, 0.4]];
        let s = score(&y, &y, Some(&proba), 2);
        assert!(close(s.accuracy, 1.0));
        assert_eq!(s.auc, Some(1.0));
        assert!(close(s.kappa, 1.0));
        assert!(close(s.mcc, 1.0));
        assert!(close(s.f1, 1.0));
    }

    #[test]
    fn test_binary_counts() {
        // tp=1 fn=1 fp=1 tn=1
        let y_true = [1, 1, 0, 0];
        let y_pred = [1, 0, 1, 0];
        let s = score(&y_true, &y_pred, None, 2);
        assert!(close(s.accuracy, 0.5));
        assert!(close(s.precision, 0.5));
        assert!(close(s.recall, 0.5));
        assert!(close(s.kappa, 0.0));
        assert!(close(s.mcc, 0.0));
        assert_eq!(s.auc, None);
    }

    #[test]
    fn test_auc_with_ties() {
        let positive = [true, false, true, false];
        let scores = [0.5, 0.5, 0.9, 0.1];
        // pairs: (0.5 vs 0.5)=0.5, (0.5 vs 0.1)=1, (0.9 vs 0.5)=1, (0.9 vs 0.1)=1 → 3.5/4
        assert_eq!(binary_auc(&positive, &scores), Some(0.875));
    }

    #[test]
    fn test_constant_predictions_have_zero_kappa() {
        let y_true = [0, 0, 1, 2];
        let y_pred = [0, 0, 0, 0];
        let s = score(&y_true, &y_pred, None, 3);
        assert!(close(s.accuracy, 0.5));
        assert!(close(s.kappa, 0.0));
        assert!(close(s.mcc, 0.0));
    }

    #[test]
    fn test_mean_drops_partial_auc() {
        let a = Scores { accuracy: 1.0, auc: Some(1.0), ..Default::default() };
        let b = Scores { accuracy: 0.5, auc: None, ..Default::default() };
        let m = Scores::mean(&[a, b]);
        assert!(close(m.accuracy, 0.75));
        assert_eq!(m.auc, None);
    }
}
