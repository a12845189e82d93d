use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::data::model::{CellValue, DataTable};

use super::estimators::ModelKind;
use super::metrics::Scores;

/// Metric used to rank candidates (higher is better for all of them).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankingMetric {
    #[default]
    Accuracy,
    Auc,
    Recall,
    Precision,
    F1,
    Kappa,
    Mcc,
}

impl fmt::Display for RankingMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RankingMetric::Accuracy => "Accuracy",
            RankingMetric::Auc => "AUC",
            RankingMetric::Recall => "Recall",
            RankingMetric::Precision => "Prec.",
            RankingMetric::F1 => "F1",
            RankingMetric::Kappa => "Kappa",
            RankingMetric::Mcc => "MCC",
        };
        f.write_str(s)
    }
}

/// Fixed experiment configuration handed to `compare_models`.
#[derive(Debug, Clone)]
pub struct SetupConfig {
    pub seed: u64,
    pub train_size: f64,
    pub folds: usize,
    pub normalize: bool,
    pub remove_multicollinearity: bool,
    pub multicollinearity_threshold: f64,
    pub max_one_hot_levels: usize,
    pub ignore_features: Vec<String>,
    pub metric: RankingMetric,
    pub candidates: Vec<ModelKind>,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            seed: config::SESSION_SEED,
            train_size: config::TRAIN_SIZE,
            folds: config::CV_FOLDS,
            normalize: true,
            remove_multicollinearity: true,
            multicollinearity_threshold: config::MULTICOLLINEARITY_THRESHOLD,
            max_one_hot_levels: config::MAX_ONE_HOT_LEVELS,
            ignore_features: Vec::new(),
            metric: RankingMetric::default(),
            candidates: ModelKind::ALL.to_vec(),
        }
    }
}

/// Description/value pairs describing how the experiment was set up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetupSummary {
    pub entries: Vec<(String, String)>,
}

impl SetupSummary {
    pub fn push(&mut self, description: &str, value: impl ToString) {
        self.entries.push((description.to_string(), value.to_string()));
    }

    pub fn get(&self, description: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(d, _)| d == description)
            .map(|(_, v)| v.as_str())
    }

    pub fn to_table(&self) -> Result<DataTable> {
        let rows = self
            .entries
            .iter()
            .map(|(d, v)| vec![CellValue::String(d.clone()), CellValue::String(v.clone())])
            .collect();
        DataTable::new(vec!["Description".into(), "Value".into()], rows)
    }
}

/// One candidate's mean cross-validation scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub kind: ModelKind,
    pub scores: Scores,
    pub fit_seconds: f64,
}

/// Candidates ranked best-first by `metric`.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonTable {
    pub metric: RankingMetric,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    pub fn best(&self) -> Option<&ComparisonRow> {
        self.rows.first()
    }

    pub fn to_table(&self) -> Result<DataTable> {
        let columns = [
            "Code", "Model", "Accuracy", "AUC", "Recall", "Prec.", "F1", "Kappa", "MCC", "TT (Sec)",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect();
        let round = |v: f64| CellValue::Float((v * 10_000.0).round() / 10_000.0);
        let rows = self
            .rows
            .iter()
            .map(|r| {
                vec![
                    CellValue::String(r.kind.code().to_string()),
                    CellValue::String(r.kind.name().to_string()),
                    round(r.scores.accuracy),
                    round(r.scores.auc.unwrap_or(0.0)),
                    round(r.scores.recall),
                    round(r.scores.precision),
                    round(r.scores.f1),
                    round(r.scores.kappa),
                    round(r.scores.mcc),
                    CellValue::Float((r.fit_seconds * 100.0).round() / 100.0),
                ]
            })
            .collect();
        DataTable::new(columns, rows)
    }
}
