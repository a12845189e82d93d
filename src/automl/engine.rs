use std::time::{Instant, SystemTime, UNIX_EPOCH};

use ndarray::{Array2, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config;
use crate::data::model::{CellValue, ColumnKind, DataTable};

use super::artifact::{ARTIFACT_VERSION, ModelArtifact};
use super::cv::{stratified_folds, stratified_split};
use super::error::AutoMlError;
use super::estimators::{Estimator, ModelKind};
use super::metrics::{Scores, score};
use super::preprocess::{LabelEncoder, Preprocessor};
use super::setup::{ComparisonRow, ComparisonTable, SetupConfig, SetupSummary};
use super::{AutoMlEngine, Experiment, PredictOptions, Predictions};

/// Minimum rows needed for a train/test split plus two-fold CV.
const MIN_ROWS: usize = 4;

/// The in-process model-selection engine.
#[derive(Debug, Clone, Default)]
pub struct BuiltinAutoMl;

/// Fit one candidate and return the fitted estimator.
fn fit_candidate(
    kind: ModelKind,
    x: &Array2<f64>,
    y: &[usize],
    n_classes: usize,
    seed: u64,
) -> Result<Estimator, AutoMlError> {
    let mut estimator = kind.build();
    let mut rng = StdRng::seed_from_u64(seed);
    estimator.classifier_mut().fit(x, y, n_classes, &mut rng)?;
    Ok(estimator)
}

/// Score a fitted estimator on `x`/`y`.
fn evaluate(estimator: &Estimator, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Scores {
    let clf = estimator.classifier();
    let decision = clf.decision(x);
    let pred: Vec<usize> = decision
        .rows()
        .into_iter()
        .map(super::estimators::argmax)
        .collect();
    let proba: Option<Vec<Vec<f64>>> = clf
        .has_proba()
        .then(|| decision.rows().into_iter().map(|r| r.to_vec()).collect());
    score(y, &pred, proba.as_deref(), n_classes)
}

fn pick<T: Clone>(values: &[T], idx: &[usize]) -> Vec<T> {
    idx.iter().map(|&i| values[i].clone()).collect()
}

impl BuiltinAutoMl {
    pub fn new() -> Self {
        BuiltinAutoMl
    }

    /// Mean k-fold scores of one candidate on the training split.
    fn cross_validate(
        kind: ModelKind,
        x: &Array2<f64>,
        y: &[usize],
        n_classes: usize,
        folds: &[super::cv::Fold],
        seed: u64,
    ) -> Result<(Scores, f64), AutoMlError> {
        let mut fold_scores = Vec::with_capacity(folds.len());
        let mut seconds = 0.0;
        for fold in folds {
            let x_train = x.select(Axis(0), &fold.train);
            let x_valid = x.select(Axis(0), &fold.valid);
            let y_train = pick(y, &fold.train);
            let y_valid = pick(y, &fold.valid);

            let started = Instant::now();
            let estimator = fit_candidate(kind, &x_train, &y_train, n_classes, seed)?;
            seconds += started.elapsed().as_secs_f64();
            fold_scores.push(evaluate(&estimator, &x_valid, &y_valid, n_classes));
        }
        Ok((Scores::mean(&fold_scores), seconds / folds.len().max(1) as f64))
    }
}

impl AutoMlEngine for BuiltinAutoMl {
    fn compare_models(
        &self,
        data: &DataTable,
        target: &str,
        config: &SetupConfig,
    ) -> Result<Experiment, AutoMlError> {
        let target_idx = data
            .column_index(target)
            .ok_or_else(|| AutoMlError::MissingTarget(target.to_string()))?;
        let labels = LabelEncoder::fit(target, data.column(target_idx))?;
        let n_classes = labels.n_classes();

        // rows without a target value take no part in training
        let labelled: Vec<(usize, usize)> = data
            .column(target_idx)
            .enumerate()
            .filter_map(|(row, v)| labels.encode(v).map(|c| (row, c)))
            .collect();
        if labelled.len() < MIN_ROWS {
            return Err(AutoMlError::InsufficientData {
                required: MIN_ROWS,
                actual: labelled.len(),
            });
        }
        let y_all: Vec<usize> = labelled.iter().map(|&(_, c)| c).collect();

        let features: Vec<String> = data
            .columns()
            .iter()
            .filter(|c| c.as_str() != target && !config.ignore_features.contains(c))
            .cloned()
            .collect();
        if features.is_empty() {
            return Err(AutoMlError::NoFeatures);
        }

        let mut rng = StdRng::seed_from_u64(config.seed);
        let (train_pos, test_pos) = stratified_split(&y_all, n_classes, config.train_size, &mut rng);
        let train_rows: Vec<usize> = train_pos.iter().map(|&p| labelled[p].0).collect();
        let test_rows: Vec<usize> = test_pos.iter().map(|&p| labelled[p].0).collect();
        let y_train = pick(&y_all, &train_pos);
        let y_test = pick(&y_all, &test_pos);

        let mut class_counts = vec![0usize; n_classes];
        for &c in &y_train {
            class_counts[c] += 1;
        }
        let (smallest_class, smallest) = class_counts
            .iter()
            .copied()
            .enumerate()
            .min_by_key(|&(_, n)| n)
            .unwrap_or((0, 0));
        if smallest < 2 {
            return Err(AutoMlError::ClassTooSmall {
                class: labels.decode(smallest_class).to_string(),
                count: smallest,
            });
        }
        let k = config.folds.min(smallest).max(2);

        let (preprocessor, x_train) = Preprocessor::fit(data, &features, &train_rows, config)?;
        let x_test = preprocessor.transform(data, &test_rows)?;
        let folds = stratified_folds(&y_train, n_classes, k, &mut rng);

        let mut rows = Vec::with_capacity(config.candidates.len());
        for &kind in &config.candidates {
            match Self::cross_validate(kind, &x_train, &y_train, n_classes, &folds, config.seed) {
                Ok((scores, fit_seconds)) => {
                    log::debug!("{:<28} {} = {:.4}", kind.name(), config.metric, scores.get(config.metric));
                    rows.push(ComparisonRow { kind, scores, fit_seconds });
                }
                Err(e) => log::warn!("Skipping {}: {e}", kind.name()),
            }
        }
        // stable sort keeps catalog order between equal scores
        rows.sort_by(|a, b| b.scores.get(config.metric).total_cmp(&a.scores.get(config.metric)));
        let comparison = ComparisonTable { metric: config.metric, rows };
        let best = comparison.best().ok_or(AutoMlError::NoCandidates)?;

        let estimator = fit_candidate(best.kind, &x_train, &y_train, n_classes, config.seed)?;
        let holdout = if x_test.nrows() > 0 {
            evaluate(&estimator, &x_test, &y_test, n_classes)
        } else {
            Scores::default()
        };

        let summary = build_summary(
            data,
            target,
            &labels,
            &features,
            &preprocessor,
            (x_train.nrows(), x_test.nrows()),
            k,
            config,
        );

        let model = ModelArtifact {
            version: ARTIFACT_VERSION,
            target: target.to_string(),
            preprocessor,
            labels,
            estimator,
            cv_scores: best.scores,
            dataset: None,
            trained_at_unix: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        };

        Ok(Experiment {
            summary,
            comparison,
            holdout,
            model,
        })
    }

    fn save_model(&self, model: &ModelArtifact, path: &std::path::Path) -> Result<(), AutoMlError> {
        model.save(path)
    }

    fn load_model(&self, path: &std::path::Path) -> Result<ModelArtifact, AutoMlError> {
        ModelArtifact::load(path)
    }

    fn predict(
        &self,
        model: &ModelArtifact,
        data: &DataTable,
        options: &PredictOptions,
    ) -> Result<Predictions, AutoMlError> {
        for column in [config::PREDICTION_LABEL_COLUMN, config::PREDICTION_SCORE_COLUMN] {
            if data.has_column(column) {
                return Err(AutoMlError::OutputColumnExists(column.to_string()));
            }
        }

        let x = model.preprocessor.transform_all(data)?;
        let clf = model.estimator.classifier();
        let decision = clf.decision(&x);
        let pred: Vec<usize> = decision
            .rows()
            .into_iter()
            .map(super::estimators::argmax)
            .collect();

        // score against the target when the file still carries it
        let scores = data.column_index(&model.target).and_then(|idx| {
            let (y_true, y_pred): (Vec<usize>, Vec<usize>) = data
                .column(idx)
                .zip(&pred)
                .filter_map(|(v, &p)| model.labels.encode(v).map(|t| (t, p)))
                .unzip();
            if y_true.is_empty() {
                return None;
            }
            let proba: Option<Vec<Vec<f64>>> = clf.has_proba().then(|| {
                data.column(idx)
                    .zip(decision.rows())
                    .filter(|(v, _)| model.labels.encode(v).is_some())
                    .map(|(_, r)| r.to_vec())
                    .collect()
            });
            Some(score(&y_true, &y_pred, proba.as_deref(), model.labels.n_classes()))
        });

        let mut table = data.clone();
        let label_values = pred.iter().map(|&c| model.labels.decode(c)).collect();
        table
            .push_column(config::PREDICTION_LABEL_COLUMN, label_values)
            .map_err(|_| AutoMlError::OutputColumnExists(config::PREDICTION_LABEL_COLUMN.into()))?;
        if options.include_score {
            let score_values = decision
                .rows()
                .into_iter()
                .map(|r| {
                    if clf.has_proba() {
                        let best = r.fold(0.0_f64, |a, &b| a.max(b));
                        CellValue::Float((best * 10_000.0).round() / 10_000.0)
                    } else {
                        CellValue::Null
                    }
                })
                .collect();
            table
                .push_column(config::PREDICTION_SCORE_COLUMN, score_values)
                .map_err(|_| AutoMlError::OutputColumnExists(config::PREDICTION_SCORE_COLUMN.into()))?;
        }

        Ok(Predictions { table, scores })
    }
}

#[allow(clippy::too_many_arguments)]
fn build_summary(
    data: &DataTable,
    target: &str,
    labels: &LabelEncoder,
    features: &[String],
    preprocessor: &Preprocessor,
    (n_train, n_test): (usize, usize),
    folds: usize,
    config: &SetupConfig,
) -> SetupSummary {
    let kinds: Vec<ColumnKind> = features
        .iter()
        .filter_map(|f| data.column_index(f))
        .map(|i| data.column_kind(i))
        .collect();
    let numeric = kinds
        .iter()
        .filter(|k| matches!(k, ColumnKind::Numeric | ColumnKind::Boolean))
        .count();
    let categorical = kinds.iter().filter(|&&k| k == ColumnKind::Categorical).count();
    let rows_with_missing = data
        .rows()
        .iter()
        .filter(|r| r.iter().any(|v| v.is_null()))
        .count();
    let width = preprocessor.output_columns().len();
    let removed = preprocessor.removed_columns();

    let mut s = SetupSummary::default();
    s.push("Session id", config.seed);
    s.push("Target", target);
    s.push(
        "Target type",
        if labels.n_classes() == 2 { "Binary" } else { "Multiclass" },
    );
    s.push("Target mapping", labels.describe());
    s.push("Original data shape", format!("({}, {})", data.len(), data.width()));
    s.push("Transformed data shape", format!("({}, {})", n_train + n_test, width + 1));
    s.push("Transformed train set shape", format!("({}, {})", n_train, width + 1));
    s.push("Transformed test set shape", format!("({}, {})", n_test, width + 1));
    s.push("Numeric features", numeric);
    s.push("Categorical features", categorical);
    s.push(
        "Rows with missing values",
        format!("{:.1}%", 100.0 * rows_with_missing as f64 / data.len().max(1) as f64),
    );
    s.push("Preprocess", true);
    s.push("Imputation type", "simple");
    s.push("Numeric imputation", "mean");
    s.push("Categorical imputation", "mode");
    s.push("Maximum one-hot encoding", config.max_one_hot_levels);
    s.push("Normalize", config.normalize);
    s.push("Normalize method", "zscore");
    s.push("Remove multicollinearity", config.remove_multicollinearity);
    s.push("Multicollinearity threshold", config.multicollinearity_threshold);
    if !removed.is_empty() {
        s.push("Removed features", removed.join(", "));
    }
    s.push("Fold generator", "StratifiedKFold");
    s.push("Fold number", folds);
    s.push("Ranking metric", config.metric);
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two numeric features that separate the classes plus a categorical one.
    fn dataset(n: usize) -> DataTable {
        let rows = (0..n)
            .map(|i| {
                let class = i % 2;
                let noise = ((i * 7) % 11) as f64 / 11.0;
                vec![
                    CellValue::Float(class as f64 * 3.0 + noise),
                    CellValue::Float(noise * 2.0 - class as f64),
                    CellValue::String(if i % 3 == 0 { "a" } else { "b" }.to_string()),
                    CellValue::String(if class == 1 { "yes" } else { "no" }.to_string()),
                ]
            })
            .collect();
        DataTable::new(
            vec!["f1".into(), "f2".into(), "cat".into(), "target".into()],
            rows,
        )
        .unwrap()
    }

    #[test]
    fn test_compare_ranks_every_candidate() {
        let exp = BuiltinAutoMl
            .compare_models(&dataset(60), "target", &SetupConfig::default())
            .unwrap();
        assert_eq!(exp.comparison.rows.len(), ModelKind::ALL.len());
        let accs: Vec<f64> = exp.comparison.rows.iter().map(|r| r.scores.accuracy).collect();
        assert!(accs.windows(2).all(|w| w[0] >= w[1]));
        assert!(exp.comparison.rows[0].scores.accuracy > 0.9);
        assert_eq!(exp.summary.get("Session id"), Some("123"));
        assert_eq!(exp.summary.get("Target type"), Some("Binary"));
        assert_eq!(exp.model.estimator.kind(), exp.comparison.rows[0].kind);
    }

    #[test]
    fn test_unknown_target() {
        let err = BuiltinAutoMl
            .compare_models(&dataset(20), "nope", &SetupConfig::default())
            .unwrap_err();
        assert!(matches!(err, AutoMlError::MissingTarget(_)));
    }

    #[test]
    fn test_continuous_target_is_rejected() {
        let data = dataset(20).drop_columns(&["target"]);
        let err = BuiltinAutoMl
            .compare_models(&data, "f1", &SetupConfig::default())
            .unwrap_err();
        assert!(matches!(err, AutoMlError::TargetNotCategorical { .. }));
    }

    #[test]
    fn test_predict_appends_label_and_optional_score() {
        let data = dataset(40);
        let config = SetupConfig {
            candidates: vec![ModelKind::LogisticRegression, ModelKind::Dummy],
            ..Default::default()
        };
        let exp = BuiltinAutoMl.compare_models(&data, "target", &config).unwrap();

        let out = BuiltinAutoMl
            .predict(&exp.model, &data, &PredictOptions::default())
            .unwrap();
        assert_eq!(out.table.width(), data.width() + 1);
        assert_eq!(out.table.len(), data.len());
        assert!(out.scores.is_some());

        let with_score = BuiltinAutoMl
            .predict(&exp.model, &data, &PredictOptions { include_score: true })
            .unwrap();
        assert!(with_score.table.has_column(config::PREDICTION_SCORE_COLUMN));
    }

    #[test]
    fn test_predict_missing_columns() {
        let data = dataset(40);
        let config = SetupConfig {
            candidates: vec![ModelKind::NaiveBayes],
            ..Default::default()
        };
        let exp = BuiltinAutoMl.compare_models(&data, "target", &config).unwrap();
        let narrow = data.drop_columns(&["f2", "target"]);
        let err = BuiltinAutoMl
            .predict(&exp.model, &narrow, &PredictOptions::default())
            .unwrap_err();
        assert!(matches!(err, AutoMlError::MissingColumns(cols) if cols == vec!["f2".to_string()]));
    }
}
