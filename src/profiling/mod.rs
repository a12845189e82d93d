//! Exploratory profile of the current dataset.

pub mod report;

use std::collections::HashMap;

use crate::config;
use crate::data::model::{CellValue, ColumnKind, DataTable};

pub use report::{Alert, Correlations, Histogram, NumericSummary, Overview, ProfileReport, VariableProfile};

/// Produces a [`ProfileReport`] for a table.
pub trait Profiler {
    fn profile(&self, data: &DataTable) -> ProfileReport;
}

/// Descriptive statistics, histograms, correlations and alerts.
#[derive(Debug, Clone)]
pub struct DescriptiveProfiler {
    pub bins: usize,
    pub top_values: usize,
}

impl Default for DescriptiveProfiler {
    fn default() -> Self {
        Self {
            bins: config::HISTOGRAM_BINS,
            top_values: config::TOP_VALUES,
        }
    }
}

impl Profiler for DescriptiveProfiler {
    fn profile(&self, data: &DataTable) -> ProfileReport {
        let variables: Vec<VariableProfile> = (0..data.width())
            .map(|idx| self.variable(data, idx))
            .collect();
        let correlations = correlations(data);
        let overview = overview(data, &variables);
        let alerts = alerts(data.len(), &variables, &correlations);
        log::debug!(
            "Profiled {} rows x {} columns, {} alerts",
            overview.rows,
            overview.columns,
            alerts.len()
        );
        ProfileReport {
            overview,
            variables,
            correlations,
            alerts,
        }
    }
}

impl DescriptiveProfiler {
    fn variable(&self, data: &DataTable, idx: usize) -> VariableProfile {
        let kind = data.column_kind(idx);
        let total = data.len();
        let present: Vec<&CellValue> = data.column(idx).filter(|v| !v.is_null()).collect();
        let missing = total - present.len();

        let mut counts: HashMap<&CellValue, usize> = HashMap::new();
        for v in &present {
            *counts.entry(*v).or_default() += 1;
        }
        let distinct = counts.len();

        let numeric = match kind {
            ColumnKind::Numeric => {
                let values: Vec<f64> = present.iter().filter_map(|v| v.as_f64()).collect();
                numeric_summary(&values, self.bins)
            }
            _ => None,
        };

        let top_values = if kind == ColumnKind::Numeric {
            Vec::new()
        } else {
            let mut sorted: Vec<(&CellValue, usize)> = counts.into_iter().collect();
            // count descending, then value ascending so ties are stable
            sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            sorted
                .into_iter()
                .take(self.top_values)
                .map(|(v, n)| (v.to_string(), n))
                .collect()
        };

        VariableProfile {
            name: data.columns()[idx].clone(),
            kind,
            count: present.len(),
            missing,
            missing_share: share(missing, total),
            distinct,
            numeric,
            top_values,
        }
    }
}

fn share(part: usize, total: usize) -> f64 {
    if total == 0 { 0.0 } else { part as f64 / total as f64 }
}

/// Quantile of sorted values with linear interpolation between ranks.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn numeric_summary(values: &[f64], bins: usize) -> Option<NumericSummary> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    let std = if sorted.len() > 1 {
        (sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    } else {
        0.0
    };
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];

    Some(NumericSummary {
        mean,
        std,
        min,
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max,
        zeros: sorted.iter().filter(|&&v| v == 0.0).count(),
        histogram: histogram(&sorted, min, max, bins.max(1)),
    })
}

fn histogram(values: &[f64], min: f64, max: f64, bins: usize) -> Histogram {
    // a constant column gets a single unit-wide bin
    if max <= min {
        return Histogram {
            edges: vec![min - 0.5, min + 0.5],
            counts: vec![values.len()],
        };
    }
    let width = (max - min) / bins as f64;
    let edges = (0..=bins).map(|i| min + width * i as f64).collect();
    let mut counts = vec![0usize; bins];
    for &v in values {
        let bin = (((v - min) / width) as usize).min(bins - 1);
        counts[bin] += 1;
    }
    Histogram { edges, counts }
}

fn overview(data: &DataTable, variables: &[VariableProfile]) -> Overview {
    let missing_cells: usize = variables.iter().map(|v| v.missing).sum();
    let count = |kind: ColumnKind| variables.iter().filter(|v| v.kind == kind).count();
    Overview {
        rows: data.len(),
        columns: data.width(),
        missing_cells,
        missing_share: share(missing_cells, data.len() * data.width()),
        duplicate_rows: data.duplicate_rows(),
        numeric: count(ColumnKind::Numeric),
        boolean: count(ColumnKind::Boolean),
        categorical: count(ColumnKind::Categorical),
        empty: count(ColumnKind::Empty),
    }
}

fn correlations(data: &DataTable) -> Correlations {
    let indices: Vec<usize> = (0..data.width())
        .filter(|&i| matches!(data.column_kind(i), ColumnKind::Numeric | ColumnKind::Boolean))
        .collect();
    let series: Vec<Vec<Option<f64>>> = indices
        .iter()
        .map(|&i| data.column(i).map(|v| v.as_f64()).collect())
        .collect();

    let k = indices.len();
    let mut matrix = vec![vec![None; k]; k];
    for a in 0..k {
        for b in a..k {
            let r = pearson(&series[a], &series[b]);
            matrix[a][b] = r;
            matrix[b][a] = r;
        }
    }
    Correlations {
        columns: indices.iter().map(|&i| data.columns()[i].clone()).collect(),
        matrix,
    }
}

/// Pearson correlation over the rows where both values are present.
pub fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx).powi(2);
        syy += (y - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

fn alerts(rows: usize, variables: &[VariableProfile], correlations: &Correlations) -> Vec<Alert> {
    let mut alerts = Vec::new();
    for v in variables {
        let column = v.name.clone();
        if v.count > 0 && v.distinct == 1 {
            alerts.push(Alert::Constant { column: column.clone() });
        } else if rows > 1 && v.distinct == rows {
            alerts.push(Alert::Unique { column: column.clone() });
        }
        if v.kind == ColumnKind::Categorical && v.distinct > config::HIGH_CARDINALITY {
            alerts.push(Alert::HighCardinality {
                column: column.clone(),
                distinct: v.distinct,
            });
        }
        if v.missing_share > config::HIGH_MISSING_SHARE {
            alerts.push(Alert::HighMissing {
                column: column.clone(),
                share: v.missing_share,
            });
        }
        if let Some(num) = &v.numeric {
            let zeros = share(num.zeros, rows);
            if zeros > config::HIGH_ZEROS_SHARE {
                alerts.push(Alert::Zeros { column, share: zeros });
            }
        }
    }
    for (i, a) in correlations.columns.iter().enumerate() {
        for (j, b) in correlations.columns.iter().enumerate().skip(i + 1) {
            if let Some(r) = correlations.matrix[i][j] {
                if r.abs() > config::HIGH_CORRELATION {
                    alerts.push(Alert::HighCorrelation {
                        a: a.clone(),
                        b: b.clone(),
                        r,
                    });
                }
            }
        }
    }
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DataTable {
        let rows = (0..10)
            .map(|i| {
                vec![
                    CellValue::Integer(i),
                    CellValue::Float(i as f64 * 2.0),
                    CellValue::String(if i < 7 { "x" } else { "y" }.into()),
                    if i % 2 == 0 { CellValue::Null } else { CellValue::Integer(0) },
                    CellValue::Bool(true),
                ]
            })
            .collect();
        DataTable::new(
            vec!["id".into(), "double".into(), "cat".into(), "sparse".into(), "flag".into()],
            rows,
        )
        .unwrap()
    }

    #[test]
    fn test_quantile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&v, 0.0), 1.0);
        assert_eq!(quantile(&v, 0.5), 2.5);
        assert!((quantile(&v, 0.25) - 1.75).abs() < 1e-12);
        assert_eq!(quantile(&v, 1.0), 4.0);
    }

    #[test]
    fn test_numeric_summary() {
        let report = DescriptiveProfiler::default().profile(&table());
        let id = report.variable("id").unwrap();
        let num = id.numeric.as_ref().unwrap();
        assert_eq!(num.mean, 4.5);
        assert_eq!(num.min, 0.0);
        assert_eq!(num.max, 9.0);
        assert!((num.std - 3.0276503540974917).abs() < 1e-9);
        assert_eq!(num.histogram.counts.iter().sum::<usize>(), 10);
        assert_eq!(num.histogram.counts.len(), config::HISTOGRAM_BINS);
    }

    #[test]
    fn test_top_values_and_overview() {
        let report = DescriptiveProfiler::default().profile(&table());
        let cat = report.variable("cat").unwrap();
        assert_eq!(cat.top_values, vec![("x".to_string(), 7), ("y".to_string(), 3)]);
        assert_eq!(report.overview.missing_cells, 5);
        assert_eq!(report.overview.categorical, 1);
        assert_eq!(report.overview.boolean, 1);
        assert_eq!(report.overview.numeric, 3);
    }

    #[test]
    fn test_alerts() {
        let report = DescriptiveProfiler::default().profile(&table());
        let has = |pred: &dyn Fn(&Alert) -> bool| report.alerts.iter().any(pred);
        assert!(has(&|a| matches!(a, Alert::Constant { column } if column == "flag")));
        assert!(has(&|a| matches!(a, Alert::Unique { column } if column == "id")));
        assert!(has(&|a| matches!(a, Alert::HighMissing { column, .. } if column == "sparse")));
        // 5 zeros out of 10 rows sits exactly on the threshold
        assert!(!has(&|a| matches!(a, Alert::Zeros { .. })));
        assert!(has(&|a| matches!(a, Alert::HighCorrelation { a, b, .. } if a == "id" && b == "double")));
    }

    #[test]
    fn test_correlation_skips_constant_columns() {
        let report = DescriptiveProfiler::default().profile(&table());
        assert_eq!(report.correlations.get("id", "double"), Some(1.0));
        assert_eq!(report.correlations.get("id", "flag"), None);
        assert!(!report.correlations.columns.contains(&"cat".to_string()));
    }

    #[test]
    fn test_report_serializes() {
        let report = DescriptiveProfiler::default().profile(&table());
        let json = report.to_json().unwrap();
        assert!(json.contains("\"overview\""));
    }
}
