use std::fmt;

use serde::Serialize;

use crate::data::model::ColumnKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileReport {
    pub overview: Overview,
    pub variables: Vec<VariableProfile>,
    pub correlations: Correlations,
    pub alerts: Vec<Alert>,
}

impl ProfileReport {
    pub fn variable(&self, name: &str) -> Option<&VariableProfile> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// (column, missing count, missing share) for every column.
    pub fn missing_summary(&self) -> Vec<(&str, usize, f64)> {
        self.variables
            .iter()
            .map(|v| (v.name.as_str(), v.missing, v.missing_share))
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Overview {
    pub rows: usize,
    pub columns: usize,
    pub missing_cells: usize,
    pub missing_share: f64,
    pub duplicate_rows: usize,
    pub numeric: usize,
    pub boolean: usize,
    pub categorical: usize,
    pub empty: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub count: usize,
    pub missing: usize,
    pub missing_share: f64,
    pub distinct: usize,
    pub numeric: Option<NumericSummary>,
    /// Most frequent values with their counts, most frequent first.
    pub top_values: Vec<(String, usize)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub zeros: usize,
    pub histogram: Histogram,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// `counts.len() + 1` bin edges.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn bin_width(&self) -> f64 {
        match (self.edges.first(), self.edges.last()) {
            (Some(lo), Some(hi)) if !self.counts.is_empty() => (hi - lo) / self.counts.len() as f64,
            _ => 0.0,
        }
    }

    pub fn centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
    }
}

/// Pearson correlations over the numeric and boolean columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Correlations {
    pub columns: Vec<String>,
    /// Row-major; `None` where a column is constant.
    pub matrix: Vec<Vec<Option<f64>>>,
}

impl Correlations {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.matrix[i][j]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Alert {
    Constant { column: String },
    Unique { column: String },
    HighCardinality { column: String, distinct: usize },
    HighMissing { column: String, share: f64 },
    Zeros { column: String, share: f64 },
    HighCorrelation { a: String, b: String, r: f64 },
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::Constant { column } => write!(f, "{column} has a constant value"),
            Alert::Unique { column } => write!(f, "{column} has unique values"),
            Alert::HighCardinality { column, distinct } => {
                write!(f, "{column} has a high cardinality: {distinct} distinct values")
            }
            Alert::HighMissing { column, share } => {
                write!(f, "{column} has {:.1}% missing values", share * 100.0)
            }
            Alert::Zeros { column, share } => write!(f, "{column} has {:.1}% zeros", share * 100.0),
            Alert::HighCorrelation { a, b, r } => {
                write!(f, "{a} is highly correlated with {b} (r = {r:.2})")
            }
        }
    }
}
