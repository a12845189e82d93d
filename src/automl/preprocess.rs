//! Feature preprocessing fitted on the training split and replayed at
//! inference time: imputation, categorical encoding, z-score scaling and
//! removal of collinear columns.

use std::collections::BTreeMap;

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::data::model::{CellValue, ColumnKind, DataTable};

use super::error::AutoMlError;
use super::setup::SetupConfig;

// ---------------------------------------------------------------------------
// Target encoding
// ---------------------------------------------------------------------------

/// Maps class values to `0..n_classes` in sorted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<CellValue>,
}

impl LabelEncoder {
    /// Fit on a target column. Nulls are ignored; fractional floats are
    /// rejected since the target must be categorical.
    pub fn fit<'a>(
        column: &str,
        values: impl Iterator<Item = &'a CellValue>,
    ) -> Result<Self, AutoMlError> {
        let mut classes: Vec<CellValue> = Vec::new();
        for value in values {
            if let CellValue::Float(f) = value {
                if f.fract() != 0.0 || !f.is_finite() {
                    return Err(AutoMlError::TargetNotCategorical {
                        column: column.to_string(),
                        reason: format!("continuous value {f}"),
                    });
                }
            }
            if !value.is_null() && !classes.contains(value) {
                classes.push(value.clone());
            }
        }
        classes.sort();
        if classes.len() < 2 {
            return Err(AutoMlError::SingleClass(column.to_string()));
        }
        Ok(Self { classes })
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn encode(&self, value: &CellValue) -> Option<usize> {
        self.classes.binary_search(value).ok()
    }

    pub fn decode(&self, class: usize) -> CellValue {
        self.classes.get(class).cloned().unwrap_or(CellValue::Null)
    }

    /// "a: 0, b: 1" for the setup summary.
    pub fn describe(&self) -> String {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{c}: {i}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ---------------------------------------------------------------------------
// Feature encoding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureEncoder {
    /// Numeric or boolean column, nulls replaced by the training mean.
    Numeric { column: String, fill: f64 },
    /// One indicator column per training level; nulls take the mode.
    OneHot { column: String, fill: String, levels: Vec<String> },
    /// Position in the sorted training levels; unseen levels map to -1.
    Ordinal { column: String, fill: String, levels: Vec<String> },
}

impl FeatureEncoder {
    pub fn column(&self) -> &str {
        match self {
            FeatureEncoder::Numeric { column, .. }
            | FeatureEncoder::OneHot { column, .. }
            | FeatureEncoder::Ordinal { column, .. } => column,
        }
    }

    fn output_names(&self) -> Vec<String> {
        match self {
            FeatureEncoder::OneHot { column, levels, .. } => {
                levels.iter().map(|l| format!("{column}_{l}")).collect()
            }
            other => vec![other.column().to_string()],
        }
    }

    fn width(&self) -> usize {
        match self {
            FeatureEncoder::OneHot { levels, .. } => levels.len(),
            _ => 1,
        }
    }

    /// Write this feature's encoded values for one cell into `out`.
    fn encode(&self, value: &CellValue, out: &mut [f64]) -> Result<(), AutoMlError> {
        match self {
            FeatureEncoder::Numeric { column, fill } => {
                out[0] = match value {
                    CellValue::Null => *fill,
                    CellValue::Float(f) if f.is_nan() => *fill,
                    other => other.as_f64().ok_or_else(|| AutoMlError::NonNumeric {
                        column: column.clone(),
                        value: other.to_csv_field(),
                    })?,
                };
            }
            FeatureEncoder::OneHot { fill, levels, .. } => {
                let key = level_key(value).unwrap_or_else(|| fill.clone());
                for (slot, level) in out.iter_mut().zip(levels) {
                    *slot = if *level == key { 1.0 } else { 0.0 };
                }
            }
            FeatureEncoder::Ordinal { fill, levels, .. } => {
                let key = level_key(value).unwrap_or_else(|| fill.clone());
                out[0] = levels
                    .binary_search(&key)
                    .map(|i| i as f64)
                    .unwrap_or(-1.0);
            }
        }
        Ok(())
    }
}

/// Categorical levels are compared as text so that a column read as
/// integers in one file and as strings in another still matches.
fn level_key(value: &CellValue) -> Option<String> {
    match value {
        CellValue::Null => None,
        other => Some(other.to_csv_field()),
    }
}

// ---------------------------------------------------------------------------
// Preprocessor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    encoders: Vec<FeatureEncoder>,
    /// (mean, std) per encoded column; empty when normalization is off.
    scaling: Vec<(f64, f64)>,
    /// Encoded columns that survive multicollinearity removal.
    keep: Vec<bool>,
    encoded_names: Vec<String>,
}

impl Preprocessor {
    /// Fit on the given training rows of `table` using `features` as inputs.
    /// Returns the fitted preprocessor and the transformed training matrix.
    pub fn fit(
        table: &DataTable,
        features: &[String],
        rows: &[usize],
        config: &SetupConfig,
    ) -> Result<(Self, Array2<f64>), AutoMlError> {
        let mut encoders = Vec::with_capacity(features.len());
        for name in features {
            let idx = table
                .column_index(name)
                .ok_or_else(|| AutoMlError::MissingColumns(vec![name.clone()]))?;
            let values: Vec<&CellValue> = rows.iter().map(|&r| &table.rows()[r][idx]).collect();
            match table.column_kind(idx) {
                ColumnKind::Empty => {
                    log::debug!("Skipping all-null column '{name}'");
                }
                ColumnKind::Numeric | ColumnKind::Boolean => {
                    let present: Vec<f64> = values
                        .iter()
                        .filter_map(|v| v.as_f64())
                        .filter(|f| !f.is_nan())
                        .collect();
                    let fill = if present.is_empty() {
                        0.0
                    } else {
                        present.iter().sum::<f64>() / present.len() as f64
                    };
                    encoders.push(FeatureEncoder::Numeric { column: name.clone(), fill });
                }
                ColumnKind::Categorical => {
                    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
                    for key in values.iter().filter_map(|v| level_key(v)) {
                        *counts.entry(key).or_default() += 1;
                    }
                    // mode, ties broken by the smallest level
                    let fill = counts
                        .iter()
                        .fold(None::<(&String, usize)>, |best, (k, &c)| match best {
                            Some((_, bc)) if bc >= c => best,
                            _ => Some((k, c)),
                        })
                        .map(|(k, _)| k.clone())
                        .unwrap_or_default();
                    let levels: Vec<String> = counts.into_keys().collect();
                    let column = name.clone();
                    if levels.len() <= config.max_one_hot_levels {
                        encoders.push(FeatureEncoder::OneHot { column, fill, levels });
                    } else {
                        encoders.push(FeatureEncoder::Ordinal { column, fill, levels });
                    }
                }
            }
        }

        let encoded_names: Vec<String> = encoders.iter().flat_map(|e| e.output_names()).collect();
        let mut pre = Preprocessor {
            keep: vec![true; encoded_names.len()],
            encoders,
            scaling: Vec::new(),
            encoded_names,
        };

        let raw = pre.encode(table, rows)?;
        if config.normalize {
            pre.scaling = raw
                .axis_iter(Axis(1))
                .map(|col| {
                    let mean = col.mean().unwrap_or(0.0);
                    let std = col.std(0.0);
                    (mean, if std > 0.0 { std } else { 1.0 })
                })
                .collect();
        }
        let scaled = pre.scale(raw);

        if config.remove_multicollinearity {
            pre.keep = collinear_mask(&scaled, config.multicollinearity_threshold);
        }
        if !pre.keep.iter().any(|&k| k) {
            return Err(AutoMlError::NoFeatures);
        }
        let matrix = pre.select(scaled);
        Ok((pre, matrix))
    }

    /// Raw input columns the preprocessor reads.
    pub fn input_columns(&self) -> Vec<String> {
        self.encoders.iter().map(|e| e.column().to_string()).collect()
    }

    /// Names of the columns of the transformed matrix.
    pub fn output_columns(&self) -> Vec<String> {
        self.encoded_names
            .iter()
            .zip(&self.keep)
            .filter(|(_, &k)| k)
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Encoded columns removed as collinear.
    pub fn removed_columns(&self) -> Vec<String> {
        self.encoded_names
            .iter()
            .zip(&self.keep)
            .filter(|(_, &k)| !k)
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Transform the given rows of `table`.
    pub fn transform(&self, table: &DataTable, rows: &[usize]) -> Result<Array2<f64>, AutoMlError> {
        let raw = self.encode(table, rows)?;
        Ok(self.select(self.scale(raw)))
    }

    /// Transform every row of `table`.
    pub fn transform_all(&self, table: &DataTable) -> Result<Array2<f64>, AutoMlError> {
        let rows: Vec<usize> = (0..table.len()).collect();
        self.transform(table, &rows)
    }

    fn encode(&self, table: &DataTable, rows: &[usize]) -> Result<Array2<f64>, AutoMlError> {
        let missing: Vec<String> = self
            .encoders
            .iter()
            .map(|e| e.column())
            .filter(|c| !table.has_column(c))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(AutoMlError::MissingColumns(missing));
        }
        let positions: Vec<usize> = self
            .encoders
            .iter()
            .filter_map(|e| table.column_index(e.column()))
            .collect();

        let mut out = Array2::<f64>::zeros((rows.len(), self.encoded_names.len()));
        for (i, &r) in rows.iter().enumerate() {
            let row = &table.rows()[r];
            let mut out_row = out.row_mut(i);
            let slots = out_row
                .as_slice_mut()
                .ok_or_else(|| AutoMlError::NoFeatures)?;
            let mut offset = 0;
            for (encoder, &col) in self.encoders.iter().zip(&positions) {
                let width = encoder.width();
                encoder.encode(&row[col], &mut slots[offset..offset + width])?;
                offset += width;
            }
        }
        Ok(out)
    }

    fn scale(&self, mut raw: Array2<f64>) -> Array2<f64> {
        if self.scaling.is_empty() {
            return raw;
        }
        for (mut col, &(mean, std)) in raw.axis_iter_mut(Axis(1)).zip(&self.scaling) {
            col.mapv_inplace(|v| (v - mean) / std);
        }
        raw
    }

    fn select(&self, matrix: Array2<f64>) -> Array2<f64> {
        if self.keep.iter().all(|&k| k) {
            return matrix;
        }
        let idx: Vec<usize> = (0..self.keep.len()).filter(|&j| self.keep[j]).collect();
        matrix.select(Axis(1), &idx)
    }
}

/// Keep-mask dropping each column whose absolute Pearson correlation with
/// an earlier kept column exceeds `threshold`.
fn collinear_mask(x: &Array2<f64>, threshold: f64) -> Vec<bool> {
    let n = x.nrows() as f64;
    let m = x.ncols();
    let centered: Vec<(Vec<f64>, f64)> = x
        .axis_iter(Axis(1))
        .map(|col| {
            let mean = col.sum() / n;
            let c: Vec<f64> = col.iter().map(|v| v - mean).collect();
            let norm = c.iter().map(|v| v * v).sum::<f64>().sqrt();
            (c, norm)
        })
        .collect();

    let mut keep = vec![true; m];
    for j in 0..m {
        let (cj, nj) = &centered[j];
        if *nj == 0.0 {
            continue;
        }
        for i in 0..j {
            let (ci, ni) = &centered[i];
            if !keep[i] || *ni == 0.0 {
                continue;
            }
            let r = ci.iter().zip(cj).map(|(a, b)| a * b).sum::<f64>() / (ni * nj);
            if r.abs() > threshold {
                keep[j] = false;
                break;
            }
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DataTable {
        let rows = vec![
            vec![CellValue::Float(1.0), CellValue::Float(2.0), CellValue::String("a".into())],
            vec![CellValue::Float(2.0), CellValue::Float(4.0), CellValue::String("b".into())],
            vec![CellValue::Null, CellValue::Float(6.5), CellValue::String("a".into())],
            vec![CellValue::Float(4.0), CellValue::Float(8.0), CellValue::Null],
        ];
        DataTable::new(vec!["x".into(), "x2".into(), "c".into()], rows).unwrap()
    }

    fn features() -> Vec<String> {
        vec!["x".into(), "x2".into(), "c".into()]
    }

    #[test]
    fn test_label_encoder() {
        let values = [
            CellValue::String("yes".into()),
            CellValue::String("no".into()),
            CellValue::Null,
            CellValue::String("yes".into()),
        ];
        let enc = LabelEncoder::fit("t", values.iter()).unwrap();
        assert_eq!(enc.n_classes(), 2);
        assert_eq!(enc.encode(&CellValue::String("no".into())), Some(0));
        assert_eq!(enc.decode(1), CellValue::String("yes".into()));
        assert_eq!(enc.describe(), "no: 0, yes: 1");
    }

    #[test]
    fn test_label_encoder_rejects_continuous_target() {
        let values = [CellValue::Float(0.5), CellValue::Float(1.0)];
        assert!(matches!(
            LabelEncoder::fit("t", values.iter()),
            Err(AutoMlError::TargetNotCategorical { .. })
        ));
    }

    #[test]
    fn test_imputes_and_one_hot_encodes() {
        let config = SetupConfig {
            normalize: false,
            remove_multicollinearity: false,
            ..Default::default()
        };
        let (pre, x) = Preprocessor::fit(&table(), &features(), &[0, 1, 2, 3], &config).unwrap();
        assert_eq!(pre.output_columns(), vec!["x", "x2", "c_a", "c_b"]);
        // mean of 1, 2, 4
        assert!((x[[2, 0]] - 7.0 / 3.0).abs() < 1e-12);
        // null category takes the mode "a"
        assert_eq!(x.row(3).to_vec(), vec![4.0, 8.0, 1.0, 0.0]);
    }

    #[test]
    fn test_removes_collinear_columns() {
        let config = SetupConfig::default();
        let (pre, x) = Preprocessor::fit(&table(), &features(), &[0, 1, 2, 3], &config).unwrap();
        // c_b mirrors c_a
        assert!(pre.removed_columns().contains(&"c_b".to_string()));
        assert_eq!(x.ncols(), pre.output_columns().len());
    }

    #[test]
    fn test_transform_reports_missing_columns() {
        let config = SetupConfig::default();
        let (pre, _) = Preprocessor::fit(&table(), &features(), &[0, 1, 2, 3], &config).unwrap();
        let narrow = table().select(&["x".to_string()]).unwrap();
        match pre.transform_all(&narrow) {
            Err(AutoMlError::MissingColumns(cols)) => assert_eq!(cols, vec!["x2", "c"]),
            other => panic!("unexpected {other:?}"),
        }
    }
}
