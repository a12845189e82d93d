use std::collections::{BTreeSet, HashSet};
use std::fmt;

use anyhow::{Result, bail};

// ---------------------------------------------------------------------------
// CellValue – a single cell of a table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
/// Used as a key in `BTreeMap` / `BTreeSet` downstream so it must be `Ord`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.4}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Infer the type of a raw text cell.
    pub fn parse(s: &str) -> CellValue {
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        match s {
            "true" | "True" | "TRUE" => CellValue::Bool(true),
            "false" | "False" | "FALSE" => CellValue::Bool(false),
            _ => CellValue::String(s.to_string()),
        }
    }

    /// Try to interpret the value as an `f64`. Booleans count as 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Text written to CSV. Floats keep a decimal point so that the column
    /// type survives a write/read cycle.
    pub fn to_csv_field(&self) -> String {
        match self {
            CellValue::String(s) => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(v) if v.is_nan() => String::new(),
            CellValue::Float(v) => format!("{v:?}"),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Null => String::new(),
        }
    }
}

/// Cell variants present in one column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CellMix {
    float: bool,
    int: bool,
    text: bool,
    boolean: bool,
}

// ---------------------------------------------------------------------------
// ColumnKind – derived type of a whole column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ColumnKind {
    Numeric,
    Boolean,
    Categorical,
    /// Only nulls.
    Empty,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnKind::Numeric => "Numeric",
            ColumnKind::Boolean => "Boolean",
            ColumnKind::Categorical => "Categorical",
            ColumnKind::Empty => "Empty",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// DataTable – rows and named columns
// ---------------------------------------------------------------------------

/// A rectangular table of cells with ordered, unique column names.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl DataTable {
    /// Build a table, checking that every row has one cell per column and
    /// that column names are unique.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.as_str()) {
                bail!("Duplicate column name '{col}'");
            }
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                bail!(
                    "Row {i} has {} values but the header has {} columns",
                    row.len(),
                    columns.len()
                );
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Iterate over the cells of one column.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    /// Sorted set of distinct non-null values of a column.
    pub fn unique_values(&self, idx: usize) -> BTreeSet<CellValue> {
        self.column(idx).filter(|v| !v.is_null()).cloned().collect()
    }

    /// Derive the kind of a column from its non-null cells.
    pub fn column_kind(&self, idx: usize) -> ColumnKind {
        let mut kind = ColumnKind::Empty;
        for value in self.column(idx) {
            let cell_kind = match value {
                CellValue::Null => continue,
                CellValue::Integer(_) | CellValue::Float(_) => ColumnKind::Numeric,
                CellValue::Bool(_) => ColumnKind::Boolean,
                CellValue::String(_) => return ColumnKind::Categorical,
            };
            kind = match (kind, cell_kind) {
                (ColumnKind::Empty, k) => k,
                (a, b) if a == b => a,
                _ => ColumnKind::Categorical,
            };
        }
        kind
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> DataTable {
        DataTable {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Copy of the table without the named columns. Names that are not
    /// present are ignored, so dropping twice equals dropping once.
    pub fn drop_columns(&self, names: &[&str]) -> DataTable {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !names.contains(&self.columns[i].as_str()))
            .collect();
        self.project(&keep)
    }

    /// Copy of the table restricted to the named columns, in the given order.
    pub fn select(&self, names: &[String]) -> Result<DataTable> {
        let mut idx = Vec::with_capacity(names.len());
        for name in names {
            match self.column_index(name) {
                Some(i) => idx.push(i),
                None => bail!("Column '{name}' not found"),
            }
        }
        Ok(self.project(&idx))
    }

    fn project(&self, idx: &[usize]) -> DataTable {
        DataTable {
            columns: idx.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| idx.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }

    /// Strip leading/trailing whitespace from every column name.
    pub fn trim_column_names(&mut self) -> Result<()> {
        let trimmed: Vec<String> = self.columns.iter().map(|c| c.trim().to_string()).collect();
        let mut seen = HashSet::new();
        for col in &trimmed {
            if !seen.insert(col.as_str()) {
                bail!("Column name '{col}' is duplicated after trimming whitespace");
            }
        }
        self.columns = trimmed;
        Ok(())
    }

    /// Append a column at the right edge.
    pub fn push_column(&mut self, name: &str, values: Vec<CellValue>) -> Result<()> {
        if self.has_column(name) {
            bail!("Column '{name}' already exists");
        }
        if values.len() != self.rows.len() {
            bail!(
                "Column '{name}' has {} values but the table has {} rows",
                values.len(),
                self.rows.len()
            );
        }
        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    /// Build a table from delimited text. Cells are typed one by one, except
    /// that a column holding any text that is neither a number nor a boolean
    /// keeps every non-empty cell verbatim (`007` stays `007`).
    pub fn from_text(columns: Vec<String>, raw: Vec<Vec<String>>) -> Result<Self> {
        let parsed = raw
            .iter()
            .map(|row| row.iter().map(|s| CellValue::parse(s)).collect())
            .collect();
        let mut table = DataTable::new(columns, parsed)?;
        for idx in 0..table.width() {
            if !table.cell_mix(idx).text {
                continue;
            }
            for (row, text) in table.rows.iter_mut().zip(&raw) {
                if !row[idx].is_null() {
                    row[idx] = CellValue::String(text[idx].clone());
                }
            }
        }
        table.normalize_column_types();
        Ok(table)
    }

    fn cell_mix(&self, idx: usize) -> CellMix {
        let mut mix = CellMix::default();
        for value in self.column(idx) {
            match value {
                CellValue::Float(_) => mix.float = true,
                CellValue::Integer(_) => mix.int = true,
                CellValue::String(_) => mix.text = true,
                CellValue::Bool(_) => mix.boolean = true,
                CellValue::Null => {}
            }
        }
        mix
    }

    /// Make each column internally consistent: integers mixed with floats
    /// become floats, any text makes every non-null cell text.
    pub fn normalize_column_types(&mut self) {
        for idx in 0..self.columns.len() {
            let mix = self.cell_mix(idx);
            let mixed_numbers = mix.float && mix.int;
            let mixed_text = (mix.text && (mix.float || mix.int || mix.boolean))
                || (mix.boolean && (mix.float || mix.int));
            if !mixed_numbers && !mixed_text {
                continue;
            }
            for row in &mut self.rows {
                let cell = &mut row[idx];
                *cell = match &mut *cell {
                    CellValue::Integer(i) if !mixed_text => CellValue::Float(*i as f64),
                    CellValue::Null => CellValue::Null,
                    other if mixed_text => match other {
                        CellValue::String(s) => CellValue::String(std::mem::take(s)),
                        v => CellValue::String(v.to_csv_field()),
                    },
                    other => other.clone(),
                };
            }
        }
    }

    /// Number of rows that are exact duplicates of an earlier row.
    pub fn duplicate_rows(&self) -> usize {
        let mut seen = HashSet::new();
        self.rows.iter().filter(|row| !seen.insert(*row)).count()
    }
}

/// Resolve raw header names the way Pandas does: blank names become
/// `Unnamed: <index>` and repeated names get a `.N` suffix.
pub fn normalize_headers(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for (i, name) in raw.iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {i}")
        } else {
            name.clone()
        };
        let mut candidate = base.clone();
        let mut n = 1;
        while out.contains(&candidate) {
            candidate = format!("{base}.{n}");
            n += 1;
        }
        out.push(candidate);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DataTable {
        DataTable::new(
            vec!["id".into(), "a".into(), "b".into()],
            vec![
                vec![CellValue::Integer(1), CellValue::Float(0.5), CellValue::String("x".into())],
                vec![CellValue::Integer(2), CellValue::Null, CellValue::String("y".into())],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_parse_cells() {
        assert_eq!(CellValue::parse(""), CellValue::Null);
        assert_eq!(CellValue::parse("42"), CellValue::Integer(42));
        assert_eq!(CellValue::parse("4.5"), CellValue::Float(4.5));
        assert_eq!(CellValue::parse("True"), CellValue::Bool(true));
        assert_eq!(CellValue::parse("satisfied"), CellValue::String("satisfied".into()));
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let err = DataTable::new(vec!["a".into()], vec![vec![CellValue::Null, CellValue::Null]]);
        assert!(err.is_err());
    }

    #[test]
    fn test_drop_columns_is_idempotent() {
        let t = table();
        let once = t.drop_columns(&["id", "Unnamed: 0"]);
        let twice = once.drop_columns(&["id", "Unnamed: 0"]);
        assert_eq!(once, twice);
        assert_eq!(once.columns(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_column_kinds() {
        let t = table();
        assert_eq!(t.column_kind(0), ColumnKind::Numeric);
        assert_eq!(t.column_kind(1), ColumnKind::Numeric);
        assert_eq!(t.column_kind(2), ColumnKind::Categorical);
    }

    #[test]
    fn test_normalize_mixed_numbers() {
        let mut t = DataTable::new(
            vec!["v".into()],
            vec![vec![CellValue::Integer(1)], vec![CellValue::Float(2.5)]],
        )
        .unwrap();
        t.normalize_column_types();
        assert_eq!(t.rows()[0][0], CellValue::Float(1.0));
    }

    #[test]
    fn test_normalize_mixed_text() {
        let mut t = DataTable::new(
            vec!["v".into()],
            vec![vec![CellValue::Integer(1)], vec![CellValue::String("n/a".into())]],
        )
        .unwrap();
        t.normalize_column_types();
        assert_eq!(t.rows()[0][0], CellValue::String("1".into()));
        assert_eq!(t.column_kind(0), ColumnKind::Categorical);
    }

    #[test]
    fn test_text_columns_keep_raw_cells() {
        let raw = |cells: &[&str]| cells.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        let t = DataTable::from_text(
            vec!["code".into(), "n".into()],
            vec![raw(&["007", "1"]), raw(&["abc", "2.5"]), raw(&["1e3", ""]), raw(&["", "4"])],
        )
        .unwrap();
        let code: Vec<_> = t.column(0).cloned().collect();
        assert_eq!(
            code,
            vec![
                CellValue::String("007".into()),
                CellValue::String("abc".into()),
                CellValue::String("1e3".into()),
                CellValue::Null,
            ]
        );
        assert_eq!(t.rows()[0][1], CellValue::Float(1.0));
        assert_eq!(t.rows()[2][1], CellValue::Null);
    }

    #[test]
    fn test_headers_like_pandas() {
        let raw = vec!["".to_string(), "a".to_string(), "a".to_string()];
        assert_eq!(normalize_headers(&raw), vec!["Unnamed: 0", "a", "a.1"]);
    }

    #[test]
    fn test_trim_and_push_column() {
        let mut t = DataTable::new(vec![" a ".into()], vec![vec![CellValue::Integer(1)]]).unwrap();
        t.trim_column_names().unwrap();
        assert!(t.has_column("a"));
        t.push_column("p", vec![CellValue::Bool(true)]).unwrap();
        assert_eq!(t.width(), 2);
        assert!(t.push_column("p", vec![CellValue::Null]).is_err());
    }
}
