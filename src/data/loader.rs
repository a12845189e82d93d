use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, DataTable, normalize_headers};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – header row + delimited values (the default)
/// * `.json`         – `[{ "col": value, ... }, ...]`
/// * `.parquet`      – flat columns of strings, ints, floats or bools
pub fn load_file(path: &Path) -> Result<DataTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" | "txt" | "" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            read_csv(file)
        }
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Parse delimited text with a header row from any byte stream.
pub fn read_csv<R: Read>(reader: R) -> Result<DataTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let raw_headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if raw_headers.is_empty() || raw_headers.iter().all(|h| h.is_empty()) {
        bail!("CSV has no header row");
    }
    let headers = normalize_headers(&raw_headers);

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    DataTable::from_text(headers, rows)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "age": 31, "class": "Business", "satisfaction": "satisfied" },
///   ...
/// ]
/// ```
///
/// Columns are ordered by first appearance; keys missing from a record are null.
fn load_json(path: &Path) -> Result<DataTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            columns
                .iter()
                .map(|col| obj.get(col).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    let mut table = DataTable::new(columns, rows)?;
    table.normalize_column_types();
    Ok(table)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<DataTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let values = (0..batch.num_columns())
                .map(|col| extract_cell(batch.column(col), row))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Row {row}"))?;
            rows.push(values);
        }
    }

    let mut table = DataTable::new(columns, rows)?;
    table.normalize_column_types();
    Ok(table)
}

// -- Parquet / Arrow helpers --

fn downcast<'a, T: 'static>(col: &'a Arc<dyn Array>) -> Result<&'a T> {
    col.as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("unexpected array layout for {:?}", col.data_type()))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => CellValue::String(downcast::<StringArray>(col)?.value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => CellValue::Integer(downcast::<Int32Array>(col)?.value(row) as i64),
        DataType::Int64 => CellValue::Integer(downcast::<Int64Array>(col)?.value(row)),
        DataType::Float32 => CellValue::Float(downcast::<Float32Array>(col)?.value(row) as f64),
        DataType::Float64 => CellValue::Float(downcast::<Float64Array>(col)?.value(row)),
        DataType::Boolean => CellValue::Bool(downcast::<BooleanArray>(col)?.value(row)),
        other => bail!("Unsupported parquet column type {other:?}"),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_csv_infers_types() {
        let text = "id,age,class,loyal\n1,31,Business,true\n2,45.5,Eco,false\n";
        let table = read_csv(text.as_bytes()).unwrap();
        assert_eq!(table.columns(), &["id", "age", "class", "loyal"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0][1], CellValue::Float(31.0));
        assert_eq!(table.rows()[1][3], CellValue::Bool(false));
    }

    #[test]
    fn test_read_csv_keeps_text_column_verbatim() {
        let text = "code,y\n007,a\nabc,b\n1.50,a\n1e3,b\n";
        let table = read_csv(text.as_bytes()).unwrap();
        let code: Vec<String> = table.column(0).map(|c| c.to_csv_field()).collect();
        assert_eq!(code, ["007", "abc", "1.50", "1e3"]);
    }

    #[test]
    fn test_read_csv_names_blank_header() {
        let text = ",a\n0,x\n1,y\n";
        let table = read_csv(text.as_bytes()).unwrap();
        assert_eq!(table.columns(), &["Unnamed: 0", "a"]);
    }

    #[test]
    fn test_read_csv_rejects_ragged_rows() {
        let text = "a,b\n1,2\n3\n";
        assert!(read_csv(text.as_bytes()).is_err());
    }

    #[test]
    fn test_load_json_records() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"[{{"a": 1, "b": "x"}}, {{"a": 2.5, "c": null}}]"#).unwrap();
        file.flush().unwrap();

        let table = load_file(file.path()).unwrap();
        assert_eq!(table.columns(), &["a", "b", "c"]);
        assert_eq!(table.rows()[0][0], CellValue::Float(1.0));
        assert_eq!(table.rows()[1][1], CellValue::Null);
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(load_file(Path::new("data.xlsx")).is_err());
    }
}
