use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use super::model::DataTable;

/// Write a table as comma-separated text with a header row.
pub fn write_csv<W: Write>(table: &DataTable, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer
        .write_record(table.columns())
        .context("writing CSV header")?;
    for (row_no, row) in table.rows().iter().enumerate() {
        writer
            .write_record(row.iter().map(|v| v.to_csv_field()))
            .with_context(|| format!("writing CSV row {row_no}"))?;
    }
    writer.flush().context("flushing CSV writer")?;
    Ok(())
}

/// Render a table to CSV bytes, e.g. for a download.
pub fn to_csv_bytes(table: &DataTable) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_csv(table, &mut buf)?;
    Ok(buf)
}

/// Write a table to `path`, replacing any existing file.
pub fn save_csv(table: &DataTable, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv(table, std::io::BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_csv;
    use crate::data::model::CellValue;

    #[test]
    fn test_floats_keep_their_type() {
        let table = DataTable::new(
            vec!["x".into(), "note".into()],
            vec![
                vec![CellValue::Float(2.0), CellValue::String("a, b".into())],
                vec![CellValue::Float(0.25), CellValue::Null],
            ],
        )
        .unwrap();
        let bytes = to_csv_bytes(&table).unwrap();
        let back = read_csv(bytes.as_slice()).unwrap();
        assert_eq!(back, table);
    }
}
