use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use super::loader::load_file;
use super::model::DataTable;
use super::writer::to_csv_bytes;

/// Content fingerprint of a stored dataset (hex SHA-256 of the file bytes).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Fingerprint(format!("{:x}", Sha256::digest(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for display.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The current dataset of a session, kept as one CSV file.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    path: PathBuf,
}

impl DatasetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the stored dataset, or `None` when nothing was uploaded yet.
    /// A malformed file is an error.
    pub fn load(&self) -> Result<Option<DataTable>> {
        if !self.exists() {
            return Ok(None);
        }
        load_file(&self.path)
            .with_context(|| format!("loading dataset {}", self.path.display()))
            .map(Some)
    }

    /// Overwrite the stored dataset and return its fingerprint.
    pub fn save(&self, table: &DataTable) -> Result<Fingerprint> {
        let bytes = to_csv_bytes(table)?;
        std::fs::write(&self.path, &bytes)
            .with_context(|| format!("writing dataset {}", self.path.display()))?;
        Ok(Fingerprint::of_bytes(&bytes))
    }

    /// Fingerprint of the file currently on disk.
    pub fn fingerprint(&self) -> Result<Option<Fingerprint>> {
        if !self.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&self.path)
            .with_context(|| format!("reading dataset {}", self.path.display()))?;
        Ok(Some(Fingerprint::of_bytes(&bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;

    #[test]
    fn test_load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(dir.path().join("dataset.csv"));
        assert!(store.load().unwrap().is_none());
        assert!(store.fingerprint().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(dir.path().join("dataset.csv"));
        let table = DataTable::new(
            vec!["a".into(), "b".into()],
            vec![
                vec![CellValue::Integer(1), CellValue::String("x".into())],
                vec![CellValue::Integer(2), CellValue::String("y".into())],
            ],
        )
        .unwrap();

        let fp = store.save(&table).unwrap();
        assert_eq!(fp.as_str().len(), 64);
        assert_eq!(store.fingerprint().unwrap(), Some(fp));
        assert_eq!(store.load().unwrap(), Some(table));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.csv");
        std::fs::write(&path, "a,b\n1,2,3\n").unwrap();
        assert!(DatasetStore::new(path).load().is_err());
    }
}
