use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::config;
use crate::data::store::DatasetStore;

/// Name of a session directory. Restricted to `[A-Za-z0-9_-]` so it can
/// never escape the sessions directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn new(key: &str) -> Result<Self> {
        if key.is_empty() || key.len() > 64 {
            bail!("Session key must be 1 to 64 characters long");
        }
        if !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            bail!("Session key '{key}' may only contain letters, digits, '_' and '-'");
        }
        Ok(SessionKey(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionKey {
    fn default() -> Self {
        SessionKey(config::DEFAULT_SESSION.to_string())
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything one user works on: a directory holding the dataset, the
/// trained model and the last predictions.
#[derive(Debug, Clone)]
pub struct Session {
    key: SessionKey,
    dir: PathBuf,
}

impl Session {
    /// Open (and create if needed) `<workspace>/sessions/<key>/`.
    pub fn open(workspace: &Path, key: SessionKey) -> Result<Self> {
        let dir = workspace.join(config::SESSIONS_DIR).join(key.as_str());
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating session directory {}", dir.display()))?;
        log::info!("Session '{key}' at {}", dir.display());
        Ok(Session { key, dir })
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn dataset_store(&self) -> DatasetStore {
        DatasetStore::new(self.dir.join(config::DATASET_FILE))
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(config::MODEL_FILE)
    }

    pub fn predictions_path(&self) -> PathBuf {
        self.dir.join(config::PREDICTIONS_FILE)
    }

    pub fn has_model(&self) -> bool {
        self.model_path().is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_validation() {
        assert!(SessionKey::new("team-a_1").is_ok());
        assert!(SessionKey::new("").is_err());
        assert!(SessionKey::new("../etc").is_err());
        assert_eq!(SessionKey::default().as_str(), "default");
    }

    #[test]
    fn test_sessions_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let a = Session::open(dir.path(), SessionKey::new("a").unwrap()).unwrap();
        let b = Session::open(dir.path(), SessionKey::new("b").unwrap()).unwrap();
        assert!(a.dir().is_dir());
        assert_ne!(a.model_path(), b.model_path());
        assert!(!a.has_model());
    }
}
