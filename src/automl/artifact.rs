use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::store::Fingerprint;

use super::error::AutoMlError;
use super::estimators::Estimator;
use super::metrics::Scores;
use super::preprocess::{LabelEncoder, Preprocessor};

pub const ARTIFACT_VERSION: u32 = 1;

/// Everything needed to replay a trained pipeline on new data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: u32,
    pub target: String,
    pub preprocessor: Preprocessor,
    pub labels: LabelEncoder,
    pub estimator: Estimator,
    /// Mean cross-validation scores of the chosen candidate.
    pub cv_scores: Scores,
    /// Dataset the model was trained on, when known.
    pub dataset: Option<Fingerprint>,
    pub trained_at_unix: u64,
}

impl ModelArtifact {
    /// Raw input columns the model expects.
    pub fn feature_columns(&self) -> Vec<String> {
        self.preprocessor.input_columns()
    }

    pub fn save(&self, path: &Path) -> Result<(), AutoMlError> {
        let bytes = bincode::serialize(self)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, AutoMlError> {
        let bytes = std::fs::read(path)?;
        let artifact: ModelArtifact = bincode::deserialize(&bytes)?;
        if artifact.version != ARTIFACT_VERSION {
            return Err(AutoMlError::Version {
                found: artifact.version,
                expected: ARTIFACT_VERSION,
            });
        }
        Ok(artifact)
    }
}
