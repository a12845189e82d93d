//! Classification model selection.
//!
//! ```text
//! DataTable ──► LabelEncoder ──► stratified split ──► Preprocessor
//!                                                        │
//!              ComparisonTable ◄── k-fold CV per candidate
//!                    │
//!                    └──► refit best on train split ──► ModelArtifact (bincode)
//! ```
//!
//! The workflow only talks to [`AutoMlEngine`]; [`BuiltinAutoMl`] is the
//! in-process implementation.

pub mod artifact;
pub mod cv;
pub mod engine;
pub mod error;
pub mod estimators;
pub mod metrics;
pub mod preprocess;
pub mod setup;

use std::path::Path;

use crate::data::model::DataTable;

pub use artifact::ModelArtifact;
pub use engine::BuiltinAutoMl;
pub use error::AutoMlError;
pub use metrics::Scores;
pub use setup::{ComparisonTable, SetupConfig, SetupSummary};

/// Result of one `compare_models` run.
#[derive(Debug, Clone)]
pub struct Experiment {
    pub summary: SetupSummary,
    pub comparison: ComparisonTable,
    /// Scores of the best model on the held-out test split.
    pub holdout: Scores,
    pub model: ModelArtifact,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PredictOptions {
    /// Also append the probability of the predicted class.
    pub include_score: bool,
}

#[derive(Debug, Clone)]
pub struct Predictions {
    /// Input rows with the prediction column(s) appended.
    pub table: DataTable,
    /// Scores against the target column, when the input still has it.
    pub scores: Option<Scores>,
}

/// Pluggable model-selection backend.
pub trait AutoMlEngine {
    /// Set up the experiment on `data`, cross-validate every candidate and
    /// return the ranked comparison with the best model fitted.
    fn compare_models(
        &self,
        data: &DataTable,
        target: &str,
        config: &SetupConfig,
    ) -> Result<Experiment, AutoMlError>;

    fn save_model(&self, model: &ModelArtifact, path: &Path) -> Result<(), AutoMlError>;

    fn load_model(&self, path: &Path) -> Result<ModelArtifact, AutoMlError>;

    fn predict(
        &self,
        model: &ModelArtifact,
        data: &DataTable,
        options: &PredictOptions,
    ) -> Result<Predictions, AutoMlError>;
}
