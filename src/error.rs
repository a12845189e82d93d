use thiserror::Error;

use crate::automl::{AutoMlError, ComparisonTable};
use crate::config;

/// How the UI should present a failed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Something the user has to do first; shown as a warning.
    Precondition,
    Training,
    Inference,
    Parse,
    Persistence,
    Storage,
}

/// Failure of one workflow action. Nothing here is fatal to the app.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Please upload your dataset first.")]
    MissingDataset,

    #[error("No trained model found. Train a model in the Modelling section first.")]
    MissingModel,

    #[error("Please choose a target column.")]
    NoTarget,

    #[error("column '{0}' is not in the dataset")]
    UnknownTarget(String),

    #[error("could not read the uploaded file: {0}")]
    Parse(String),

    #[error("training failed: {0}")]
    Training(#[source] AutoMlError),

    #[error("inference failed: {0}")]
    Inference(#[source] AutoMlError),

    /// The comparison ran but the best model could not be saved. The
    /// ranking is kept so it can still be shown.
    #[error("could not save the best model: {message}")]
    Persistence {
        comparison: Box<ComparisonTable>,
        message: String,
    },

    #[error("storage error: {0}")]
    Storage(String),
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::MissingDataset
            | WorkflowError::MissingModel
            | WorkflowError::NoTarget
            | WorkflowError::UnknownTarget(_) => ErrorKind::Precondition,
            WorkflowError::Parse(_) => ErrorKind::Parse,
            WorkflowError::Training(_) => ErrorKind::Training,
            WorkflowError::Inference(_) => ErrorKind::Inference,
            WorkflowError::Persistence { .. } => ErrorKind::Persistence,
            WorkflowError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Remediation text shown under the error, if any.
    pub fn hint(&self) -> Option<&'static str> {
        match self.kind() {
            ErrorKind::Training => Some(config::TRAINING_HINT),
            ErrorKind::Inference => Some(config::INFERENCE_HINT),
            _ => None,
        }
    }

    pub fn is_warning(&self) -> bool {
        self.kind() == ErrorKind::Precondition
    }

    /// Ranking that survived a failed save.
    pub fn comparison(&self) -> Option<&ComparisonTable> {
        match self {
            WorkflowError::Persistence { comparison, .. } => Some(&**comparison),
            _ => None,
        }
    }

    pub(crate) fn storage(e: anyhow::Error) -> Self {
        WorkflowError::Storage(format!("{e:#}"))
    }

    pub(crate) fn parse(e: anyhow::Error) -> Self {
        WorkflowError::Parse(format!("{e:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hints_follow_kind() {
        let training = WorkflowError::Training(AutoMlError::NoFeatures);
        assert_eq!(training.hint(), Some(config::TRAINING_HINT));
        let inference = WorkflowError::Inference(AutoMlError::MissingColumns(vec!["a".into()]));
        assert_eq!(inference.hint(), Some(config::INFERENCE_HINT));
        assert!(inference.to_string().contains("missing feature columns: a"));
        assert!(WorkflowError::MissingModel.is_warning());
        assert_eq!(WorkflowError::Parse("bad".into()).hint(), None);
    }
}
