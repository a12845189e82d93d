use std::path::PathBuf;

use crate::automl::{ComparisonTable, PredictOptions};
use crate::data::model::DataTable;
use crate::error::WorkflowError;
use crate::profiling::ProfileReport;
use crate::workflow::{InferenceOutcome, Mode, ModelInfo, Request, Response, TrainingOutcome, Workflow};

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

/// One message line shown at the top of the central panel.
#[derive(Debug, Clone)]
pub struct Notice {
    pub severity: Severity,
    pub text: String,
    pub hint: Option<&'static str>,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            text: text.into(),
            hint: None,
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            text: text.into(),
            hint: None,
        }
    }
}

impl From<&WorkflowError> for Notice {
    fn from(e: &WorkflowError) -> Self {
        Self {
            severity: if e.is_warning() { Severity::Warning } else { Severity::Error },
            text: e.to_string(),
            hint: e.hint(),
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub workflow: Workflow,

    /// Active navigation entry.
    pub mode: Mode,

    /// Stored dataset as last read from the session (None until uploaded).
    pub dataset: Option<DataTable>,

    /// Profile of `dataset`, rebuilt every time Profiling is entered.
    pub profile: Option<ProfileReport>,

    /// Candidate target columns and the chosen one.
    pub targets: Vec<String>,
    pub target: Option<String>,

    pub training: Option<TrainingOutcome>,
    /// Ranking kept from a run whose model could not be saved.
    pub unsaved_comparison: Option<ComparisonTable>,

    pub inference: Option<InferenceOutcome>,
    pub predict_options: PredictOptions,

    pub model_info: Option<ModelInfo>,

    pub notices: Vec<Notice>,
}

impl AppState {
    pub fn new(workflow: Workflow) -> Self {
        let mut state = Self {
            workflow,
            mode: Mode::default(),
            dataset: None,
            profile: None,
            targets: Vec::new(),
            target: None,
            training: None,
            unsaved_comparison: None,
            inference: None,
            predict_options: PredictOptions::default(),
            model_info: None,
            notices: Vec::new(),
        };
        state.reload_dataset();
        state
    }

    fn report(&mut self, e: &WorkflowError) {
        self.notices.push(Notice::from(e));
    }

    /// Re-read the stored dataset and the target choices derived from it.
    pub fn reload_dataset(&mut self) {
        match self.workflow.current_dataset() {
            Ok(ds) => self.dataset = ds,
            Err(e) => {
                self.dataset = None;
                self.report(&e);
            }
        }
        self.targets = if self.dataset.is_some() {
            self.workflow.target_columns().unwrap_or_default()
        } else {
            Vec::new()
        };
        if self
            .target
            .as_ref()
            .map_or(true, |t| !self.targets.contains(t))
        {
            self.target = self.targets.first().cloned();
        }
    }

    /// Switch mode and run the work that entering it implies.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.notices.clear();
        match mode {
            Mode::Upload => {}
            Mode::Profiling => {
                self.profile = None;
                match self.workflow.handle(Request::Profile) {
                    Ok(Response::Profile(report)) => self.profile = Some(*report),
                    Ok(_) => {}
                    Err(e) => self.report(&e),
                }
            }
            Mode::Modelling => {
                if self.dataset.is_none() {
                    self.report(&WorkflowError::MissingDataset);
                }
            }
            Mode::Inference | Mode::Download => self.refresh_model_info(),
        }
    }

    pub fn refresh_model_info(&mut self) {
        self.model_info = None;
        match self.workflow.handle(Request::ModelInfo) {
            Ok(Response::ModelInfo(info)) => self.model_info = info.map(|b| *b),
            Ok(_) => {}
            Err(e) => self.report(&e),
        }
        if self.model_info.is_none() {
            self.report(&WorkflowError::MissingModel);
        } else if self.mode == Mode::Inference {
            self.notices.push(Notice::success("Model loaded successfully"));
        }
    }

    pub fn upload(&mut self, path: PathBuf) {
        self.notices.clear();
        match self.workflow.handle(Request::Upload(path)) {
            Ok(Response::Uploaded(table)) => {
                self.dataset = Some(table);
                // a new dataset invalidates everything derived from the old one
                self.profile = None;
                self.training = None;
                self.unsaved_comparison = None;
                self.reload_dataset();
            }
            Ok(_) => {}
            Err(e) => self.report(&e),
        }
    }

    pub fn train(&mut self) {
        self.notices.clear();
        self.training = None;
        self.unsaved_comparison = None;
        if self.dataset.is_none() {
            self.report(&WorkflowError::MissingDataset);
            return;
        }
        let Some(target) = self.target.clone() else {
            self.report(&WorkflowError::NoTarget);
            return;
        };
        match self.workflow.handle(Request::Train { target }) {
            Ok(Response::Trained(outcome)) => {
                self.notices.push(Notice::success("Best model saved successfully!"));
                self.training = Some(*outcome);
            }
            Ok(_) => {}
            Err(e) => {
                self.unsaved_comparison = e.comparison().cloned();
                self.report(&e);
            }
        }
    }

    pub fn predict(&mut self, path: PathBuf) {
        self.notices.retain(|n| n.severity == Severity::Success);
        self.inference = None;
        let request = Request::Predict {
            path,
            options: self.predict_options,
        };
        match self.workflow.handle(request) {
            Ok(Response::Predicted(outcome)) => {
                if outcome.dataset_changed {
                    self.notices.push(Notice::warning(
                        "The uploaded dataset changed since this model was trained.",
                    ));
                }
                self.inference = Some(*outcome);
            }
            Ok(_) => {}
            Err(e) => self.report(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionKey;

    fn state(dir: &std::path::Path) -> AppState {
        AppState::new(Workflow::open(dir, SessionKey::default()).unwrap())
    }

    #[test]
    fn test_train_without_dataset_asks_for_upload() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state(dir.path());
        state.train();
        assert_eq!(state.notices.len(), 1);
        assert_eq!(state.notices[0].text, WorkflowError::MissingDataset.to_string());
    }

    #[test]
    fn test_train_with_only_identifier_columns_asks_for_target() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state(dir.path());
        state
            .workflow
            .upload_reader("id,Unnamed: 0\n1,0\n2,1\n".as_bytes())
            .unwrap();
        state.reload_dataset();
        assert!(state.dataset.is_some());
        assert!(state.target.is_none());

        state.train();
        assert_eq!(state.notices.len(), 1);
        assert_eq!(state.notices[0].severity, Severity::Warning);
        assert_eq!(state.notices[0].text, WorkflowError::NoTarget.to_string());
        assert!(state.training.is_none());
    }
}
