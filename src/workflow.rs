//! The five user actions, independent of rendering.
//!
//! Every operation is scoped to one [`Session`] and returns a typed
//! [`WorkflowError`]; the UI only ever calls [`Workflow::handle`] or the
//! methods behind it.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::automl::{
    AutoMlEngine, BuiltinAutoMl, ComparisonTable, PredictOptions, Scores, SetupConfig,
    SetupSummary,
};
use crate::config;
use crate::data::loader::{load_file, read_csv};
use crate::data::model::DataTable;
use crate::data::store::Fingerprint;
use crate::data::writer::save_csv;
use crate::error::WorkflowError;
use crate::profiling::{DescriptiveProfiler, ProfileReport, Profiler};
use crate::session::{Session, SessionKey};

pub type Result<T> = std::result::Result<T, WorkflowError>;

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    #[default]
    Upload,
    Profiling,
    Modelling,
    Inference,
    Download,
}

impl Mode {
    pub const ALL: [Mode; 5] = [
        Mode::Upload,
        Mode::Profiling,
        Mode::Modelling,
        Mode::Inference,
        Mode::Download,
    ];
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Upload => "Upload",
            Mode::Profiling => "Profiling",
            Mode::Modelling => "Modelling",
            Mode::Inference => "Inference",
            Mode::Download => "Download",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub summary: SetupSummary,
    pub comparison: ComparisonTable,
    /// Best model scored on the held-out split.
    pub holdout: Scores,
    pub best_model: String,
    pub model_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct InferenceOutcome {
    /// Test data after column cleanup.
    pub input: DataTable,
    pub predictions: DataTable,
    pub scores: Option<Scores>,
    pub predictions_path: PathBuf,
    /// The stored dataset changed since the model was trained.
    pub dataset_changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelExport {
    pub file_name: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub target: String,
    pub features: Vec<String>,
    pub estimator: String,
    pub cv_scores: Scores,
    pub dataset: Option<Fingerprint>,
    pub trained_at_unix: u64,
}

impl ModelInfo {
    /// Coarse age of the model relative to `now_unix`, e.g. `5 min ago`.
    pub fn trained_ago(&self, now_unix: u64) -> String {
        let secs = now_unix.saturating_sub(self.trained_at_unix);
        match secs {
            0..=59 => format!("{secs} s ago"),
            60..=3599 => format!("{} min ago", secs / 60),
            3600..=86_399 => format!("{} h ago", secs / 3600),
            _ => format!("{} days ago", secs / 86_400),
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Request {
    Upload(PathBuf),
    Profile,
    Targets,
    Train { target: String },
    Predict { path: PathBuf, options: PredictOptions },
    ExportModel,
    ModelInfo,
}

#[derive(Debug, Clone)]
pub enum Response {
    Uploaded(DataTable),
    Profile(Box<ProfileReport>),
    Targets(Vec<String>),
    Trained(Box<TrainingOutcome>),
    Predicted(Box<InferenceOutcome>),
    Model(ModelExport),
    ModelInfo(Option<Box<ModelInfo>>),
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

pub struct Workflow<E = BuiltinAutoMl, P = DescriptiveProfiler> {
    session: Session,
    engine: E,
    profiler: P,
    setup: SetupConfig,
}

impl Workflow {
    /// Open `<workspace>/sessions/<key>` with the built-in engine and profiler.
    pub fn open(workspace: &Path, key: SessionKey) -> Result<Self> {
        let session = Session::open(workspace, key).map_err(WorkflowError::storage)?;
        Ok(Workflow::with_components(
            session,
            BuiltinAutoMl::new(),
            DescriptiveProfiler::default(),
        ))
    }
}

impl<E: AutoMlEngine, P: Profiler> Workflow<E, P> {
    pub fn with_components(session: Session, engine: E, profiler: P) -> Self {
        Self {
            session,
            engine,
            profiler,
            setup: SetupConfig::default(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Dispatch one UI request.
    pub fn handle(&self, request: Request) -> Result<Response> {
        let result = match request {
            Request::Upload(path) => self.upload_path(&path).map(Response::Uploaded),
            Request::Profile => self.profile().map(|r| Response::Profile(Box::new(r))),
            Request::Targets => self.target_columns().map(Response::Targets),
            Request::Train { target } => self.train(&target).map(|o| Response::Trained(Box::new(o))),
            Request::Predict { path, options } => self
                .predict_path(&path, &options)
                .map(|o| Response::Predicted(Box::new(o))),
            Request::ExportModel => self.export_model().map(Response::Model),
            Request::ModelInfo => self
                .model_info()
                .map(|info| Response::ModelInfo(info.map(Box::new))),
        };
        if let Err(e) = &result {
            if e.is_warning() {
                log::warn!("{e}");
            } else {
                log::error!("{e:#}");
            }
        }
        result
    }

    // ---- Upload ----

    /// Parse a csv, json or parquet file and make it the session dataset.
    pub fn upload_path(&self, path: &Path) -> Result<DataTable> {
        let table = load_file(path).map_err(WorkflowError::parse)?;
        self.store_upload(table, &path.display().to_string())
    }

    /// Parse delimited text from any stream and make it the session dataset.
    pub fn upload_reader<R: Read>(&self, reader: R) -> Result<DataTable> {
        let table = read_csv(reader).map_err(WorkflowError::parse)?;
        self.store_upload(table, "stream")
    }

    fn store_upload(&self, table: DataTable, source: &str) -> Result<DataTable> {
        let fingerprint = self
            .session
            .dataset_store()
            .save(&table)
            .map_err(WorkflowError::storage)?;
        log::info!(
            "Uploaded {} rows x {} columns from {source} (dataset {})",
            table.len(),
            table.width(),
            fingerprint.short()
        );
        Ok(table)
    }

    /// The stored dataset, if one was uploaded.
    pub fn current_dataset(&self) -> Result<Option<DataTable>> {
        self.session
            .dataset_store()
            .load()
            .map_err(WorkflowError::parse)
    }

    fn require_dataset(&self) -> Result<DataTable> {
        self.current_dataset()?.ok_or(WorkflowError::MissingDataset)
    }

    // ---- Profiling ----

    pub fn profile(&self) -> Result<ProfileReport> {
        let data = self.require_dataset()?;
        Ok(self.profiler.profile(&data))
    }

    // ---- Modelling ----

    /// The dataset without identifier columns.
    pub fn modelling_table(&self) -> Result<DataTable> {
        Ok(self.require_dataset()?.drop_columns(config::IDENTIFIER_COLUMNS))
    }

    /// Columns that can be chosen as target.
    pub fn target_columns(&self) -> Result<Vec<String>> {
        Ok(self.modelling_table()?.columns().to_vec())
    }

    /// Compare every candidate on the stored dataset and persist the best.
    pub fn train(&self, target: &str) -> Result<TrainingOutcome> {
        let data = self.modelling_table()?;
        if !data.has_column(target) {
            return Err(WorkflowError::UnknownTarget(target.to_string()));
        }
        log::info!(
            "Comparing models for target '{target}' on {} rows",
            data.len()
        );

        let mut experiment = self
            .engine
            .compare_models(&data, target, &self.setup)
            .map_err(WorkflowError::Training)?;
        experiment.model.dataset = self
            .session
            .dataset_store()
            .fingerprint()
            .map_err(WorkflowError::storage)?;

        let model_path = self.session.model_path();
        if let Err(e) = self.engine.save_model(&experiment.model, &model_path) {
            return Err(WorkflowError::Persistence {
                comparison: Box::new(experiment.comparison),
                message: e.to_string(),
            });
        }
        let best_model = experiment.model.estimator.describe();
        log::info!("Saved {best_model} to {}", model_path.display());

        Ok(TrainingOutcome {
            summary: experiment.summary,
            comparison: experiment.comparison,
            holdout: experiment.holdout,
            best_model,
            model_path,
        })
    }

    // ---- Inference ----

    pub fn predict_path(&self, path: &Path, options: &PredictOptions) -> Result<InferenceOutcome> {
        if !self.session.has_model() {
            return Err(WorkflowError::MissingModel);
        }
        let table = load_file(path).map_err(WorkflowError::parse)?;
        self.predict_table(table, options)
    }

    /// Predict on an already parsed test table and persist the result.
    pub fn predict_table(&self, mut table: DataTable, options: &PredictOptions) -> Result<InferenceOutcome> {
        if !self.session.has_model() {
            return Err(WorkflowError::MissingModel);
        }
        let model = self
            .engine
            .load_model(&self.session.model_path())
            .map_err(WorkflowError::Inference)?;

        table.trim_column_names().map_err(WorkflowError::parse)?;
        let input = table.drop_columns(config::IDENTIFIER_COLUMNS);

        let predictions = self
            .engine
            .predict(&model, &input, options)
            .map_err(WorkflowError::Inference)?;

        let predictions_path = self.session.predictions_path();
        save_csv(&predictions.table, &predictions_path).map_err(WorkflowError::storage)?;
        log::info!(
            "Wrote {} predictions to {}",
            predictions.table.len(),
            predictions_path.display()
        );

        let current = self
            .session
            .dataset_store()
            .fingerprint()
            .map_err(WorkflowError::storage)?;
        let dataset_changed = matches!((&model.dataset, &current), (Some(a), Some(b)) if a != b);
        if dataset_changed {
            log::warn!("The dataset changed since the model was trained");
        }

        Ok(InferenceOutcome {
            input,
            predictions: predictions.table,
            scores: predictions.scores,
            predictions_path,
            dataset_changed,
        })
    }

    // ---- Download ----

    pub fn export_model(&self) -> Result<ModelExport> {
        if !self.session.has_model() {
            return Err(WorkflowError::MissingModel);
        }
        let path = self.session.model_path();
        let bytes = std::fs::read(&path)
            .map_err(|e| WorkflowError::Storage(format!("reading {}: {e}", path.display())))?;
        Ok(ModelExport {
            file_name: config::MODEL_FILE,
            bytes,
        })
    }

    /// Summary of the persisted model, if any.
    pub fn model_info(&self) -> Result<Option<ModelInfo>> {
        if !self.session.has_model() {
            return Ok(None);
        }
        let model = self
            .engine
            .load_model(&self.session.model_path())
            .map_err(|e| WorkflowError::Storage(e.to_string()))?;
        Ok(Some(ModelInfo {
            target: model.target.clone(),
            features: model.feature_columns(),
            estimator: model.estimator.describe(),
            cv_scores: model.cv_scores,
            dataset: model.dataset,
            trained_at_unix: model.trained_at_unix,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;

    fn workflow(dir: &Path) -> Workflow {
        Workflow::open(dir, SessionKey::default()).unwrap()
    }

    #[test]
    fn test_preconditions_without_upload() {
        let dir = tempfile::tempdir().unwrap();
        let wf = workflow(dir.path());
        assert!(matches!(wf.profile(), Err(WorkflowError::MissingDataset)));
        assert!(matches!(wf.train("y"), Err(WorkflowError::MissingDataset)));
        assert!(matches!(wf.export_model(), Err(WorkflowError::MissingModel)));
        assert!(wf.model_info().unwrap().is_none());
    }

    #[test]
    fn test_targets_exclude_identifiers() {
        let dir = tempfile::tempdir().unwrap();
        let wf = workflow(dir.path());
        let csv = "id,Unnamed: 0,a,y\n1,0,0.5,no\n2,1,1.5,yes\n";
        wf.upload_reader(csv.as_bytes()).unwrap();
        assert_eq!(wf.target_columns().unwrap(), vec!["a".to_string(), "y".to_string()]);
        assert!(matches!(wf.train("id"), Err(WorkflowError::UnknownTarget(_))));
    }

    #[test]
    fn test_parse_error_is_typed() {
        let dir = tempfile::tempdir().unwrap();
        let wf = workflow(dir.path());
        let err = wf.upload_reader("a,b\n1,2,3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, WorkflowError::Parse(_)));
        assert!(wf.current_dataset().unwrap().is_none());
    }

    #[test]
    fn test_handle_dispatches() {
        let dir = tempfile::tempdir().unwrap();
        let wf = workflow(dir.path());
        wf.upload_reader("x,y\n1,a\n2,b\n".as_bytes()).unwrap();
        match wf.handle(Request::Profile).unwrap() {
            Response::Profile(report) => assert_eq!(report.overview.rows, 2),
            other => panic!("unexpected response {other:?}"),
        }
        let stored = wf.current_dataset().unwrap().unwrap();
        assert_eq!(stored.rows()[0][1], CellValue::String("a".into()));
    }

    #[test]
    fn test_mode_order() {
        let labels: Vec<String> = Mode::ALL.iter().map(|m| m.to_string()).collect();
        assert_eq!(labels, ["Upload", "Profiling", "Modelling", "Inference", "Download"]);
    }

    #[test]
    fn test_model_info_reports_cv_scores_and_age() {
        let dir = tempfile::tempdir().unwrap();
        let wf = workflow(dir.path());
        let mut csv = String::from("a,b,y\n");
        for i in 0..30 {
            let class = i % 2;
            csv.push_str(&format!("{},{},{}\n", i + class * 40, (i * 3) % 7, class));
        }
        wf.upload_reader(csv.as_bytes()).unwrap();
        wf.train("y").unwrap();

        let info = wf.model_info().unwrap().expect("model saved");
        assert!(info.cv_scores.accuracy > 0.5);
        assert!(info.trained_at_unix > 0);
        assert_eq!(info.trained_ago(info.trained_at_unix + 42), "42 s ago");
        assert_eq!(info.trained_ago(info.trained_at_unix + 3 * 3600), "3 h ago");
        assert_eq!(info.trained_ago(0), "0 s ago");
    }
}
