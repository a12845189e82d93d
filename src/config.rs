/// Application title shown in the window bar and the navigation panel.
pub const APP_TITLE: &str = "Rusty AutoML – Classification Workbench";

/// Directory (relative to the working directory) holding all sessions.
pub const WORKSPACE_DIR: &str = ".";
pub const SESSIONS_DIR: &str = "sessions";
pub const DEFAULT_SESSION: &str = "default";

/// File names inside a session directory
pub const DATASET_FILE: &str = "dataset.csv";
pub const MODEL_FILE: &str = "best_model.bin";
pub const PREDICTIONS_FILE: &str = "predictions.csv";

/// Columns treated as row identifiers and dropped before modelling.
pub const IDENTIFIER_COLUMNS: &[&str] = &["id", "Unnamed: 0"];

/// Model selection configuration
pub const SESSION_SEED: u64 = 123;
pub const TRAIN_SIZE: f64 = 0.7;
pub const CV_FOLDS: usize = 10;
pub const MULTICOLLINEARITY_THRESHOLD: f64 = 0.9;
pub const MAX_ONE_HOT_LEVELS: usize = 25;

/// Prediction output columns
pub const PREDICTION_LABEL_COLUMN: &str = "prediction_label";
pub const PREDICTION_SCORE_COLUMN: &str = "prediction_score";

/// Profiling configuration
pub const HISTOGRAM_BINS: usize = 20;
pub const TOP_VALUES: usize = 10;
pub const HIGH_CARDINALITY: usize = 50;
pub const HIGH_MISSING_SHARE: f64 = 0.2;
pub const HIGH_ZEROS_SHARE: f64 = 0.5;
pub const HIGH_CORRELATION: f64 = 0.9;

/// Rows shown in "head" previews.
pub const PREVIEW_ROWS: usize = 5;

/// Remediation hints shown next to failed actions
pub const TRAINING_HINT: &str = "Check that all feature columns are numeric or categorical, \
     and the target column is categorical.";
pub const INFERENCE_HINT: &str = "Check that your test data columns exactly match the training \
     dataset. Make sure all required features are present and named correctly.";

pub const FOOTER: &str = "This is a course project lab, only for demonstration purposes.";
