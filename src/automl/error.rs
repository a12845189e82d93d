use thiserror::Error;

/// Errors returned by the model-selection engine.
#[derive(Debug, Error)]
pub enum AutoMlError {
    #[error("target column '{0}' not found")]
    MissingTarget(String),

    #[error("target column '{column}' is not categorical: {reason}")]
    TargetNotCategorical { column: String, reason: String },

    #[error("target column '{0}' has a single class; at least two are required")]
    SingleClass(String),

    #[error("class '{class}' has only {count} training rows; stratified cross-validation needs at least 2")]
    ClassTooSmall { class: String, count: usize },

    #[error("need at least {required} rows, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("no feature columns left after preprocessing")]
    NoFeatures,

    #[error("missing feature columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("column '{column}' holds non-numeric value '{value}'")]
    NonNumeric { column: String, value: String },

    #[error("output column '{0}' already exists in the input")]
    OutputColumnExists(String),

    #[error("{model} failed to fit: {reason}")]
    Fit { model: String, reason: String },

    #[error("every candidate model failed to fit")]
    NoCandidates,

    #[error("model artifact I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("model artifact encoding: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("unsupported model artifact version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}
