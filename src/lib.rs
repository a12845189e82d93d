//! Guided classification workbench: upload a dataset, profile it, compare
//! candidate models, run batch inference and download the best model.

pub mod app;
pub mod automl;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod profiling;
pub mod session;
pub mod state;
pub mod ui;
pub mod workflow;

pub use error::{ErrorKind, WorkflowError};
pub use workflow::{Mode, Request, Response, Workflow};
