use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use eframe::egui::{self, RichText, Ui};

use crate::automl::Scores;
use crate::color::ClassColors;
use crate::config;
use crate::data::writer::to_csv_bytes;
use crate::error::WorkflowError;
use crate::profiling::{ProfileReport, VariableProfile};
use crate::state::{AppState, Notice};
use crate::ui::{plot, table::data_table};
use crate::workflow::ModelInfo;

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn pick_table_file(title: &str) -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Supported files", &["csv", "txt", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv", "txt"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file()
}

/// Ask for a destination and write `bytes` there.
fn save_dialog(state: &mut AppState, file_name: &str, bytes: &[u8]) {
    let Some(path) = rfd::FileDialog::new().set_file_name(file_name).save_file() else {
        return;
    };
    match write_file(&path, bytes) {
        Ok(()) => {
            log::info!("Saved {}", path.display());
            state.notices.push(Notice::success(format!("Saved {}", path.display())));
        }
        Err(e) => {
            log::error!("{e}");
            state.notices.push(Notice::from(&e));
        }
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), WorkflowError> {
    std::fs::write(path, bytes)
        .map_err(|e| WorkflowError::Storage(format!("writing {}: {e}", path.display())))
}

fn scores_grid(ui: &mut Ui, id: &str, scores: &Scores) {
    let auc = scores.auc.map_or_else(|| "–".to_string(), |a| format!("{a:.4}"));
    egui::Grid::new(id).striped(true).show(ui, |ui: &mut Ui| {
        for (name, value) in [
            ("Accuracy", format!("{:.4}", scores.accuracy)),
            ("AUC", auc),
            ("Recall", format!("{:.4}", scores.recall)),
            ("Prec.", format!("{:.4}", scores.precision)),
            ("F1", format!("{:.4}", scores.f1)),
            ("Kappa", format!("{:.4}", scores.kappa)),
            ("MCC", format!("{:.4}", scores.mcc)),
        ] {
            ui.strong(name);
            ui.label(value);
            ui.end_row();
        }
    });
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

/// Estimator, target, features, age and cross-validated scores of the saved model.
fn model_details(ui: &mut Ui, id: &str, info: &ModelInfo) {
    ui.label(format!("Model: {}", info.estimator));
    ui.label(format!("Target: {}   Features: {}", info.target, info.features.join(", ")));
    ui.label(format!("Trained {}", info.trained_ago(now_unix())));
    egui::CollapsingHeader::new("Cross-validation scores")
        .id_salt(id)
        .default_open(false)
        .show(ui, |ui: &mut Ui| scores_grid(ui, &format!("{id}_grid"), &info.cv_scores));
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

pub fn upload_view(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Upload Your Dataset");
    if ui.button("Upload training dataset…").clicked() {
        if let Some(path) = pick_table_file("Upload training dataset") {
            state.upload(path);
        }
    }
    ui.add_space(8.0);
    if let Some(ds) = &state.dataset {
        data_table(ui, "dataset", ds, None);
    }
}

// ---------------------------------------------------------------------------
// Profiling
// ---------------------------------------------------------------------------

fn variable_section(ui: &mut Ui, var: &VariableProfile) {
    let header = format!("{}  ({})", var.name, var.kind);
    egui::CollapsingHeader::new(RichText::new(header).strong())
        .id_salt(&var.name)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new(format!("stats_{}", var.name))
                .striped(true)
                .show(ui, |ui: &mut Ui| {
                    let mut row = |k: &str, v: String| {
                        ui.strong(k);
                        ui.label(v);
                        ui.end_row();
                    };
                    row("Count", var.count.to_string());
                    row("Missing", format!("{} ({:.1}%)", var.missing, var.missing_share * 100.0));
                    row("Distinct", var.distinct.to_string());
                    if let Some(num) = &var.numeric {
                        row("Mean", format!("{:.4}", num.mean));
                        row("Std", format!("{:.4}", num.std));
                        row("Min", format!("{}", num.min));
                        row("25%", format!("{:.4}", num.q1));
                        row("50%", format!("{:.4}", num.median));
                        row("75%", format!("{:.4}", num.q3));
                        row("Max", format!("{}", num.max));
                        row("Zeros", num.zeros.to_string());
                    }
                });
            if let Some(num) = &var.numeric {
                plot::histogram(ui, &format!("hist_{}", var.name), &var.name, &num.histogram);
            } else if !var.top_values.is_empty() {
                ui.label(RichText::new("Most frequent values").italics());
                egui::Grid::new(format!("top_{}", var.name)).show(ui, |ui: &mut Ui| {
                    for (value, n) in &var.top_values {
                        ui.label(value);
                        ui.label(n.to_string());
                        ui.end_row();
                    }
                });
            }
        });
}

fn profile_report(ui: &mut Ui, report: &ProfileReport) {
    let o = &report.overview;
    ui.heading("Overview");
    egui::Grid::new("overview").striped(true).show(ui, |ui: &mut Ui| {
        for (k, v) in [
            ("Number of variables", o.columns.to_string()),
            ("Number of observations", o.rows.to_string()),
            ("Missing cells", format!("{} ({:.1}%)", o.missing_cells, o.missing_share * 100.0)),
            ("Duplicate rows", o.duplicate_rows.to_string()),
            ("Numeric", o.numeric.to_string()),
            ("Boolean", o.boolean.to_string()),
            ("Categorical", o.categorical.to_string()),
            ("Empty", o.empty.to_string()),
        ] {
            ui.strong(k);
            ui.label(v);
            ui.end_row();
        }
    });

    if !report.alerts.is_empty() {
        ui.add_space(8.0);
        ui.heading(format!("Alerts ({})", report.alerts.len()));
        for alert in &report.alerts {
            ui.label(alert.to_string());
        }
    }

    ui.add_space(8.0);
    ui.heading("Variables");
    for var in &report.variables {
        variable_section(ui, var);
    }

    ui.add_space(8.0);
    ui.heading("Correlations");
    plot::correlation_grid(ui, &report.correlations);

    ui.add_space(8.0);
    ui.heading("Missing values");
    egui::Grid::new("missing").striped(true).show(ui, |ui: &mut Ui| {
        for (name, n, share) in report.missing_summary() {
            ui.label(name);
            ui.label(format!("{n} ({:.1}%)", share * 100.0));
            ui.end_row();
        }
    });
}

pub fn profiling_view(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Exploratory Data Analysis");
    let Some(report) = &state.profile else {
        return;
    };
    let mut export = None;
    if ui.button("Save report as JSON…").clicked() {
        match report.to_json() {
            Ok(json) => export = Some(json),
            Err(e) => state
                .notices
                .push(Notice::from(&WorkflowError::Storage(e.to_string()))),
        }
    }
    if let Some(report) = &state.profile {
        profile_report(ui, report);
    }
    if let Some(json) = export {
        save_dialog(state, "profile.json", json.as_bytes());
    }
}

// ---------------------------------------------------------------------------
// Modelling
// ---------------------------------------------------------------------------

pub fn modelling_view(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Modelling");
    if state.dataset.is_none() {
        return;
    }

    let current = state.target.clone().unwrap_or_default();
    egui::ComboBox::from_label("Choose the Target Column")
        .selected_text(&current)
        .show_ui(ui, |ui: &mut Ui| {
            for col in &state.targets {
                if ui.selectable_label(current == *col, col).clicked() {
                    state.target = Some(col.clone());
                }
            }
        });

    if ui.button("Run Modelling").clicked() {
        state.train();
    }
    ui.add_space(8.0);

    if let Some(outcome) = &state.training {
        ui.heading("Setup");
        match outcome.summary.to_table() {
            Ok(t) => data_table(ui, "setup", &t, None),
            Err(e) => {
                ui.label(format!("{e:#}"));
            }
        }
        ui.add_space(8.0);
        ui.heading("Model Comparison");
        match outcome.comparison.to_table() {
            Ok(t) => data_table(ui, "comparison", &t, None),
            Err(e) => {
                ui.label(format!("{e:#}"));
            }
        }
        ui.add_space(8.0);
        ui.label(format!("Best model: {}", outcome.best_model));
        ui.strong("Hold-out scores");
        scores_grid(ui, "holdout", &outcome.holdout);
    } else if let Some(comparison) = &state.unsaved_comparison {
        ui.heading("Model Comparison");
        if let Ok(t) = comparison.to_table() {
            data_table(ui, "comparison", &t, None);
        }
    }
}

// ---------------------------------------------------------------------------
// Inference
// ---------------------------------------------------------------------------

pub fn inference_view(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Batch Prediction (Inference)");
    let Some(info) = &state.model_info else {
        return;
    };
    model_details(ui, "inference_model", info);
    ui.checkbox(
        &mut state.predict_options.include_score,
        format!("Add '{}' column", config::PREDICTION_SCORE_COLUMN),
    );

    if ui.button("Upload test data for prediction…").clicked() {
        if let Some(path) = pick_table_file("Upload test data") {
            state.predict(path);
        }
    }

    let Some(outcome) = &state.inference else {
        return;
    };
    ui.add_space(8.0);
    ui.heading("Input Data");
    data_table(ui, "input", &outcome.input.head(config::PREVIEW_ROWS), None);

    ui.add_space(8.0);
    ui.heading("Predictions");
    let colors = outcome
        .predictions
        .column_index(config::PREDICTION_LABEL_COLUMN)
        .map(|idx| ClassColors::new(&outcome.predictions.unique_values(idx)));
    data_table(
        ui,
        "predictions",
        &outcome.predictions.head(config::PREVIEW_ROWS),
        colors.as_ref().map(|c| (config::PREDICTION_LABEL_COLUMN, c)),
    );
    if let Some(scores) = &outcome.scores {
        ui.strong("Scores against the target column");
        scores_grid(ui, "inference_scores", scores);
    }

    let download = ui.button("Download Predictions…").clicked();
    if download {
        match to_csv_bytes(&outcome.predictions) {
            Ok(bytes) => save_dialog(state, config::PREDICTIONS_FILE, &bytes),
            Err(e) => state.notices.push(Notice::from(&WorkflowError::storage(e))),
        }
    }
}

// ---------------------------------------------------------------------------
// Download
// ---------------------------------------------------------------------------

pub fn download_view(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Download Model");
    let Some(info) = &state.model_info else {
        return;
    };
    model_details(ui, "download_model", info);
    ui.add_space(8.0);
    if ui.button("Download Model").clicked() {
        match state.workflow.export_model() {
            Ok(export) => save_dialog(state, export.file_name, &export.bytes),
            Err(e) => state.notices.push(Notice::from(&e)),
        }
    }
}
