use eframe::egui::{self, Color32, RichText, Ui};

use crate::config;
use crate::state::{AppState, Severity};
use crate::workflow::Mode;

// ---------------------------------------------------------------------------
// Left side panel – navigation
// ---------------------------------------------------------------------------

pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.add_space(8.0);
    ui.heading("AutoML Workbench");
    ui.label(
        RichText::new(format!("Session: {}", state.workflow.session().key()))
            .small()
            .weak(),
    );
    ui.separator();

    ui.strong("Navigation");
    for mode in Mode::ALL {
        if ui.radio(state.mode == mode, mode.to_string()).clicked() && state.mode != mode {
            state.set_mode(mode);
        }
    }
    ui.separator();

    match &state.dataset {
        Some(ds) => ui.label(format!("Dataset: {} rows × {} columns", ds.len(), ds.width())),
        None => ui.label("No dataset uploaded."),
    };
    if state.workflow.session().has_model() {
        ui.label("Trained model available.");
    }
}

// ---------------------------------------------------------------------------
// Notices and footer
// ---------------------------------------------------------------------------

pub fn notices(ui: &mut Ui, state: &AppState) {
    for notice in &state.notices {
        let color = match notice.severity {
            Severity::Success => Color32::from_rgb(80, 180, 90),
            Severity::Warning => Color32::from_rgb(220, 170, 40),
            Severity::Error => Color32::RED,
        };
        egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
            ui.label(RichText::new(&notice.text).color(color));
            if let Some(hint) = notice.hint {
                ui.label(RichText::new(hint).color(Color32::from_rgb(220, 170, 40)));
            }
        });
    }
}

pub fn footer(ui: &mut Ui) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.label(RichText::new(config::FOOTER).small().weak());
    });
}
