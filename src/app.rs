use eframe::egui::{self, Ui};

use crate::state::AppState;
use crate::ui::{panels, views};
use crate::workflow::{Mode, Workflow};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct AutoMlApp {
    pub state: AppState,
}

impl AutoMlApp {
    pub fn new(workflow: Workflow) -> Self {
        Self {
            state: AppState::new(workflow),
        }
    }
}

impl eframe::App for AutoMlApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Bottom panel: footer ----
        egui::TopBottomPanel::bottom("footer").show(ctx, |ui: &mut Ui| {
            panels::footer(ui);
        });

        // ---- Left side panel: navigation ----
        egui::SidePanel::left("navigation")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui: &mut Ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: active mode ----
        egui::CentralPanel::default().show(ctx, |ui: &mut Ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    let state = &mut self.state;
                    match state.mode {
                        Mode::Upload => views::upload_view(ui, state),
                        Mode::Profiling => views::profiling_view(ui, state),
                        Mode::Modelling => views::modelling_view(ui, state),
                        Mode::Inference => views::inference_view(ui, state),
                        Mode::Download => views::download_view(ui, state),
                    }
                    ui.add_space(8.0);
                    panels::notices(ui, state);
                });
        });
    }
}
