use eframe::egui::{self, Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, Plot};

use crate::color::correlation_color;
use crate::profiling::{Correlations, Histogram};

// ---------------------------------------------------------------------------
// Histogram of one numeric variable
// ---------------------------------------------------------------------------

pub fn histogram(ui: &mut Ui, id: &str, name: &str, hist: &Histogram) {
    let width = hist.bin_width();
    let bars: Vec<Bar> = hist
        .centers()
        .into_iter()
        .zip(&hist.counts)
        .map(|(x, &n)| Bar::new(x, n as f64).width(width * 0.95))
        .collect();

    let chart = BarChart::new(bars)
        .name(name)
        .color(Color32::LIGHT_BLUE);

    Plot::new(id)
        .height(140.0)
        .x_axis_label(name)
        .y_axis_label("Count")
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(chart);
        });
}

// ---------------------------------------------------------------------------
// Correlation matrix as a coloured grid
// ---------------------------------------------------------------------------

pub fn correlation_grid(ui: &mut Ui, correlations: &Correlations) {
    if correlations.columns.len() < 2 {
        ui.label("Fewer than two numeric columns.");
        return;
    }
    egui::ScrollArea::horizontal()
        .id_salt("correlations")
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new("correlation_grid")
                .spacing([2.0, 2.0])
                .show(ui, |ui: &mut Ui| {
                    ui.label("");
                    for name in &correlations.columns {
                        ui.strong(name);
                    }
                    ui.end_row();

                    for (name, row) in correlations.columns.iter().zip(&correlations.matrix) {
                        ui.strong(name);
                        for &r in row {
                            let text = r.map_or_else(|| "–".to_string(), |r| format!("{r:.2}"));
                            ui.label(
                                RichText::new(text)
                                    .monospace()
                                    .color(Color32::WHITE)
                                    .background_color(correlation_color(r)),
                            );
                        }
                        ui.end_row();
                    }
                });
        });
}
