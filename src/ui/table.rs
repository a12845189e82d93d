use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::ClassColors;
use crate::data::model::DataTable;

const ROW_HEIGHT: f32 = 18.0;

/// Render `table` as a striped grid. `highlight` colours one column's cells
/// by class.
pub fn data_table(
    ui: &mut Ui,
    id: &str,
    table: &DataTable,
    highlight: Option<(&str, &ClassColors)>,
) {
    let highlight = highlight.and_then(|(col, colors)| Some((table.column_index(col)?, colors)));

    ui.push_id(id, |ui: &mut Ui| {
        egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .max_scroll_height(320.0)
                .columns(Column::auto().at_least(60.0).clip(true), table.width())
                .header(ROW_HEIGHT + 2.0, |mut header| {
                    for name in table.columns() {
                        header.col(|ui: &mut Ui| {
                            ui.strong(name);
                        });
                    }
                })
                .body(|body| {
                    body.rows(ROW_HEIGHT, table.len(), |mut row| {
                        let cells = &table.rows()[row.index()];
                        for (c, cell) in cells.iter().enumerate() {
                            row.col(|ui: &mut Ui| {
                                let mut text = RichText::new(cell.to_string());
                                if let Some((col, colors)) = highlight {
                                    if col == c {
                                        text = text.color(colors.color_for(cell));
                                    }
                                }
                                ui.label(text);
                            });
                        }
                    });
                });
        });
    });
    ui.small(format!("{} rows × {} columns", table.len(), table.width()));
}
