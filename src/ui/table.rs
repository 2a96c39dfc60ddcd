use eframe::egui::{ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::state::AppState;

/// Render the filtered rows with every merged column.
pub fn event_table(ui: &mut Ui, state: &AppState) {
    let Some(view) = state.view() else {
        return;
    };
    ui.label(format!("Number of filtered rows: {}", view.len()));
    if view.is_empty() {
        ui.weak("No events match the current filters.");
        return;
    }

    let columns = view.columns();
    let records: Vec<_> = view.records().collect();

    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .columns(Column::auto().at_least(60.0), columns.len())
            .header(20.0, |mut header| {
                for col in columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(col);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, records.len(), |mut row| {
                    let rec = records[row.index()];
                    for value in &rec.values {
                        row.col(|ui: &mut Ui| {
                            ui.label(value.to_string());
                        });
                    }
                });
            });
    });
}
