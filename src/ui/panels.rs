use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::filter::SubselectionMode;
use crate::data::model::{Label, Significance};
use crate::state::{AppState, LabelSource};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Options");
    ui.separator();

    if state.table.is_none() {
        ui.label("No data loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.strong("GraceDB object types");
            label_checkboxes(ui, state, LabelSource::Primary);
            ui.add_space(4.0);

            ui.strong("GWSkyNet-Multi object types");
            label_checkboxes(ui, state, LabelSource::Secondary);
            ui.separator();

            ui.strong("Significance levels");
            ui.horizontal(|ui: &mut Ui| {
                for sig in Significance::ALL {
                    let mut checked = state.criteria.significance.contains(&sig);
                    if ui.checkbox(&mut checked, sig.to_string()).changed() {
                        state.toggle_significance(sig);
                    }
                }
            });
            ui.separator();

            ui.strong("Detectors");
            let codes: Vec<char> = state.available_detectors.iter().collect();
            ui.horizontal(|ui: &mut Ui| {
                for code in codes {
                    let mut checked = state.criteria.detectors.contains(code);
                    if ui.checkbox(&mut checked, code.to_string()).changed() {
                        state.toggle_detector(code);
                    }
                }
            });

            let current = state.criteria.mode;
            egui::ComboBox::from_label("Subselection")
                .selected_text(current.to_string())
                .show_ui(ui, |ui: &mut Ui| {
                    for mode in SubselectionMode::ALL {
                        if ui
                            .selectable_label(current == mode, mode.to_string())
                            .clicked()
                        {
                            state.set_mode(mode);
                        }
                    }
                });
            ui.separator();

            ui.strong("Axes");
            let columns = state.numeric_columns.clone();
            axis_combo(ui, "X axis", &columns, &mut state.x_column);
            axis_combo(ui, "Y axis", &columns, &mut state.y_column);
        });
}

fn label_checkboxes(ui: &mut Ui, state: &mut AppState, source: LabelSource) {
    ui.horizontal(|ui: &mut Ui| {
        for label in Label::ALL {
            let selected = match source {
                LabelSource::Primary => &state.criteria.primary_labels,
                LabelSource::Secondary => &state.criteria.secondary_labels,
            };
            let mut checked = selected.contains(&label);
            if ui.checkbox(&mut checked, label.to_string()).changed() {
                state.toggle_label(source, label);
            }
        }
    });
}

fn axis_combo(ui: &mut Ui, label: &str, columns: &[String], current: &mut Option<String>) {
    egui::ComboBox::from_label(label)
        .selected_text(current.as_deref().unwrap_or("–"))
        .show_ui(ui, |ui: &mut Ui| {
            for col in columns {
                let is_current = current.as_deref() == Some(col.as_str());
                if ui.selectable_label(is_current, col).clicked() {
                    *current = Some(col.clone());
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open GraceDB table…").clicked() {
                if let Some(path) = pick_source("Open GraceDB table") {
                    state.set_source_a(path);
                }
                ui.close_menu();
            }
            if ui.button("Open GWSkyNet table…").clicked() {
                if let Some(path) = pick_source("Open GWSkyNet table") {
                    state.set_source_b(path);
                }
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = &state.table {
            ui.label(format!(
                "{} events loaded, {} matching",
                table.len(),
                state.visible_indices.len()
            ));
        } else {
            ui.label(format!(
                "GraceDB: {}   GWSkyNet: {}",
                source_name(&state.source_a),
                source_name(&state.source_b)
            ));
        }

        if let Some(msg) = &state.warning {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::YELLOW));
        }
        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

fn source_name(path: &Option<std::path::PathBuf>) -> String {
    path.as_ref()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "not selected".to_string())
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

fn pick_source(title: &str) -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file()
}
