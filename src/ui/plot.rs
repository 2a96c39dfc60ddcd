use std::collections::BTreeMap;

use eframe::egui::Ui;
use egui_plot::{Legend, MarkerShape, Plot, PlotPoints, Points};

use crate::color::agreement_color;
use crate::data::model::Label;
use crate::state::AppState;
use crate::style::{Marker, MarkerStyle, marker_style};

// ---------------------------------------------------------------------------
// Event scatter plot (central panel)
// ---------------------------------------------------------------------------

/// Render the filtered events as a scatter of the selected X/Y columns.
pub fn scatter_plot(ui: &mut Ui, state: &AppState) {
    let Some(view) = state.view() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open both tables to view events  (File → Open…)");
        });
        return;
    };
    let (Some(x_col), Some(y_col)) = (state.x_column.as_deref(), state.y_column.as_deref()) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No numeric columns to plot");
        });
        return;
    };

    let table = view.table();
    let (Some(x_idx), Some(y_idx)) = (table.column_index(x_col), table.column_index(y_col)) else {
        return;
    };

    // One series per (style, label) so the legend stays readable.
    let mut series: BTreeMap<(MarkerStyle, Label), Vec<[f64; 2]>> = BTreeMap::new();
    for rec in view.records() {
        let x = rec.values.get(x_idx).and_then(|v| v.as_f64());
        let y = rec.values.get(y_idx).and_then(|v| v.as_f64());
        if let (Some(x), Some(y)) = (x, y) {
            series
                .entry((marker_style(rec), rec.primary_label))
                .or_default()
                .push([x, y]);
        }
    }

    Plot::new("event_scatter")
        .legend(Legend::default())
        .x_axis_label(x_col)
        .y_axis_label(y_col)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for ((style, label), points) in series {
                let points = Points::new(PlotPoints::from(points))
                    .name(series_name(&style, label))
                    .shape(marker_shape(style.marker))
                    .radius(style.radius())
                    .color(agreement_color(style.highlighted))
                    .filled(true);
                plot_ui.points(points);
            }
        });
}

fn marker_shape(marker: Marker) -> MarkerShape {
    match marker {
        Marker::Cross => MarkerShape::Cross,
        Marker::Circle => MarkerShape::Circle,
        Marker::Square => MarkerShape::Square,
    }
}

fn series_name(style: &MarkerStyle, label: Label) -> String {
    let significance = if style.significant { "significant" } else { "not significant" };
    let agreement = if style.highlighted { "labels agree" } else { "labels differ" };
    format!("{label}, {significance}, {agreement}")
}
