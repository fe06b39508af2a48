use std::collections::BTreeMap;

use eframe::egui::Ui;
use egui_plot::{Legend, MarkerShape, Plot, PlotPoints, Points};

use crate::data::view::{EmptyReason, PlotView};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Scatter plot (central panel)
// ---------------------------------------------------------------------------

/// Render the measurement scatter plot, or one of the defined empty states.
pub fn measurement_plot(ui: &mut Ui, state: &AppState) {
    if state.loading {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Loading feeds…");
        });
        return;
    }

    let Some(table) = &state.table else {
        ui.centered_and_justified(|ui: &mut Ui| {
            match &state.status_message {
                Some(msg) => ui.heading(msg),
                None => ui.heading("No data loaded yet."),
            }
        });
        return;
    };

    let chart = match &state.view {
        Some(PlotView::Chart(chart)) => chart,
        Some(PlotView::Empty(EmptyReason::NoSelection)) => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("No amphora selected.");
            });
            return;
        }
        Some(PlotView::Empty(EmptyReason::NoData)) => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("No data for this combination.");
            });
            return;
        }
        None => return,
    };

    ui.heading(&chart.title);

    // One series per amphora so the legend lists amphora names.
    // Points missing either metric are skipped; a chart where every point
    // is skipped renders as an empty chart, distinct from the empty states.
    let mut series: BTreeMap<String, (String, Vec<[f64; 2]>)> = BTreeMap::new();
    for &idx in &chart.indices {
        let rec = &table.records[idx];
        let (Some(x), Some(y)) = (rec.value(&chart.x_metric), rec.value(&chart.y_metric)) else {
            continue;
        };
        series
            .entry(rec.name_key())
            .or_insert_with(|| (rec.amphora_name.clone(), Vec::new()))
            .1
            .push([x, y]);
    }

    Plot::new("measurement_plot")
        .legend(Legend::default())
        .x_axis_label(&chart.x_metric)
        .y_axis_label(&chart.y_metric)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (key, (name, coords)) in &series {
                let points: PlotPoints = coords.iter().copied().collect();
                plot_ui.points(
                    Points::new(points)
                        .name(name)
                        .color(state.color_map.color_for(key))
                        .shape(MarkerShape::Circle)
                        .radius(4.0),
                );
            }
        });
}
