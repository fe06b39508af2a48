use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::feed::{self, FeedFormat};
use crate::data::view::{self, MassType, TestFilter};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filters, axes, ranking
// ---------------------------------------------------------------------------

/// Render the left selection panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Selection");
    ui.separator();

    if state.table.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            test_filter_section(ui, state);
            ui.separator();
            mass_type_section(ui, state);
            ui.separator();
            axes_section(ui, state);
            ui.separator();
            amphora_section(ui, state);
            ui.separator();
            ranking_section(ui, state);
        });

    // Recompute the plot view after any widget change above.
    state.refresh_view();
}

fn test_filter_section(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Test type");
    for filter in TestFilter::ALL {
        ui.radio_value(&mut state.selection.test_filter, filter, filter.label());
    }
}

fn mass_type_section(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Mass type");
    ui.horizontal(|ui: &mut Ui| {
        for mass in MassType::ALL {
            ui.radio_value(&mut state.selection.mass_type, mass, mass.label());
        }
    });
}

fn axes_section(ui: &mut Ui, state: &mut AppState) {
    let Some(table) = &state.table else { return };
    let metrics = table.metric_names.clone();

    ui.strong("Axes");
    for (label, salt, current) in [
        ("x", "x_axis", &mut state.selection.x_axis),
        ("y", "y_axis", &mut state.selection.y_axis),
    ] {
        ui.horizontal(|ui: &mut Ui| {
            ui.label(label);
            egui::ComboBox::from_id_salt(salt)
                .selected_text(current.clone())
                .show_ui(ui, |ui: &mut Ui| {
                    for metric in &metrics {
                        ui.selectable_value(current, metric.clone(), metric);
                    }
                });
        });
    }
}

fn amphora_section(ui: &mut Ui, state: &mut AppState) {
    let names = state.available_amphorae();
    let n_checked = names.iter().filter(|n| state.selection.is_checked(n)).count();

    ui.strong(format!("Amphorae  ({n_checked}/{})", names.len()));
    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            state.check_all();
        }
        if ui.small_button("None").clicked() {
            state.check_none();
        }
    });

    for name in &names {
        let mut checked = state.selection.is_checked(name);
        let text = RichText::new(name).color(state.color_map.color_for(name));
        if ui.checkbox(&mut checked, text).changed() {
            state.selection.toggle(name);
        }
    }
}

fn ranking_section(ui: &mut Ui, state: &mut AppState) {
    let Some(table) = &state.table else { return };

    ui.strong("Ranking");
    let names = state.available_amphorae();
    if names.is_empty() {
        ui.label("No amphorae for this test type.");
        return;
    }

    let current = state
        .rank_amphora
        .clone()
        .unwrap_or_else(|| names[0].clone());
    egui::ComboBox::from_id_salt("rank_amphora")
        .selected_text(current.clone())
        .show_ui(ui, |ui: &mut Ui| {
            for name in &names {
                if ui.selectable_label(current == *name, name).clicked() {
                    state.rank_amphora = Some(name.clone());
                }
            }
        });

    let metric = view::resolve_metric(&state.selection.y_axis, state.selection.mass_type);
    match view::rank(table, &current, state.selection.test_filter, &metric) {
        Some(result) => {
            ui.label(format!(
                "{current} is #{} out of {} for {} by mean {} (lower = better).",
                result.rank,
                result.of,
                state.selection.test_filter.label(),
                metric,
            ));
        }
        None => {
            ui.label(format!("No {metric} data for {current}."));
        }
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open CSV…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload feeds").clicked() {
                state.start_feed_fetch(feed::default_feeds());
                ui.close_menu();
            }
        });

        ui.separator();

        if state.loading {
            ui.label("Fetching feeds…");
        } else if let Some(table) = &state.table {
            let plotted = match &state.view {
                Some(view::PlotView::Chart(chart)) => chart.indices.len(),
                _ => 0,
            };
            ui.label(format!("{} records loaded, {plotted} plotted", table.len()));
        }

        ui.separator();

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

/// Load one or more local sheet exports through the same parse path the
/// remote feeds use, replacing the current table.
pub fn open_file_dialog(state: &mut AppState) {
    let Some(paths) = rfd::FileDialog::new()
        .set_title("Open sheet exports")
        .add_filter("CSV", &["csv"])
        .pick_files()
    else {
        return;
    };

    let outcomes = paths
        .iter()
        .map(|path| {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("local")
                .to_string();
            let outcome = std::fs::read_to_string(path)
                .map_err(|e| feed::FeedError::Unavailable(e.to_string()))
                .and_then(|body| feed::parse_body(&name, &body, FeedFormat::Csv));
            (name, outcome)
        })
        .collect();

    state.ingest_feeds(outcomes);
}
