use eframe::egui;

use crate::data::feed;
use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct AmphoraBenchApp {
    pub state: AppState,
}

impl AmphoraBenchApp {
    /// Build the app and start the first feed cycle immediately.
    pub fn new() -> Self {
        let mut state = AppState::default();
        state.start_feed_fetch(feed::default_feeds());
        Self { state }
    }
}

impl Default for AmphoraBenchApp {
    fn default() -> Self {
        Self::new()
    }
}

impl eframe::App for AmphoraBenchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll_feeds();
        if self.state.loading {
            // Keep polling while the fetch threads run.
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: selection ----
        egui::SidePanel::left("selection_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::measurement_plot(ui, &self.state);
        });
    }
}
