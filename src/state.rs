use std::sync::mpsc;

use crate::color::ColorMap;
use crate::data::feed::{self, FeedOutcome, FeedSource};
use crate::data::model::UnifiedTable;
use crate::data::normalize::normalize;
use crate::data::totals::TotalsPolicy;
use crate::data::view::{build_view, PlotView, Selection};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Normalized dataset (None until the first feed cycle settles).
    pub table: Option<UnifiedTable>,

    /// The user's filter/axis choices; mutated by UI event handlers only.
    pub selection: Selection,

    /// Current output of the plot controller (cached per interaction).
    pub view: Option<PlotView>,

    /// Per-amphora colours, shared by plot and checklist.
    pub color_map: ColorMap,

    /// Amphora chosen in the ranking box.
    pub rank_amphora: Option<String>,

    /// Policy for missing inputs to the totals computation.
    pub totals_policy: TotalsPolicy,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Receiver for an in-flight feed cycle. A reload replaces it; the
    /// superseded cycle's result is simply dropped.
    feed_rx: Option<mpsc::Receiver<Vec<(String, FeedOutcome)>>>,

    /// Whether a feed cycle is in flight.
    pub loading: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            table: None,
            selection: Selection::default(),
            view: None,
            color_map: ColorMap::default(),
            rank_amphora: None,
            totals_policy: TotalsPolicy::default(),
            status_message: None,
            feed_rx: None,
            loading: false,
        }
    }
}

impl AppState {
    /// Kick off a feed cycle on background threads. All feeds are fetched
    /// concurrently and delivered together once every one has settled.
    pub fn start_feed_fetch(&mut self, feeds: Vec<FeedSource>) {
        let (tx, rx) = mpsc::channel();
        self.feed_rx = Some(rx);
        self.loading = true;
        self.status_message = None;
        std::thread::spawn(move || {
            let outcomes = feed::fetch_all(feeds);
            // Receiver may be gone if a reload superseded this cycle.
            let _ = tx.send(outcomes);
        });
    }

    /// Poll the in-flight feed cycle; ingest its result when it lands.
    pub fn poll_feeds(&mut self) {
        let Some(rx) = &self.feed_rx else { return };
        if let Ok(outcomes) = rx.try_recv() {
            self.feed_rx = None;
            self.loading = false;
            self.ingest_feeds(outcomes);
        }
    }

    /// Build the unified table from whichever feeds succeeded. Only a total
    /// failure (zero usable feeds) surfaces an error message.
    pub fn ingest_feeds(&mut self, outcomes: Vec<(String, FeedOutcome)>) {
        let mut tables = Vec::new();
        let mut failures = Vec::new();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(table) => tables.push(table),
                Err(e) => {
                    log::error!("feed '{name}': {e}");
                    failures.push(format!("{name}: {e}"));
                }
            }
        }

        if tables.is_empty() {
            self.status_message = Some(format!("All feeds failed: {}", failures.join("; ")));
            return;
        }
        if !failures.is_empty() {
            self.status_message = Some(format!("Partial data: {}", failures.join("; ")));
        }

        self.set_table(normalize(&tables, &self.totals_policy));
    }

    /// Ingest a freshly normalized table, seed defaults, rebuild colours.
    pub fn set_table(&mut self, table: UnifiedTable) {
        log::info!(
            "unified table: {} records, metrics {:?}",
            table.len(),
            table.metric_names
        );
        self.selection = Selection::seed(&table);
        self.color_map = ColorMap::new(&table.amphora_names(|_| true));
        self.rank_amphora = None;
        self.table = Some(table);
        self.refresh_view();
    }

    /// Recompute the plot view after any selection change.
    pub fn refresh_view(&mut self) {
        self.view = self
            .table
            .as_ref()
            .map(|table| build_view(table, &self.selection));
    }

    /// Amphora names valid for the current test filter (the checklist shows
    /// only these; checked state for hidden names is kept, not discarded).
    pub fn available_amphorae(&self) -> Vec<String> {
        let filter = self.selection.test_filter;
        self.table
            .as_ref()
            .map(|t| t.amphora_names(|rec| filter.matches(rec.category)))
            .unwrap_or_default()
    }

    pub fn check_all(&mut self) {
        for name in self.available_amphorae() {
            self.selection.checked.insert(crate::data::model::name_key(&name));
        }
        self.refresh_view();
    }

    pub fn check_none(&mut self) {
        self.selection.checked.clear();
        self.refresh_view();
    }
}
