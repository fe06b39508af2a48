use std::collections::BTreeSet;

use super::model::{name_key, TestCategory, UnifiedRecord, UnifiedTable};
use super::totals::TOTAL_MASS_PARAM;

// ---------------------------------------------------------------------------
// Selection – the user's current filter/axis choices
// ---------------------------------------------------------------------------

/// Which content the amphora was weighed with; selects the concrete
/// `Total Mass (…)` column behind the parametrized axis label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MassType {
    Empty,
    Wine,
    Oil,
}

impl MassType {
    pub fn label(self) -> &'static str {
        match self {
            MassType::Empty => "Empty",
            MassType::Wine => "Wine",
            MassType::Oil => "Oil",
        }
    }

    pub const ALL: [MassType; 3] = [MassType::Empty, MassType::Wine, MassType::Oil];
}

/// Active test-type filter. `AnyStack` is the umbrella matching both
/// stacking arrangements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestFilter {
    AnyStack,
    Only(TestCategory),
}

impl TestFilter {
    pub fn matches(self, category: TestCategory) -> bool {
        match self {
            TestFilter::AnyStack => category.is_stack(),
            TestFilter::Only(want) => category == want,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TestFilter::AnyStack => "Stack",
            TestFilter::Only(cat) => cat.label(),
        }
    }

    pub const ALL: [TestFilter; 5] = [
        TestFilter::AnyStack,
        TestFilter::Only(TestCategory::StackRect),
        TestFilter::Only(TestCategory::StackHex),
        TestFilter::Only(TestCategory::Hold),
        TestFilter::Only(TestCategory::Drop),
    ];
}

/// The user's current choices. Owned and mutated by the UI layer only;
/// the plot controller is a pure function of (table, selection).
#[derive(Debug, Clone)]
pub struct Selection {
    /// Checked amphorae, stored as case-insensitive name keys.
    pub checked: BTreeSet<String>,
    pub x_axis: String,
    pub y_axis: String,
    pub mass_type: MassType,
    pub test_filter: TestFilter,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            checked: BTreeSet::new(),
            x_axis: String::new(),
            y_axis: String::new(),
            mass_type: MassType::Empty,
            test_filter: TestFilter::AnyStack,
        }
    }
}

impl Selection {
    /// Seed defaults from a freshly built table: everything checked,
    /// x = a load metric, y = the tensile metric (with positional fallbacks).
    pub fn seed(table: &UnifiedTable) -> Self {
        let find = |needle: &str| {
            table
                .metric_names
                .iter()
                .find(|m| m.to_lowercase().contains(needle))
                .cloned()
        };
        let x_axis = find("load")
            .or_else(|| table.metric_names.first().cloned())
            .unwrap_or_default();
        let y_axis = find("tensile")
            .or_else(|| table.metric_names.iter().find(|m| **m != x_axis).cloned())
            .unwrap_or_default();

        Self {
            checked: table
                .amphora_names(|_| true)
                .iter()
                .map(|n| name_key(n))
                .collect(),
            x_axis,
            y_axis,
            mass_type: MassType::Empty,
            test_filter: TestFilter::AnyStack,
        }
    }

    pub fn is_checked(&self, name: &str) -> bool {
        self.checked.contains(&name_key(name))
    }

    pub fn toggle(&mut self, name: &str) {
        let key = name_key(name);
        if !self.checked.remove(&key) {
            self.checked.insert(key);
        }
    }
}

// ---------------------------------------------------------------------------
// PlotView – what the controller hands to the render sink
// ---------------------------------------------------------------------------

/// Why a view has nothing to plot. The two cases are distinct UI states,
/// not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// No amphora checked, or the resolved x and y metrics coincide.
    NoSelection,
    /// The selection is valid but filtering matched zero records.
    NoData,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlotView {
    Empty(EmptyReason),
    Chart(ChartView),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartView {
    /// Indices into `UnifiedTable::records`, in table order.
    pub indices: Vec<usize>,
    pub x_metric: String,
    pub y_metric: String,
    pub title: String,
}

/// Substitute the mass-type-specific column behind the parametrized
/// "Total Mass" axis label; other labels pass through unchanged.
pub fn resolve_metric(axis: &str, mass_type: MassType) -> String {
    if axis.starts_with(TOTAL_MASS_PARAM) {
        format!("{} ({})", TOTAL_MASS_PARAM, mass_type.label())
    } else {
        axis.to_string()
    }
}

/// The plot controller: compute the filtered view for the current selection.
/// Pure function of its inputs; guard order matters — an empty checked set
/// (or x == y) yields `NoSelection` before any data filtering runs.
pub fn build_view(table: &UnifiedTable, selection: &Selection) -> PlotView {
    let x_metric = resolve_metric(&selection.x_axis, selection.mass_type);
    let y_metric = resolve_metric(&selection.y_axis, selection.mass_type);

    if selection.checked.is_empty() || x_metric == y_metric {
        return PlotView::Empty(EmptyReason::NoSelection);
    }

    let indices: Vec<usize> = table
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            selection.test_filter.matches(rec.category)
                && selection.checked.contains(&rec.name_key())
        })
        .map(|(i, _)| i)
        .collect();

    if indices.is_empty() {
        return PlotView::Empty(EmptyReason::NoData);
    }

    let title = format!(
        "{}: {} vs {}",
        selection.test_filter.label(),
        selection.x_axis,
        selection.y_axis
    );
    PlotView::Chart(ChartView {
        indices,
        x_metric,
        y_metric,
        title,
    })
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// 1-based position of an amphora among its peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankResult {
    pub rank: usize,
    pub of: usize,
}

/// Rank an amphora by its mean value of `metric` among all amphorae with
/// records matching `filter`, ascending (lower mean ranks first, matching
/// the "lower tensile = better" reading of the source data). Amphorae with
/// no parseable value for the metric are excluded from the ranking; ties
/// keep the aggregation's stable order.
pub fn rank(
    table: &UnifiedTable,
    amphora: &str,
    filter: TestFilter,
    metric: &str,
) -> Option<RankResult> {
    let mut means: Vec<(String, f64)> = Vec::new();
    let mut sums: Vec<(String, f64, usize)> = Vec::new();

    for rec in table.records.iter().filter(|r| filter.matches(r.category)) {
        let Some(v) = rec.value(metric) else { continue };
        let key = rec.name_key();
        match sums.iter_mut().find(|(k, _, _)| *k == key) {
            Some((_, sum, count)) => {
                *sum += v;
                *count += 1;
            }
            None => sums.push((key, v, 1)),
        }
    }
    for (key, sum, count) in sums {
        means.push((key, sum / count as f64));
    }

    // sort_by is stable, so equal means keep first-seen order.
    means.sort_by(|a, b| a.1.total_cmp(&b.1));

    let wanted = name_key(amphora);
    let rank = means.iter().position(|(k, _)| *k == wanted)? + 1;
    Some(RankResult {
        rank,
        of: means.len(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::data::model::UnifiedRecord;

    fn record(name: &str, category: TestCategory, metrics: &[(&str, f64)]) -> UnifiedRecord {
        UnifiedRecord {
            amphora_name: name.to_string(),
            raw_label: name.to_string(),
            category,
            measurements: metrics
                .iter()
                .map(|&(m, v)| (m.to_string(), Some(v)))
                .collect(),
            derived_totals: BTreeMap::new(),
        }
    }

    fn sample_table() -> UnifiedTable {
        UnifiedTable {
            records: vec![
                record("Dressel_20", TestCategory::StackRect, &[("Load (N)", 500.0), ("Max Tensile (MPa)", 2.0)]),
                record("Bozburun", TestCategory::StackHex, &[("Load (N)", 350.0), ("Max Tensile (MPa)", 32.1)]),
                record("RA_4", TestCategory::Hold, &[("Load (N)", 120.0), ("Max Tensile (MPa)", 56.2)]),
            ],
            metric_names: vec!["Load (N)".to_string(), "Max Tensile (MPa)".to_string()],
        }
    }

    fn full_selection(table: &UnifiedTable) -> Selection {
        let mut sel = Selection::seed(table);
        sel.x_axis = "Load (N)".to_string();
        sel.y_axis = "Max Tensile (MPa)".to_string();
        sel
    }

    #[test]
    fn umbrella_stack_matches_both_arrangements() {
        let table = sample_table();
        let sel = full_selection(&table);
        match build_view(&table, &sel) {
            PlotView::Chart(chart) => {
                assert_eq!(chart.indices, vec![0, 1]);
                assert_eq!(chart.title, "Stack: Load (N) vs Max Tensile (MPa)");
            }
            other => panic!("expected chart, got {other:?}"),
        }
    }

    #[test]
    fn exact_category_filter_excludes_the_other_stack() {
        let table = sample_table();
        let mut sel = full_selection(&table);
        sel.test_filter = TestFilter::Only(TestCategory::StackHex);
        match build_view(&table, &sel) {
            PlotView::Chart(chart) => assert_eq!(chart.indices, vec![1]),
            other => panic!("expected chart, got {other:?}"),
        }
    }

    #[test]
    fn empty_checked_set_wins_over_equal_axes() {
        let table = sample_table();
        let mut sel = full_selection(&table);
        sel.checked.clear();
        sel.y_axis = sel.x_axis.clone();
        assert_eq!(
            build_view(&table, &sel),
            PlotView::Empty(EmptyReason::NoSelection)
        );
    }

    #[test]
    fn equal_resolved_axes_are_no_selection() {
        let table = sample_table();
        let mut sel = full_selection(&table);
        sel.y_axis = sel.x_axis.clone();
        assert_eq!(
            build_view(&table, &sel),
            PlotView::Empty(EmptyReason::NoSelection)
        );
    }

    #[test]
    fn unmatched_filter_is_no_data() {
        let table = sample_table();
        let mut sel = full_selection(&table);
        sel.test_filter = TestFilter::Only(TestCategory::Drop);
        assert_eq!(build_view(&table, &sel), PlotView::Empty(EmptyReason::NoData));
    }

    #[test]
    fn build_view_is_pure() {
        let table = sample_table();
        let sel = full_selection(&table);
        assert_eq!(build_view(&table, &sel), build_view(&table, &sel));
    }

    #[test]
    fn total_mass_axis_resolves_per_mass_type() {
        assert_eq!(
            resolve_metric("Total Mass", MassType::Wine),
            "Total Mass (Wine)"
        );
        assert_eq!(resolve_metric("Load (N)", MassType::Oil), "Load (N)");
    }

    #[test]
    fn rank_is_ascending_by_mean() {
        let table = UnifiedTable {
            records: vec![
                record("A", TestCategory::Hold, &[("Max Tensile (MPa)", 10.0)]),
                record("B", TestCategory::Hold, &[("Max Tensile (MPa)", 20.0)]),
                record("C", TestCategory::Hold, &[("Max Tensile (MPa)", 30.0)]),
            ],
            metric_names: vec!["Max Tensile (MPa)".to_string()],
        };
        let filter = TestFilter::Only(TestCategory::Hold);
        assert_eq!(
            rank(&table, "A", filter, "Max Tensile (MPa)"),
            Some(RankResult { rank: 1, of: 3 })
        );
        assert_eq!(
            rank(&table, "B", filter, "Max Tensile (MPa)"),
            Some(RankResult { rank: 2, of: 3 })
        );
        assert_eq!(
            rank(&table, "C", filter, "Max Tensile (MPa)"),
            Some(RankResult { rank: 3, of: 3 })
        );
    }

    #[test]
    fn rank_averages_duplicate_records() {
        let table = UnifiedTable {
            records: vec![
                record("A", TestCategory::Hold, &[("Max Tensile (MPa)", 10.0)]),
                record("A", TestCategory::Hold, &[("Max Tensile (MPa)", 50.0)]),
                record("B", TestCategory::Hold, &[("Max Tensile (MPa)", 20.0)]),
            ],
            metric_names: vec!["Max Tensile (MPa)".to_string()],
        };
        // mean(A) = 30 > mean(B) = 20
        let filter = TestFilter::Only(TestCategory::Hold);
        assert_eq!(
            rank(&table, "A", filter, "Max Tensile (MPa)"),
            Some(RankResult { rank: 2, of: 2 })
        );
    }

    #[test]
    fn rank_skips_amphorae_without_the_metric() {
        let table = UnifiedTable {
            records: vec![
                record("A", TestCategory::Hold, &[("Max Tensile (MPa)", 10.0)]),
                record("B", TestCategory::Hold, &[("Load (N)", 20.0)]),
            ],
            metric_names: vec!["Max Tensile (MPa)".to_string()],
        };
        let filter = TestFilter::Only(TestCategory::Hold);
        assert_eq!(
            rank(&table, "A", filter, "Max Tensile (MPa)"),
            Some(RankResult { rank: 1, of: 1 })
        );
        assert_eq!(rank(&table, "B", filter, "Max Tensile (MPa)"), None);
    }
}
