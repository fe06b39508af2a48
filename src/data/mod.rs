/// Data layer: feed loading, normalization, totals, and view resolution.
///
/// Architecture:
/// ```text
///  stack sheet      hold/drop sheet
///       │                 │
///       ▼                 ▼
///   ┌────────────────────────┐
///   │         feed           │  fetch + parse CSV / gviz → RawTable
///   └────────────────────────┘
///              │
///              ▼
///   ┌────────────────────────┐
///   │       normalize        │  clean names, classify, coerce, totals
///   └────────────────────────┘
///              │
///              ▼
///   ┌────────────────────────┐
///   │      UnifiedTable      │  immutable after construction
///   └────────────────────────┘
///              │
///              ▼
///   ┌────────────────────────┐
///   │         view           │  (table, Selection) → PlotView, rank
///   └────────────────────────┘
/// ```
pub mod feed;
pub mod model;
pub mod normalize;
pub mod totals;
pub mod view;

#[cfg(test)]
mod tests {
    use super::feed::parse_csv;
    use super::model::TestCategory;
    use super::normalize::{normalize, TENSILE_METRIC};
    use super::totals::TotalsPolicy;
    use super::view::{build_view, PlotView, Selection};

    // Two feeds end to end: one real sheet body, one body with headers only.
    #[test]
    fn two_feeds_normalize_and_plot() {
        let stack = parse_csv(
            "stack",
            "Amphorae,Test,Load (N),Max Tensile (MPa)\nDressel_20_rect,Stack Rect,500,2.0\n",
        )
        .unwrap();
        let hold_drop = parse_csv("hold-drop", "Amphorae,Test,Load (N)\n").unwrap();

        let table = normalize(&[stack, hold_drop], &TotalsPolicy::default());
        assert_eq!(table.len(), 1);

        let rec = &table.records[0];
        assert_eq!(rec.amphora_name, "Dressel_20");
        assert_eq!(rec.raw_label, "Dressel_20_rect");
        assert_eq!(rec.category, TestCategory::StackRect);
        assert_eq!(rec.measurements["Load (N)"], Some(500.0));
        assert_eq!(rec.measurements[TENSILE_METRIC], Some(2.0));

        let mut sel = Selection::seed(&table);
        assert!(sel.is_checked("Dressel_20"));
        assert_eq!(sel.x_axis, "Load (N)");
        assert_eq!(sel.y_axis, TENSILE_METRIC);

        sel.test_filter = super::view::TestFilter::Only(TestCategory::StackRect);
        match build_view(&table, &sel) {
            PlotView::Chart(chart) => {
                assert_eq!(chart.indices, vec![0]);
                assert!(chart.title.contains("Stack Rect"));
            }
            other => panic!("expected a one-point chart, got {other:?}"),
        }
    }
}
