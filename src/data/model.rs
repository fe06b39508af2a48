use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// TestCategory – closed classification of one measurement row
// ---------------------------------------------------------------------------

/// The four physical-test setups appearing in the source sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TestCategory {
    StackRect,
    StackHex,
    Hold,
    Drop,
}

/// Ordered keyword rules: first substring match wins, case-insensitively.
/// `drop` outranks `hold` so that e.g. "drop after hold" classifies as Drop.
const KEYWORD_RULES: [(&str, TestCategory); 4] = [
    ("drop", TestCategory::Drop),
    ("hold", TestCategory::Hold),
    ("rect", TestCategory::StackRect),
    ("hex", TestCategory::StackHex),
];

impl TestCategory {
    /// Classify free text from a `Test` / `Arrangement` cell.
    /// Returns `None` when no keyword matches; such rows are dropped upstream.
    pub fn classify(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        KEYWORD_RULES
            .iter()
            .find(|(kw, _)| lower.contains(kw))
            .map(|&(_, cat)| cat)
    }

    /// Presentation label, matching the source sheets' vocabulary.
    pub fn label(self) -> &'static str {
        match self {
            TestCategory::StackRect => "Stack Rect",
            TestCategory::StackHex => "Stack Hex",
            TestCategory::Hold => "Hold",
            TestCategory::Drop => "Drop",
        }
    }

    pub fn is_stack(self) -> bool {
        matches!(self, TestCategory::StackRect | TestCategory::StackHex)
    }
}

impl fmt::Display for TestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// UnifiedRecord – one normalized measurement row
// ---------------------------------------------------------------------------

/// A single measurement row after identity cleaning and classification.
#[derive(Debug, Clone)]
pub struct UnifiedRecord {
    /// Cleaned amphora name: suffix-stripped, trimmed, never empty.
    pub amphora_name: String,
    /// Original uncleaned label, kept for provenance.
    pub raw_label: String,
    pub category: TestCategory,
    /// Every numeric column found in the source, coerced; unparseable cells
    /// are `None` rather than an error.
    pub measurements: BTreeMap<String, Option<f64>>,
    /// Multiplicative totals (mass / volume per stacked unit); present only
    /// for rows whose source sheet carries per-unit columns.
    pub derived_totals: BTreeMap<String, f64>,
}

impl UnifiedRecord {
    /// Case-insensitive comparison key for the amphora name.
    pub fn name_key(&self) -> String {
        name_key(&self.amphora_name)
    }

    /// Look up a metric by name: derived totals shadow raw measurements.
    pub fn value(&self, metric: &str) -> Option<f64> {
        if let Some(v) = self.derived_totals.get(metric) {
            return Some(*v);
        }
        self.measurements.get(metric).copied().flatten()
    }
}

/// Lowercased key used wherever amphora names are compared or grouped.
pub fn name_key(name: &str) -> String {
    name.to_lowercase()
}

// ---------------------------------------------------------------------------
// UnifiedTable – the complete normalized dataset
// ---------------------------------------------------------------------------

/// All surviving records from every feed, in source order.
/// Immutable after construction; every downstream view re-derives from it.
#[derive(Debug, Clone, Default)]
pub struct UnifiedTable {
    pub records: Vec<UnifiedRecord>,
    /// Metric names in first-seen column order across all source tables,
    /// including the parametrized/derived entries appended by the normalizer.
    pub metric_names: Vec<String>,
}

impl UnifiedTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct amphora names (first-seen casing), sorted case-insensitively,
    /// restricted to records passing `keep`.
    pub fn amphora_names<F>(&self, mut keep: F) -> Vec<String>
    where
        F: FnMut(&UnifiedRecord) -> bool,
    {
        let mut by_key: BTreeMap<String, String> = BTreeMap::new();
        for rec in &self.records {
            if keep(rec) {
                by_key
                    .entry(rec.name_key())
                    .or_insert_with(|| rec.amphora_name.clone());
            }
        }
        by_key.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_case_insensitive_and_ordered() {
        assert_eq!(
            TestCategory::classify("Stack Rect"),
            Some(TestCategory::StackRect)
        );
        assert_eq!(
            TestCategory::classify("STACK HEX"),
            Some(TestCategory::StackHex)
        );
        assert_eq!(TestCategory::classify("hold 24h"), Some(TestCategory::Hold));
        assert_eq!(TestCategory::classify("Drop 1m"), Some(TestCategory::Drop));
        // drop outranks hold when both appear
        assert_eq!(
            TestCategory::classify("drop after hold"),
            Some(TestCategory::Drop)
        );
        assert_eq!(TestCategory::classify("static bend"), None);
        assert_eq!(TestCategory::classify(""), None);
    }

    #[test]
    fn classification_is_deterministic_over_single_keywords() {
        for (text, expect) in [
            ("drop", TestCategory::Drop),
            ("DROP", TestCategory::Drop),
            ("hold", TestCategory::Hold),
            ("Hold", TestCategory::Hold),
            ("rect", TestCategory::StackRect),
            ("Rect", TestCategory::StackRect),
            ("hex", TestCategory::StackHex),
            ("HEX", TestCategory::StackHex),
        ] {
            assert_eq!(TestCategory::classify(text), Some(expect), "text = {text:?}");
        }
    }

    #[test]
    fn derived_totals_shadow_measurements() {
        let mut measurements = BTreeMap::new();
        measurements.insert("Load (N)".to_string(), Some(500.0));
        let mut derived_totals = BTreeMap::new();
        derived_totals.insert("Total Pots".to_string(), 24.0);

        let rec = UnifiedRecord {
            amphora_name: "Dressel_20".to_string(),
            raw_label: "Dressel_20_rect".to_string(),
            category: TestCategory::StackRect,
            measurements,
            derived_totals,
        };
        assert_eq!(rec.value("Load (N)"), Some(500.0));
        assert_eq!(rec.value("Total Pots"), Some(24.0));
        assert_eq!(rec.value("Missing"), None);
    }

    #[test]
    fn amphora_names_merge_case_variants() {
        let rec = |name: &str| UnifiedRecord {
            amphora_name: name.to_string(),
            raw_label: name.to_string(),
            category: TestCategory::Hold,
            measurements: BTreeMap::new(),
            derived_totals: BTreeMap::new(),
        };
        let table = UnifiedTable {
            records: vec![rec("Bozburun"), rec("BOZBURUN"), rec("RA_4")],
            metric_names: Vec::new(),
        };
        assert_eq!(table.amphora_names(|_| true), vec!["Bozburun", "RA_4"]);
    }
}
