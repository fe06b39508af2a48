use std::collections::BTreeMap;

// Derived metric names merged into `UnifiedRecord::derived_totals`.
pub const TOTAL_POTS: &str = "Total Pots";
pub const TOTAL_MASS_EMPTY: &str = "Total Mass (Empty)";
pub const TOTAL_MASS_WINE: &str = "Total Mass (Wine)";
pub const TOTAL_MASS_OIL: &str = "Total Mass (Oil)";
pub const TOTAL_VOLUME: &str = "Total Volume";

/// Axis label standing for whichever `Total Mass (…)` column the current
/// mass-type selects.
pub const TOTAL_MASS_PARAM: &str = "Total Mass";

/// Defaults for missing inputs to the totals computation. Source sheet
/// versions disagree on these, so they are policy rather than constants:
/// a missing repetition count degrades totals to per-unit values, while a
/// missing per-unit measurement yields a defined zero total instead of
/// poisoning charts that never use it.
#[derive(Debug, Clone, Copy)]
pub struct TotalsPolicy {
    pub missing_count: f64,
    pub missing_per_unit: f64,
}

impl Default for TotalsPolicy {
    fn default() -> Self {
        Self {
            missing_count: 1.0,
            missing_per_unit: 0.0,
        }
    }
}

/// Per-unit measurements of one stacked arrangement row.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerUnit {
    pub mass_empty: Option<f64>,
    pub mass_wine: Option<f64>,
    pub mass_oil: Option<f64>,
    pub volume: Option<f64>,
}

/// Repetition counts of the stacked arrangement: width, length, layers.
#[derive(Debug, Clone, Copy, Default)]
pub struct StackCounts {
    pub w: Option<f64>,
    pub l: Option<f64>,
    pub n: Option<f64>,
}

impl StackCounts {
    pub fn total_pots(&self, policy: &TotalsPolicy) -> f64 {
        self.w.unwrap_or(policy.missing_count)
            * self.l.unwrap_or(policy.missing_count)
            * self.n.unwrap_or(policy.missing_count)
    }
}

/// Compute the multiplicative totals for one row.
pub fn derive_totals(
    per_unit: &PerUnit,
    counts: &StackCounts,
    policy: &TotalsPolicy,
) -> BTreeMap<String, f64> {
    let pots = counts.total_pots(policy);
    let per = |v: Option<f64>| v.unwrap_or(policy.missing_per_unit);

    let mut totals = BTreeMap::new();
    totals.insert(TOTAL_POTS.to_string(), pots);
    totals.insert(TOTAL_MASS_EMPTY.to_string(), per(per_unit.mass_empty) * pots);
    totals.insert(TOTAL_MASS_WINE.to_string(), per(per_unit.mass_wine) * pots);
    totals.insert(TOTAL_MASS_OIL.to_string(), per(per_unit.mass_oil) * pots);
    totals.insert(TOTAL_VOLUME.to_string(), per(per_unit.volume) * pots);
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_counts_multiply_through() {
        let per_unit = PerUnit {
            mass_empty: Some(2.5),
            ..Default::default()
        };
        let counts = StackCounts {
            w: Some(2.0),
            l: Some(3.0),
            n: Some(4.0),
        };
        let totals = derive_totals(&per_unit, &counts, &TotalsPolicy::default());
        assert_eq!(totals[TOTAL_POTS], 24.0);
        assert_eq!(totals[TOTAL_MASS_EMPTY], 60.0);
    }

    #[test]
    fn missing_count_defaults_to_one() {
        let per_unit = PerUnit {
            mass_empty: Some(2.5),
            ..Default::default()
        };
        let counts = StackCounts {
            w: Some(2.0),
            l: Some(3.0),
            n: None,
        };
        let totals = derive_totals(&per_unit, &counts, &TotalsPolicy::default());
        assert_eq!(totals[TOTAL_MASS_EMPTY], 15.0);
    }

    #[test]
    fn missing_per_unit_defaults_to_zero() {
        let counts = StackCounts {
            w: Some(2.0),
            l: Some(2.0),
            n: Some(2.0),
        };
        let totals = derive_totals(&PerUnit::default(), &counts, &TotalsPolicy::default());
        assert_eq!(totals[TOTAL_POTS], 8.0);
        assert_eq!(totals[TOTAL_MASS_WINE], 0.0);
        assert_eq!(totals[TOTAL_VOLUME], 0.0);
    }

    #[test]
    fn policy_overrides_both_defaults() {
        let policy = TotalsPolicy {
            missing_count: 0.0,
            missing_per_unit: 1.0,
        };
        let totals = derive_totals(&PerUnit::default(), &StackCounts::default(), &policy);
        assert_eq!(totals[TOTAL_POTS], 0.0);
        assert_eq!(totals[TOTAL_MASS_OIL], 0.0);
    }
}
