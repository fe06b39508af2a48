use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::feed::RawTable;
use super::model::{TestCategory, UnifiedRecord, UnifiedTable};
use super::totals::{self, PerUnit, StackCounts, TotalsPolicy};

// ---------------------------------------------------------------------------
// Identity cleaning
// ---------------------------------------------------------------------------

/// Trailing arrangement/content suffixes appended to amphora labels in the
/// sheets, e.g. `Dressel_20_rect` or `RA_4_hold_24h`.
static SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)_(rect|hex|hold.*|drop.*|oil|wine|empty)$").unwrap()
});

/// Strip the arrangement suffix and surrounding whitespace from a raw label.
/// Idempotent: reapplying never strips further.
pub fn clean_amphora_name(raw: &str) -> String {
    SUFFIX_RE.replace(raw.trim(), "").trim().to_string()
}

// ---------------------------------------------------------------------------
// Numeric coercion
// ---------------------------------------------------------------------------

/// Locale-tolerant numeric parse: strips thousands separators, maps anything
/// unparseable to `None` instead of failing the row.
pub fn parse_numeric(s: &str) -> Option<f64> {
    let cleaned = s.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

// ---------------------------------------------------------------------------
// Header resolution
// ---------------------------------------------------------------------------

/// Canonical name under which the tensile-strength column is aliased,
/// whatever the sheet version actually calls it.
pub const TENSILE_METRIC: &str = "Max Tensile (MPa)";

static TENSILE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)max.*tensile").unwrap());
static COMPRESSIVE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)compress").unwrap());

static MASS_EMPTY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)mass.*empty").unwrap());
static MASS_WINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)mass.*wine").unwrap());
static MASS_OIL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)mass.*oil").unwrap());
static VOLUME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)internal.*volume").unwrap());
static COUNT_W_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^w\b").unwrap());
static COUNT_L_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^l\b").unwrap());
static COUNT_N_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^n\b").unwrap());

fn find_header(headers: &[String], pattern: &Regex, reject: Option<&Regex>) -> Option<usize> {
    headers.iter().position(|h| {
        pattern.is_match(h) && reject.map_or(true, |r| !r.is_match(h))
    })
}

/// Column indices needed by the totals computation, resolved once per table.
struct TotalsColumns {
    mass_empty: Option<usize>,
    mass_wine: Option<usize>,
    mass_oil: Option<usize>,
    volume: Option<usize>,
    w: Option<usize>,
    l: Option<usize>,
    n: Option<usize>,
}

impl TotalsColumns {
    fn resolve(headers: &[String]) -> Option<Self> {
        let cols = Self {
            mass_empty: find_header(headers, &MASS_EMPTY_RE, None),
            mass_wine: find_header(headers, &MASS_WINE_RE, None),
            mass_oil: find_header(headers, &MASS_OIL_RE, None),
            volume: find_header(headers, &VOLUME_RE, None),
            w: find_header(headers, &COUNT_W_RE, None),
            l: find_header(headers, &COUNT_L_RE, None),
            n: find_header(headers, &COUNT_N_RE, None),
        };
        // A sheet without any per-unit column carries no stacking totals.
        let has_per_unit = cols.mass_empty.is_some()
            || cols.mass_wine.is_some()
            || cols.mass_oil.is_some()
            || cols.volume.is_some();
        has_per_unit.then_some(cols)
    }
}

/// Everything the normalizer needs to know about one table's schema,
/// computed once per table rather than re-matched per row.
struct TablePlan {
    identity_col: usize,
    /// `Test` first, then `Arrangement`, in lookup order.
    class_cols: Vec<usize>,
    /// (column index, metric name) for every numerically-scanned column;
    /// the tensile column is aliased to [`TENSILE_METRIC`].
    metric_cols: Vec<(usize, String)>,
    totals_cols: Option<TotalsColumns>,
}

impl TablePlan {
    fn resolve(table: &RawTable) -> Option<Self> {
        let identity_col = table
            .headers
            .iter()
            .position(|h| h.to_lowercase().starts_with("amphora"))?;

        let class_cols: Vec<usize> = ["test", "arrangement"]
            .iter()
            .filter_map(|want| {
                table
                    .headers
                    .iter()
                    .position(|h| h.eq_ignore_ascii_case(want))
            })
            .collect();
        if class_cols.is_empty() {
            log::warn!(
                "feed '{}' has no Test/Arrangement column; all rows will be dropped",
                table.name
            );
        }

        let tensile_col = find_header(&table.headers, &TENSILE_RE, Some(&COMPRESSIVE_RE));

        // Dynamic scan: any non-identity, non-classification column with at
        // least one parseable cell is a metric column.
        let metric_cols: Vec<(usize, String)> = table
            .headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != identity_col && !class_cols.contains(i))
            .filter(|(i, _)| {
                table
                    .rows
                    .iter()
                    .any(|row| row.get(*i).and_then(|c| c.as_deref()).and_then(parse_numeric).is_some())
            })
            .map(|(i, header)| {
                let name = if Some(i) == tensile_col {
                    TENSILE_METRIC.to_string()
                } else {
                    header.clone()
                };
                (i, name)
            })
            .collect();

        Some(Self {
            identity_col,
            class_cols,
            metric_cols,
            totals_cols: TotalsColumns::resolve(&table.headers),
        })
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Reconcile every fetched table into a single unified record sequence.
///
/// Tables missing the identity column contribute zero records (schema
/// mismatch is not fatal). Rows with an empty cleaned name or no
/// classifiable category are dropped, never retained as nulls. Duplicate
/// `(name, category)` pairs across feeds are kept as separate records.
pub fn normalize(tables: &[RawTable], policy: &TotalsPolicy) -> UnifiedTable {
    let mut records = Vec::new();
    let mut metric_names: Vec<String> = Vec::new();
    let mut any_totals = false;

    for table in tables {
        let Some(plan) = TablePlan::resolve(table) else {
            log::warn!(
                "feed '{}' has no amphora identity column; contributing zero records",
                table.name
            );
            continue;
        };

        for (_, name) in &plan.metric_cols {
            if !metric_names.contains(name) {
                metric_names.push(name.clone());
            }
        }

        let before = records.len();
        for row in &table.rows {
            let cell = |col: usize| row.get(col).and_then(|c| c.as_deref());

            let Some(raw_label) = cell(plan.identity_col) else {
                continue;
            };
            let amphora_name = clean_amphora_name(raw_label);
            if amphora_name.is_empty() {
                continue;
            }

            let Some(category) = plan
                .class_cols
                .iter()
                .filter_map(|&c| cell(c))
                .find_map(TestCategory::classify)
            else {
                continue;
            };

            let measurements: BTreeMap<String, Option<f64>> = plan
                .metric_cols
                .iter()
                .map(|&(col, ref name)| (name.clone(), cell(col).and_then(parse_numeric)))
                .collect();

            let derived_totals = match &plan.totals_cols {
                Some(cols) => {
                    let num = |col: Option<usize>| col.and_then(cell).and_then(parse_numeric);
                    let per_unit = PerUnit {
                        mass_empty: num(cols.mass_empty),
                        mass_wine: num(cols.mass_wine),
                        mass_oil: num(cols.mass_oil),
                        volume: num(cols.volume),
                    };
                    let counts = StackCounts {
                        w: num(cols.w),
                        l: num(cols.l),
                        n: num(cols.n),
                    };
                    any_totals = true;
                    totals::derive_totals(&per_unit, &counts, policy)
                }
                None => BTreeMap::new(),
            };

            records.push(UnifiedRecord {
                amphora_name,
                raw_label: raw_label.to_string(),
                category,
                measurements,
                derived_totals,
            });
        }
        log::info!(
            "feed '{}': {} of {} rows normalized",
            table.name,
            records.len() - before,
            table.rows.len()
        );
    }

    if any_totals {
        for name in [totals::TOTAL_POTS, totals::TOTAL_MASS_PARAM, totals::TOTAL_VOLUME] {
            if !metric_names.contains(&name.to_string()) {
                metric_names.push(name.to_string());
            }
        }
    }

    UnifiedTable {
        records,
        metric_names,
    }
}
