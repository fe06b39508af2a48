use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Feed sources
// ---------------------------------------------------------------------------

/// Published-spreadsheet export format of one feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    /// Comma-separated values with a header row (`pub?output=csv`).
    Csv,
    /// Google Visualization query response (`gviz/tq?tqx=out:json`):
    /// a JSON table wrapped in a JS callback that must be stripped first.
    GvizJson,
}

/// One configured external feed.
#[derive(Debug, Clone)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    pub format: FeedFormat,
}

const STACK_CSV: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vQ92JwmYi97ikmGypcynINdCa0m4WMSwycoihoOkv-JXiWlHhwiOwfhyhFeGg_B4n3nqwScrMYUQCXp/pub?output=csv";
const HOLD_DROP_CSV: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vQ92JwmYi97ikmGypcynINdCa0m4WMSwycoihoOkv-JXiWlHhwiOwfhyhFeGg_B4n3nqwScrMYUQCXp/pub?gid=145083070&single=true&output=csv";

/// The two published sheets the app loads by default.
pub fn default_feeds() -> Vec<FeedSource> {
    vec![
        FeedSource {
            name: "stack".to_string(),
            url: STACK_CSV.to_string(),
            format: FeedFormat::Csv,
        },
        FeedSource {
            name: "hold-drop".to_string(),
            url: HOLD_DROP_CSV.to_string(),
            format: FeedFormat::Csv,
        },
    ]
}

// ---------------------------------------------------------------------------
// RawTable – one parsed feed body, schema unknown
// ---------------------------------------------------------------------------

/// An in-memory table straight from one feed: trimmed header labels and
/// string cells (`None` for empty / null cells). Interpretation of columns
/// is the normalizer's job.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a feed contributed nothing. Caught at the loader boundary; the
/// pipeline proceeds with whichever feeds succeeded.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed unavailable: {0}")]
    Unavailable(String),
    #[error("feed malformed: {0}")]
    Malformed(String),
}

pub type FeedOutcome = Result<RawTable, FeedError>;

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// Fetch every configured feed concurrently (one thread each) and wait for
/// all of them to settle. The result list preserves feed order; each entry
/// is a tagged success or failure, never a panic across the boundary.
pub fn fetch_all(feeds: Vec<FeedSource>) -> Vec<(String, FeedOutcome)> {
    let handles: Vec<_> = feeds
        .into_iter()
        .map(|feed| {
            let name = feed.name.clone();
            let handle = std::thread::spawn(move || fetch_one(&feed));
            (name, handle)
        })
        .collect();

    handles
        .into_iter()
        .map(|(name, handle)| {
            let outcome = match handle.join() {
                Ok(outcome) => outcome,
                Err(_) => Err(FeedError::Unavailable("fetch thread panicked".to_string())),
            };
            (name, outcome)
        })
        .collect()
}

fn fetch_one(feed: &FeedSource) -> FeedOutcome {
    let body = reqwest::blocking::get(&feed.url)
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.text())
        .map_err(|e| FeedError::Unavailable(e.to_string()))?;
    parse_body(&feed.name, &body, feed.format)
}

/// Parse a fetched (or locally read) body according to its format.
pub fn parse_body(name: &str, body: &str, format: FeedFormat) -> FeedOutcome {
    match format {
        FeedFormat::Csv => parse_csv(name, body),
        FeedFormat::GvizJson => parse_gviz(name, body),
    }
}

// ---------------------------------------------------------------------------
// CSV parsing
// ---------------------------------------------------------------------------

pub fn parse_csv(name: &str, body: &str) -> FeedOutcome {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| FeedError::Malformed(format!("header row: {e}")))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.is_empty() {
        return Err(FeedError::Malformed("no header row".to_string()));
    }

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|e| FeedError::Malformed(format!("row {row_no}: {e}")))?;
        // Pad / truncate to the header width so column indices stay aligned.
        let row: Vec<Option<String>> = (0..headers.len())
            .map(|i| {
                record
                    .get(i)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string())
            })
            .collect();
        rows.push(row);
    }

    Ok(RawTable {
        name: name.to_string(),
        headers,
        rows,
    })
}

// ---------------------------------------------------------------------------
// Gviz JSON parsing
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct GvizResponse {
    table: GvizTable,
}

#[derive(Deserialize)]
struct GvizTable {
    cols: Vec<GvizCol>,
    rows: Vec<GvizRow>,
}

#[derive(Deserialize)]
struct GvizCol {
    #[serde(default)]
    label: String,
}

#[derive(Deserialize)]
struct GvizRow {
    c: Vec<Option<GvizCell>>,
}

#[derive(Deserialize)]
struct GvizCell {
    v: Option<JsonValue>,
}

fn parse_gviz(name: &str, body: &str) -> FeedOutcome {
    let json = strip_gviz_wrapper(body)?;
    let resp: GvizResponse = serde_json::from_str(json)
        .map_err(|e| FeedError::Malformed(format!("gviz json: {e}")))?;

    let headers: Vec<String> = resp
        .table
        .cols
        .iter()
        .map(|c| c.label.trim().to_string())
        .collect();

    let rows: Vec<Vec<Option<String>>> = resp
        .table
        .rows
        .into_iter()
        .map(|row| {
            (0..headers.len())
                .map(|i| {
                    row.c
                        .get(i)
                        .and_then(|c| c.as_ref())
                        .and_then(|c| c.v.as_ref())
                        .and_then(json_to_cell)
                })
                .collect()
        })
        .collect();

    Ok(RawTable {
        name: name.to_string(),
        headers,
        rows,
    })
}

/// The gviz endpoint returns `/*O_o*/\ngoogle.visualization.Query.setResponse({...});`.
/// Everything outside the outermost braces is callback plumbing.
fn strip_gviz_wrapper(body: &str) -> Result<&str, FeedError> {
    let start = body
        .find('{')
        .ok_or_else(|| FeedError::Malformed("no JSON object in gviz body".to_string()))?;
    let end = body
        .rfind('}')
        .filter(|&end| end >= start)
        .ok_or_else(|| FeedError::Malformed("unterminated gviz body".to_string()))?;
    Ok(&body[start..=end])
}

fn json_to_cell(v: &JsonValue) -> Option<String> {
    match v {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_parses_header_and_cells() {
        let body = "Amphorae ,Test,Load (N)\nDressel_20_rect,Stack Rect,500\n, ,\n";
        let table = parse_csv("stack", body).unwrap();
        assert_eq!(table.headers, vec!["Amphorae", "Test", "Load (N)"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.cell(0, 0), Some("Dressel_20_rect"));
        assert_eq!(table.cell(0, 2), Some("500"));
        // blank cells become None
        assert_eq!(table.cell(1, 0), None);
        assert_eq!(table.cell(1, 1), None);
    }

    #[test]
    fn csv_short_rows_are_padded() {
        let body = "Amphorae,Test,Load (N)\nRA_4_hold,Hold\n";
        let table = parse_csv("hd", body).unwrap();
        assert_eq!(table.rows[0].len(), 3);
        assert_eq!(table.cell(0, 2), None);
    }

    #[test]
    fn gviz_wrapper_is_stripped_and_decoded() {
        let body = concat!(
            "/*O_o*/\ngoogle.visualization.Query.setResponse(",
            r#"{"table":{"cols":[{"label":"Amphorae"},{"label":"Load (N)"}],"#,
            r#""rows":[{"c":[{"v":"Bozburun_hex"},{"v":350.5}]},{"c":[{"v":"RA_4"},null]}]}}"#,
            ");"
        );
        let table = parse_gviz("gviz", body).unwrap();
        assert_eq!(table.headers, vec!["Amphorae", "Load (N)"]);
        assert_eq!(table.cell(0, 0), Some("Bozburun_hex"));
        assert_eq!(table.cell(0, 1), Some("350.5"));
        assert_eq!(table.cell(1, 1), None);
    }

    #[test]
    fn gviz_without_json_is_malformed() {
        let err = parse_gviz("gviz", "not json at all").unwrap_err();
        assert!(matches!(err, FeedError::Malformed(_)));
    }
}
