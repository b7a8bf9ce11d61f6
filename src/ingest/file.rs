// src/ingest/file.rs
//! Pasted text, .txt uploads and CSV columns → documents.

use std::collections::HashSet;

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;

/// Cell values read as "missing", the same set pandas treats as NA by default.
/// Matched exactly (case-sensitive, untrimmed).
static MISSING_MARKERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
        "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
    ]
    .into_iter()
    .collect()
});

fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(cell)
}

/// One document per non-blank line, trimmed.
pub fn lines_from_text(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn reader(data: &str) -> csv::Reader<&[u8]> {
    let data = data.strip_prefix('\u{feff}').unwrap_or(data);
    csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(data.as_bytes())
}

/// Header names of a CSV document, in column order.
pub fn csv_columns(data: &str) -> Result<Vec<String>> {
    let mut rdr = reader(data);
    let headers = rdr.headers().context("reading csv header")?;
    Ok(headers.iter().map(|h| h.trim().to_string()).collect())
}

/// Cells of `column` (matched on trimmed header names), in row order, with missing
/// values dropped: empty cells, NA markers like `NA`, `N/A`, `null` or `nan`, and short
/// rows that lack the column.
pub fn texts_from_csv_column(data: &str, column: &str) -> Result<Vec<String>> {
    let mut rdr = reader(data);
    let headers = rdr.headers().context("reading csv header")?.clone();
    let wanted = column.trim();
    let idx = headers
        .iter()
        .position(|h| h.trim() == wanted)
        .ok_or_else(|| anyhow!("column {wanted:?} not found in csv header"))?;

    let mut out = Vec::new();
    for (row, rec) in rdr.records().enumerate() {
        let rec = rec.with_context(|| format!("reading csv row {}", row + 1))?;
        if let Some(cell) = rec.get(idx) {
            if !is_missing(cell) {
                out.push(cell.to_string());
            }
        }
    }
    Ok(out)
}
