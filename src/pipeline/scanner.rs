//! Passive inbox scanner: match watch terms against visible conversation rows
//! and persist newly discovered leads.

use crate::core::error;
use crate::core::page::{PageError, PageSource};
use crate::core::session;
use crate::core::time::now_minute;
use crate::pipeline::{leads, watchlist};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Inbox view the scanner reads. Row extraction is selector-driven so the
/// automation backend decides what a "row" is concretely.
pub const INBOX_URL: &str = "https://inbox.example.com/messages/";
pub const ROW_SELECTOR: &str = "div[role='row']";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub rows_seen: usize,
    pub matched: usize,
    pub inserted: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind")]
pub enum ScanOutcome {
    /// Preconditions absent; nothing to do, not a failure.
    SkippedNoTerms,
    SkippedNoSession,
    Completed(ScanReport),
}

/// First watch term (in set order) that is a case-insensitive substring of the
/// row text. At most one match per row.
pub fn match_term<'a>(terms: &'a [String], text: &str) -> Option<&'a str> {
    let haystack = text.to_lowercase();
    terms
        .iter()
        .find(|t| haystack.contains(&t.to_lowercase()))
        .map(|t| t.as_str())
}

/// Derive the lead's profile label: first line of the row text, "Unknown" when
/// the row is blank.
fn profile_of(row_text: &str) -> String {
    match row_text.lines().next() {
        Some(line) if !line.trim().is_empty() => line.to_string(),
        _ => "Unknown".to_string(),
    }
}

/// One passive scan over the currently visible inbox rows.
///
/// Missing watch terms or a missing session artifact make this a silent no-op.
/// A row that fails to read is skipped; a navigation or query failure aborts
/// the whole scan (the scheduler logs it and proceeds to its next cycle).
pub fn run_scan<F, P>(root: &Path, connect: F) -> Result<ScanOutcome, error::LeadboxError>
where
    F: FnOnce() -> Result<P, PageError>,
    P: PageSource,
{
    let terms: Vec<String> = watchlist::list_terms(root)?
        .into_iter()
        .map(|t| t.word)
        .collect();
    if terms.is_empty() {
        return Ok(ScanOutcome::SkippedNoTerms);
    }
    if !session::has_session(root) {
        return Ok(ScanOutcome::SkippedNoSession);
    }

    let mut page = connect()?;
    page.navigate(INBOX_URL)?;
    let rows = page.query(ROW_SELECTOR)?;

    let mut report = ScanReport {
        rows_seen: rows.len(),
        matched: 0,
        inserted: 0,
    };

    for row in rows {
        // Row-level read failures skip only this row.
        let raw_text = match page.text_of(row) {
            Ok(t) => t,
            Err(_) => continue,
        };
        let Some(term) = match_term(&terms, &raw_text) else {
            continue;
        };
        report.matched += 1;

        let profile = profile_of(&raw_text);
        // Flatten before the dedup lookup so a rescan of the same row compares
        // equal to what was stored.
        let flat = raw_text.split_whitespace().collect::<Vec<_>>().join(" ");
        if leads::insert_lead_if_absent(root, &profile, &flat, term, &now_minute())? {
            report.inserted += 1;
        }
    }

    Ok(ScanOutcome::Completed(report))
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "scanner",
        "version": "0.1.0",
        "description": "Passive watch-term scan over visible inbox rows",
        "commands": [
            { "name": "run", "description": "One scan cycle (library API; requires a page backend)" }
        ],
        "storage": ["intel.db"]
    })
}
