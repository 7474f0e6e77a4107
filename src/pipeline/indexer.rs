//! Time-windowed target indexer.
//!
//! Walks the conversation listing backward in time and collects a bounded set
//! of conversation targets for the detail fetcher. The listing is assumed
//! reverse-chronological (newest first): the first row older than the cutoff
//! proves all later rows and pages are older too, so pagination stops there.
//! If the upstream listing reorders rows (pinned or unread threads), targets
//! inside the window can be missed; known limitation.

use crate::core::error;
use crate::core::page::{PageError, PageSource};
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Short month+day display form, e.g. "jul 4" (input is lowercased first).
static MONTH_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z]{3})\s+(\d{1,2})").unwrap());

pub const LISTING_URL: &str = "https://inbox.example.com/m/messages/";
pub const BASE_URL: &str = "https://inbox.example.com";

pub const THREAD_SELECTOR: &str = "table h3";
pub const ANCHOR_SELECTOR: &str = "xpath=ancestor::a";
pub const TIME_SELECTOR: &str = "xpath=ancestor::tr//abbr";
pub const NEXT_PAGE_SELECTOR: &str = "#see_older_threads a";

/// A discovered conversation reference pending detail extraction. `date` keeps
/// the display form exactly as the listing showed it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub url: String,
    pub date: String,
}

/// Resolve a listing's relative/display timestamp to an absolute time.
///
/// Heuristics, in order: "minutes/hours ago"-style tokens (and "now"/"just"/
/// "today") resolve to `now`; "yesterday" to `now` minus one day; a short
/// month+day form ("Jul 4") to that day of the current year; anything else to a
/// far-past sentinel, one year back, older than any realistic cutoff.
pub fn resolve_display_date(display: &str, now: DateTime<Local>) -> DateTime<Local> {
    let sentinel = now - Duration::days(365);
    let clean = display.trim().to_lowercase();

    if ["min", "hour", "hr", "now", "just", "today"]
        .iter()
        .any(|tok| clean.contains(tok))
    {
        return now;
    }
    if clean.contains("yesterday") {
        return now - Duration::days(1);
    }

    if let Some(caps) = MONTH_DAY.captures(&clean) {
        let composed = format!("{} {} {}", &caps[1], &caps[2], now.format("%Y"));
        if let Ok(date) = NaiveDate::parse_from_str(&composed, "%b %d %Y") {
            if let Some(dt) = date
                .and_hms_opt(0, 0, 0)
                .and_then(|naive| Local.from_local_datetime(&naive).single())
            {
                return dt;
            }
        }
    }

    sentinel
}

/// Collect up to `limit_count` targets no older than `now - limit_days` days.
///
/// Per-row extraction failures skip that row; page-level query or click
/// failures abort the whole indexing run. Stops on the first too-old row, when
/// the count limit is reached, on an empty page, or when no next-page control
/// exists.
pub fn build_target_list<P: PageSource>(
    page: &mut P,
    limit_count: usize,
    limit_days: i64,
    now: DateTime<Local>,
) -> Result<Vec<Target>, error::LeadboxError> {
    let cutoff = now - Duration::days(limit_days);
    let mut targets: Vec<Target> = Vec::new();

    page.navigate(LISTING_URL)?;

    let mut keep_scanning = true;
    while keep_scanning && targets.len() < limit_count {
        let threads = page.query(THREAD_SELECTOR)?;
        if threads.is_empty() {
            break;
        }
        for thread in threads {
            if targets.len() >= limit_count {
                break;
            }
            match extract_row(page, thread) {
                Ok(Some(t)) => {
                    if resolve_display_date(&t.date, now) >= cutoff {
                        targets.push(t);
                    } else {
                        keep_scanning = false;
                        break;
                    }
                }
                // Malformed row or row-level read failure: skip it.
                Ok(None) | Err(_) => continue,
            }
        }
        if !keep_scanning || targets.len() >= limit_count {
            break;
        }
        match page.query(NEXT_PAGE_SELECTOR)?.first() {
            Some(&next) => page.click(next)?,
            None => keep_scanning = false,
        }
    }

    Ok(targets)
}

fn extract_row<P: PageSource>(
    page: &mut P,
    thread: crate::core::page::ElementHandle,
) -> Result<Option<Target>, PageError> {
    let name = page.text_of(thread)?;
    let Some(&anchor) = page.query_within(thread, ANCHOR_SELECTOR)?.first() else {
        return Ok(None);
    };
    let Some(href) = page.attribute(anchor, "href")? else {
        return Ok(None);
    };
    let date = match page.query_within(thread, TIME_SELECTOR)?.first() {
        Some(&el) => page.text_of(el)?,
        None => "Today".to_string(),
    };
    Ok(Some(Target {
        name,
        url: format!("{}{}", BASE_URL, href),
        date,
    }))
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "indexer",
        "version": "0.1.0",
        "description": "Bounded reverse-chronological target discovery",
        "commands": [
            { "name": "index", "description": "Build the target list (library API; requires a page backend)" }
        ],
        "storage": []
    })
}
