//! Harvest orchestration: index the inbox, fetch details, import new orders.

use crate::core::error;
use crate::core::page::{PageError, PageSource};
use crate::core::session;
use crate::pipeline::{fetcher, indexer, orders};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    pub targets: usize,
    pub fetched: usize,
    pub imported: usize,
    /// True when the run was skipped because no session artifact exists.
    pub skipped_no_session: bool,
}

/// One full harvest pass. Indexing and fetching share a single authenticated
/// page session sequentially; they never run concurrently with a passive scan
/// in a correct deployment.
pub fn run_harvest<F, P>(
    root: &Path,
    connect: F,
    limit_count: usize,
    limit_days: i64,
) -> Result<HarvestReport, error::LeadboxError>
where
    F: FnOnce() -> Result<P, PageError>,
    P: PageSource,
{
    if !session::has_session(root) {
        return Ok(HarvestReport {
            targets: 0,
            fetched: 0,
            imported: 0,
            skipped_no_session: true,
        });
    }

    let mut page = connect()?;
    let targets = indexer::build_target_list(&mut page, limit_count, limit_days, Local::now())?;
    let details = fetcher::fetch_details(&mut page, &targets);

    let mut imported = 0;
    for item in &details {
        if orders::save_order(root, &item.customer, &item.raw_message, &item.date)? {
            imported += 1;
        }
    }

    Ok(HarvestReport {
        targets: targets.len(),
        fetched: details.len(),
        imported,
        skipped_no_session: false,
    })
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "harvest",
        "version": "0.1.0",
        "description": "Index + fetch + import orchestration",
        "commands": [
            { "name": "run", "parameters": ["limit_count", "limit_days"] }
        ],
        "storage": ["orders.db"]
    })
}
