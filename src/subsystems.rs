//! Subsystem registration — central schema discovery.
//!
//! Adding a new subsystem: append one entry to [`subsystem_schemas`].

use crate::core::broker;
use crate::pipeline::{analyzer, autopilot, fetcher, harvest, indexer, leads, orders, scanner, watchlist};

/// Machine-readable descriptors for every subsystem, used by `leadbox schema`.
pub fn subsystem_schemas() -> Vec<serde_json::Value> {
    vec![
        watchlist::schema(),
        autopilot::schema(),
        scanner::schema(),
        leads::schema(),
        indexer::schema(),
        fetcher::schema(),
        harvest::schema(),
        orders::schema(),
        analyzer::schema(),
        broker::schema(),
    ]
}
