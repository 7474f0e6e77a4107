//! Store abstraction for leadbox state.
//!
//! A Store is the logical container for the two SQLite bins and the JSONL event
//! logs. All subsystem state (watchlist, leads, orders, pricing) is scoped to a
//! store root directory.

use std::path::PathBuf;

/// Resolve the store root: explicit override, else `LEADBOX_HOME`,
/// else `~/.leadbox/data`.
pub fn resolve_root(dir: Option<PathBuf>) -> PathBuf {
    if let Some(d) = dir {
        return d;
    }
    if let Ok(home) = std::env::var("LEADBOX_HOME") {
        return PathBuf::from(home);
    }
    let base = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(base).join(".leadbox").join("data")
}
