//! Shared timestamp helpers for envelopes and scan records.

use chrono::Local;

/// Returns the current local time in RFC3339 (event envelopes, audit rows).
pub fn now_iso() -> String {
    Local::now().to_rfc3339()
}

/// Returns the current local time truncated to minute granularity,
/// the resolution lead records are stamped at (`YYYY-MM-DD HH:MM`).
pub fn now_minute() -> String {
    Local::now().format("%Y-%m-%d %H:%M").to_string()
}
