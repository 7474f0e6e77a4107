//! Autopilot state and the background scan scheduler.
//!
//! The scheduler is a single long-lived loop. Operator commands never talk to
//! it directly; all coordination goes through the persisted `system_state` row,
//! which the loop re-reads at every iteration boundary. Toggles therefore take
//! effect at the next iteration, never mid-sleep and never mid-scan.

use crate::core::broker::DbBroker;
use crate::core::db;
use crate::core::error;
use crate::core::page::{PageError, PageSource};
use crate::core::schemas;
use crate::core::time::now_iso;
use crate::pipeline::scanner;
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Interval names offered to the operator, with their sleep durations in
/// seconds. Unknown names fall back to [`DEFAULT_INTERVAL_SECS`].
pub const INTERVALS: &[(&str, u64)] = &[
    ("2 min", 120),
    ("5 min", 300),
    ("10 min", 600),
    ("30 min", 1800),
    ("1 hour", 3600),
    ("2 hours", 7200),
    ("4 hours", 14400),
    ("8 hours", 28800),
    ("12 hours", 43200),
    ("24 hours", 86400),
    ("28 hours", 100800),
];

pub const DEFAULT_INTERVAL_SECS: u64 = 3600;

/// Sleep between state polls while the autopilot is disengaged.
pub const IDLE_POLL: Duration = Duration::from_secs(5);

pub fn interval_duration(name: &str) -> Duration {
    let secs = INTERVALS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, s)| *s)
        .unwrap_or(DEFAULT_INTERVAL_SECS);
    Duration::from_secs(secs)
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScanState {
    pub active: bool,
    pub interval: String,
    pub updated_at: String,
}

/// Read the singleton state row. Callers must not cache this across a sleep
/// boundary; the scheduler re-reads it every cycle.
pub fn read_scan_state(root: &Path) -> Result<ScanState, error::LeadboxError> {
    let broker = DbBroker::new(root);
    broker.with_conn(&db::intel_db_path(root), "autopilot.read", |conn| {
        conn.execute(schemas::INTEL_DB_SCHEMA_SYSTEM_STATE, [])?;
        conn.execute(schemas::INTEL_DB_SEED_SYSTEM_STATE, [])?;
        let state = conn.query_row(
            "SELECT autopilot_active, interval, updated_at FROM system_state WHERE id = 1",
            [],
            |row| {
                Ok(ScanState {
                    active: row.get::<_, i64>(0)? != 0,
                    interval: row.get(1)?,
                    updated_at: row.get(2)?,
                })
            },
        )?;
        Ok(state)
    })
}

/// Full-row replace; concurrent writers are last-writer-wins by design.
pub fn set_active(root: &Path, active: bool) -> Result<(), error::LeadboxError> {
    let broker = DbBroker::new(root);
    broker.with_conn(&db::intel_db_path(root), "autopilot.toggle", |conn| {
        conn.execute(schemas::INTEL_DB_SCHEMA_SYSTEM_STATE, [])?;
        conn.execute(schemas::INTEL_DB_SEED_SYSTEM_STATE, [])?;
        conn.execute(
            "UPDATE system_state SET autopilot_active = ?1, updated_at = ?2 WHERE id = 1",
            rusqlite::params![active as i64, now_iso()],
        )?;
        Ok(())
    })
}

pub fn set_interval(root: &Path, interval: &str) -> Result<(), error::LeadboxError> {
    if !INTERVALS.iter().any(|(n, _)| *n == interval) {
        return Err(error::LeadboxError::ValidationError(format!(
            "unknown interval '{}' (expected one of: {})",
            interval,
            INTERVALS
                .iter()
                .map(|(n, _)| *n)
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }
    let broker = DbBroker::new(root);
    broker.with_conn(&db::intel_db_path(root), "autopilot.interval", |conn| {
        conn.execute(schemas::INTEL_DB_SCHEMA_SYSTEM_STATE, [])?;
        conn.execute(schemas::INTEL_DB_SEED_SYSTEM_STATE, [])?;
        conn.execute(
            "UPDATE system_state SET interval = ?1, updated_at = ?2 WHERE id = 1",
            rusqlite::params![interval, now_iso()],
        )?;
        Ok(())
    })
}

pub fn autopilot_events_path(root: &Path) -> PathBuf {
    root.join("autopilot.events.jsonl")
}

fn log_autopilot_event(root: &Path, event: serde_json::Value) {
    use std::fs::OpenOptions;
    use std::io::Write;
    // Scheduler logging must never take the loop down.
    if let Ok(mut f) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(autopilot_events_path(root))
    {
        let _ = writeln!(f, "{}", event);
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Poll cadence while disengaged. Injectable so tests do not wait 5 s.
    pub idle_poll: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { idle_poll: IDLE_POLL }
    }
}

static SCHEDULER_STARTED: AtomicBool = AtomicBool::new(false);

pub fn scheduler_running() -> bool {
    SCHEDULER_STARTED.load(Ordering::SeqCst)
}

/// Start the background scan loop. At most one scheduler runs per process; a
/// second call is a no-op returning `false`.
///
/// `connect` opens a fresh authenticated page session; it is invoked once per
/// active cycle, mirroring one automation session per scan. There is no
/// cancellation: a disengage only takes effect at the next iteration boundary.
pub fn spawn_scheduler<C, P>(root: PathBuf, config: SchedulerConfig, connect: C) -> bool
where
    C: Fn() -> Result<P, PageError> + Send + 'static,
    P: PageSource,
{
    if SCHEDULER_STARTED.swap(true, Ordering::SeqCst) {
        return false;
    }

    std::thread::Builder::new()
        .name("autopilot-loop".to_string())
        .spawn(move || {
            loop {
                let state = match read_scan_state(&root) {
                    Ok(s) => s,
                    Err(e) => {
                        log_autopilot_event(
                            &root,
                            serde_json::json!({
                                "ts": now_iso(),
                                "type": "autopilot.state_read_failed",
                                "error": e.to_string()
                            }),
                        );
                        std::thread::sleep(config.idle_poll);
                        continue;
                    }
                };

                if state.active {
                    match scanner::run_scan(&root, &connect) {
                        Ok(outcome) => log_autopilot_event(
                            &root,
                            serde_json::json!({
                                "ts": now_iso(),
                                "type": "autopilot.scan",
                                "outcome": outcome
                            }),
                        ),
                        // A failed scan aborts this cycle only; the loop goes on.
                        Err(e) => log_autopilot_event(
                            &root,
                            serde_json::json!({
                                "ts": now_iso(),
                                "type": "autopilot.scan_failed",
                                "error": e.to_string()
                            }),
                        ),
                    }
                    std::thread::sleep(interval_duration(&state.interval));
                } else {
                    std::thread::sleep(config.idle_poll);
                }
            }
        })
        .is_ok()
}

#[derive(Parser, Debug)]
#[clap(name = "autopilot", about = "Engage, disengage, and tune the background scanner.")]
pub struct AutopilotCli {
    #[clap(subcommand)]
    pub command: AutopilotCommand,
}

#[derive(Subcommand, Debug)]
pub enum AutopilotCommand {
    /// Persist autopilot_active = 1. The scheduler picks it up next cycle.
    Engage,
    /// Persist autopilot_active = 0. An in-flight scan still runs to completion.
    Stop,
    /// Set the scan interval by name (e.g. "1 hour").
    Interval { name: String },
    /// Show persisted state and the interval table.
    Status,
}

pub fn run_autopilot_cli(root: &Path, cli: AutopilotCli) -> Result<(), error::LeadboxError> {
    match cli.command {
        AutopilotCommand::Engage => {
            set_active(root, true)?;
            println!(
                "{}",
                serde_json::json!({ "ts": now_iso(), "cmd": "autopilot.engage", "status": "ok" })
            );
        }
        AutopilotCommand::Stop => {
            set_active(root, false)?;
            println!(
                "{}",
                serde_json::json!({ "ts": now_iso(), "cmd": "autopilot.stop", "status": "ok" })
            );
        }
        AutopilotCommand::Interval { name } => {
            set_interval(root, &name)?;
            println!(
                "{}",
                serde_json::json!({ "ts": now_iso(), "cmd": "autopilot.interval", "interval": name, "status": "ok" })
            );
        }
        AutopilotCommand::Status => {
            let state = read_scan_state(root)?;
            let label = if state.active {
                "ACTIVE".bright_green().bold()
            } else {
                "IDLE".bright_black().bold()
            };
            println!("Autopilot: {}", label);
            println!("Interval:  {}", state.interval.bright_cyan());
            if !state.updated_at.is_empty() {
                println!("Updated:   {}", state.updated_at);
            }
        }
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "autopilot",
        "version": "0.1.0",
        "description": "Persisted scan state and the background scheduler",
        "commands": [
            { "name": "engage", "parameters": [] },
            { "name": "stop", "parameters": [] },
            { "name": "interval", "parameters": ["name"] },
            { "name": "status", "parameters": [] }
        ],
        "storage": ["intel.db", "autopilot.events.jsonl"]
    })
}
