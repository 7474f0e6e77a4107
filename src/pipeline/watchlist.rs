use crate::core::broker::DbBroker;
use crate::core::db;
use crate::core::error;
use crate::core::schemas;
use crate::core::time::now_iso;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::Path;
use ulid::Ulid;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WatchTerm {
    pub id: String,
    pub word: String,
    pub created_at: String,
}

#[derive(Parser, Debug)]
#[clap(name = "watch", about = "Manage the universal watchlist of tracking phrases.")]
pub struct WatchCli {
    #[clap(subcommand)]
    pub command: WatchCommand,
}

#[derive(Subcommand, Debug)]
pub enum WatchCommand {
    /// Add a tracking phrase. Duplicates (exact text) are ignored.
    Add {
        word: String,
    },
    /// List watchlist terms in set order.
    List,
    /// Remove a term by id.
    Remove {
        #[clap(long)]
        id: String,
    },
}

/// Insert a term unless the exact text is already present. Returns true when a
/// new row was created.
pub fn add_term(root: &Path, word: &str) -> Result<bool, error::LeadboxError> {
    let word = word.trim();
    if word.is_empty() {
        return Err(error::LeadboxError::ValidationError(
            "watch term must not be empty".to_string(),
        ));
    }
    let broker = DbBroker::new(root);
    broker.with_conn(&db::intel_db_path(root), "watch.add", |conn| {
        conn.execute(schemas::INTEL_DB_SCHEMA_WATCHLIST, [])?;
        let changed = conn.execute(
            "INSERT OR IGNORE INTO watchlist (id, word, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![Ulid::new().to_string(), word, now_iso()],
        )?;
        Ok(changed > 0)
    })
}

/// Terms in insertion order. This order is the match-precedence order used by
/// the passive scanner.
pub fn list_terms(root: &Path) -> Result<Vec<WatchTerm>, error::LeadboxError> {
    let broker = DbBroker::new(root);
    broker.with_conn(&db::intel_db_path(root), "watch.list", |conn| {
        conn.execute(schemas::INTEL_DB_SCHEMA_WATCHLIST, [])?;
        let mut stmt =
            conn.prepare("SELECT id, word, created_at FROM watchlist ORDER BY rowid")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(WatchTerm {
                    id: row.get(0)?,
                    word: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn remove_term(root: &Path, id: &str) -> Result<(), error::LeadboxError> {
    let broker = DbBroker::new(root);
    let removed = broker.with_conn(&db::intel_db_path(root), "watch.remove", |conn| {
        Ok(conn.execute("DELETE FROM watchlist WHERE id = ?1", [id])?)
    })?;
    if removed == 0 {
        return Err(error::LeadboxError::NotFound(format!("watch term {}", id)));
    }
    Ok(())
}

pub fn run_watch_cli(root: &Path, cli: WatchCli) -> Result<(), error::LeadboxError> {
    match cli.command {
        WatchCommand::Add { word } => {
            let inserted = add_term(root, &word)?;
            println!(
                "{}",
                serde_json::json!({
                    "ts": now_iso(),
                    "cmd": "watch.add",
                    "word": word,
                    "status": if inserted { "ok" } else { "duplicate" }
                })
            );
        }
        WatchCommand::List => {
            let terms = list_terms(root)?;
            println!("{}", serde_json::to_string_pretty(&terms).unwrap_or_default());
        }
        WatchCommand::Remove { id } => {
            remove_term(root, &id)?;
            println!(
                "{}",
                serde_json::json!({ "ts": now_iso(), "cmd": "watch.remove", "id": id, "status": "ok" })
            );
        }
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "watch",
        "version": "0.1.0",
        "description": "Universal watchlist of tracking phrases",
        "commands": [
            { "name": "add", "parameters": ["word"] },
            { "name": "list", "parameters": [] },
            { "name": "remove", "parameters": ["id"] }
        ],
        "storage": ["intel.db"]
    })
}
