use crate::core::broker::DbBroker;
use crate::core::db;
use crate::core::error;
use crate::core::schemas;
use crate::core::time::now_iso;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use ulid::Ulid;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LeadRecord {
    pub id: String,
    pub user_profile: String,
    pub raw_message: String,
    pub keyword_found: String,
    pub scanned_at: String,
}

#[derive(Parser, Debug)]
#[clap(name = "leads", about = "Inspect and export discovered watch-term matches.")]
pub struct LeadsCli {
    #[clap(subcommand)]
    pub command: LeadsCommand,
}

#[derive(Subcommand, Debug)]
pub enum LeadsCommand {
    /// List leads, newest first.
    List,
    /// Export all leads as CSV.
    Export {
        #[clap(long)]
        out: PathBuf,
    },
}

/// Insert a lead unless a record with the same `(user_profile, raw_message)`
/// pair exists. Returns true when a new row was created. The check-then-insert
/// runs inside one serialized connection.
pub fn insert_lead_if_absent(
    root: &Path,
    user_profile: &str,
    raw_message: &str,
    keyword_found: &str,
    scanned_at: &str,
) -> Result<bool, error::LeadboxError> {
    let broker = DbBroker::new(root);
    broker.with_conn(&db::intel_db_path(root), "leads.insert", |conn| {
        conn.execute(schemas::INTEL_DB_SCHEMA_LEADS, [])?;
        let exists: bool = conn
            .query_row(
                "SELECT 1 FROM leads WHERE user_profile = ?1 AND raw_message = ?2",
                rusqlite::params![user_profile, raw_message],
                |_| Ok(()),
            )
            .map(|_| true)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(false),
                other => Err(other),
            })?;
        if exists {
            return Ok(false);
        }
        conn.execute(
            "INSERT INTO leads (id, user_profile, raw_message, keyword_found, scanned_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                Ulid::new().to_string(),
                user_profile,
                raw_message,
                keyword_found,
                scanned_at
            ],
        )?;
        Ok(true)
    })
}

pub fn list_leads(root: &Path) -> Result<Vec<LeadRecord>, error::LeadboxError> {
    let broker = DbBroker::new(root);
    broker.with_conn(&db::intel_db_path(root), "leads.list", |conn| {
        conn.execute(schemas::INTEL_DB_SCHEMA_LEADS, [])?;
        let mut stmt = conn.prepare(
            "SELECT id, user_profile, raw_message, keyword_found, scanned_at
             FROM leads ORDER BY rowid DESC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(LeadRecord {
                    id: row.get(0)?,
                    user_profile: row.get(1)?,
                    raw_message: row.get(2)?,
                    keyword_found: row.get(3)?,
                    scanned_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

fn csv_field(value: &str) -> String {
    if value.contains(['"', ',', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn export_csv(root: &Path, out: &Path) -> Result<usize, error::LeadboxError> {
    let records = list_leads(root)?;
    let mut body = String::from("id,scanned_at,user_profile,keyword_found,raw_message\n");
    for r in &records {
        body.push_str(&format!(
            "{},{},{},{},{}\n",
            csv_field(&r.id),
            csv_field(&r.scanned_at),
            csv_field(&r.user_profile),
            csv_field(&r.keyword_found),
            csv_field(&r.raw_message),
        ));
    }
    std::fs::write(out, body).map_err(error::LeadboxError::IoError)?;
    Ok(records.len())
}

pub fn run_leads_cli(root: &Path, cli: LeadsCli) -> Result<(), error::LeadboxError> {
    match cli.command {
        LeadsCommand::List => {
            let records = list_leads(root)?;
            println!("{}", serde_json::to_string_pretty(&records).unwrap_or_default());
        }
        LeadsCommand::Export { out } => {
            let count = export_csv(root, &out)?;
            println!(
                "{}",
                serde_json::json!({
                    "ts": now_iso(),
                    "cmd": "leads.export",
                    "out": out.display().to_string(),
                    "rows": count,
                    "status": "ok"
                })
            );
        }
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "leads",
        "version": "0.1.0",
        "description": "Persisted watch-term matches",
        "commands": [
            { "name": "list", "parameters": [] },
            { "name": "export", "parameters": ["out"] }
        ],
        "storage": ["intel.db"]
    })
}
