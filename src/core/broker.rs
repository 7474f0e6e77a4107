use crate::core::db;
use crate::core::error;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use ulid::Ulid;

/// The DB Broker is the single access path for state mutation.
/// In-process serialized connections plus a JSONL audit trail per operation.
pub struct DbBroker {
    audit_log_path: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BrokerEvent {
    pub ts: String,
    pub event_id: String,
    pub op: String,
    pub db_id: String,
    pub status: String,
}

impl DbBroker {
    pub fn new(root: &Path) -> Self {
        Self {
            audit_log_path: root.join("broker.events.jsonl"),
        }
    }

    /// Execute a closure with a serialized connection to the specified DB bin.
    pub fn with_conn<F, R>(
        &self,
        db_path: &Path,
        op_name: &str,
        f: F,
    ) -> Result<R, error::LeadboxError>
    where
        F: FnOnce(&Connection) -> Result<R, error::LeadboxError>,
    {
        // Global lock: the scheduler thread and the operator CLI context must
        // never interleave writes to the same bin within one process.
        static DB_LOCK: Mutex<()> = Mutex::new(());
        let _lock = DB_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let db_id = db_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let conn = db::db_connect(&db_path.to_string_lossy())?;

        let result = f(&conn);

        let status = if result.is_ok() { "success" } else { "error" };
        self.log_event(op_name, &db_id, status)?;

        result
    }

    fn log_event(&self, op: &str, db_id: &str, status: &str) -> Result<(), error::LeadboxError> {
        use std::fs::OpenOptions;
        use std::io::Write;

        let ev = BrokerEvent {
            ts: crate::core::time::now_iso(),
            event_id: Ulid::new().to_string(),
            op: op.to_string(),
            db_id: db_id.to_string(),
            status: status.to_string(),
        };

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_log_path)
            .map_err(error::LeadboxError::IoError)?;

        writeln!(f, "{}", serde_json::to_string(&ev).unwrap_or_default())
            .map_err(error::LeadboxError::IoError)?;
        Ok(())
    }

    pub fn audit_log_path(&self) -> &Path {
        &self.audit_log_path
    }
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "broker",
        "version": "0.1.0",
        "description": "State mutation broker and audit trail",
        "commands": [
            { "name": "audit", "description": "Show the mutation audit log" }
        ],
        "storage": ["broker.events.jsonl"]
    })
}
