use crate::core::broker::DbBroker;
use crate::core::error;
use crate::core::schemas;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

pub fn db_connect(db_path: &str) -> Result<Connection, error::LeadboxError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(error::LeadboxError::RusqliteError)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(error::LeadboxError::RusqliteError)?;
    conn.execute("PRAGMA foreign_keys=ON;", [])
        .map_err(error::LeadboxError::RusqliteError)?;
    Ok(conn)
}

pub fn intel_db_path(root: &Path) -> PathBuf {
    root.join(schemas::INTEL_DB_NAME)
}

pub fn orders_db_path(root: &Path) -> PathBuf {
    root.join(schemas::ORDERS_DB_NAME)
}

pub fn initialize_intel_db(root: &Path) -> Result<(), error::LeadboxError> {
    fs::create_dir_all(root).map_err(error::LeadboxError::IoError)?;
    let broker = DbBroker::new(root);
    broker.with_conn(&intel_db_path(root), "intel.init", |conn| {
        conn.execute(schemas::INTEL_DB_SCHEMA_WATCHLIST, [])?;
        conn.execute(schemas::INTEL_DB_SCHEMA_SYSTEM_STATE, [])?;
        conn.execute(schemas::INTEL_DB_SEED_SYSTEM_STATE, [])?;
        conn.execute(schemas::INTEL_DB_SCHEMA_LEADS, [])?;
        Ok(())
    })
}

pub fn initialize_orders_db(root: &Path) -> Result<(), error::LeadboxError> {
    fs::create_dir_all(root).map_err(error::LeadboxError::IoError)?;
    let broker = DbBroker::new(root);
    broker.with_conn(&orders_db_path(root), "orders.init", |conn| {
        conn.execute(schemas::ORDERS_DB_SCHEMA_ORDERS, [])?;
        conn.execute(schemas::ORDERS_DB_SCHEMA_PRICING_RULES, [])?;
        Ok(())
    })
}

// Subsystems own their schemas; both bins are created up front by `leadbox init`
// and re-ensured lazily by the subsystems that touch them.
pub fn initialize_all(root: &Path) -> Result<(), error::LeadboxError> {
    initialize_intel_db(root)?;
    initialize_orders_db(root)?;
    Ok(())
}
