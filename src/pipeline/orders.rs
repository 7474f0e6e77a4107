use crate::core::broker::DbBroker;
use crate::core::db;
use crate::core::error;
use crate::core::schemas;
use crate::core::time::now_iso;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::Path;
use ulid::Ulid;

pub const STATUS_NEW: &str = "New";
pub const STATUS_ANALYZED: &str = "Analyzed";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OrderRecord {
    pub id: String,
    pub customer: String,
    pub raw_message: String,
    pub date_found: String,
    pub status: String,
    pub product: Option<String>,
    pub value: Option<f64>,
    pub address: Option<String>,
    pub city: Option<String>,
}

#[derive(Parser, Debug)]
#[clap(name = "orders", about = "Inspect and prune imported conversation orders.")]
pub struct OrdersCli {
    #[clap(subcommand)]
    pub command: OrdersCommand,
}

#[derive(Subcommand, Debug)]
pub enum OrdersCommand {
    /// List orders in import order.
    List {
        /// Filter by status ("New" or "Analyzed").
        #[clap(long)]
        status: Option<String>,
    },
    /// Delete an order by id.
    Delete {
        #[clap(long)]
        id: String,
    },
}

/// Insert a new order with status "New". A duplicate `raw_message` is an
/// expected rejection, reported as `Ok(false)`.
pub fn save_order(
    root: &Path,
    customer: &str,
    raw_message: &str,
    date_found: &str,
) -> Result<bool, error::LeadboxError> {
    let broker = DbBroker::new(root);
    broker.with_conn(&db::orders_db_path(root), "orders.save", |conn| {
        conn.execute(schemas::ORDERS_DB_SCHEMA_ORDERS, [])?;
        let inserted = conn.execute(
            "INSERT INTO orders (id, customer, raw_message, date_found, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                Ulid::new().to_string(),
                customer,
                raw_message,
                date_found,
                STATUS_NEW
            ],
        );
        match inserted {
            Ok(_) => Ok(true),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    })
}

pub fn fetch_all(root: &Path) -> Result<Vec<OrderRecord>, error::LeadboxError> {
    let broker = DbBroker::new(root);
    broker.with_conn(&db::orders_db_path(root), "orders.fetch_all", |conn| {
        conn.execute(schemas::ORDERS_DB_SCHEMA_ORDERS, [])?;
        let mut stmt = conn.prepare(
            "SELECT id, customer, raw_message, date_found, status, product, value, address, city
             FROM orders ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(OrderRecord {
                    id: row.get(0)?,
                    customer: row.get(1)?,
                    raw_message: row.get(2)?,
                    date_found: row.get(3)?,
                    status: row.get(4)?,
                    product: row.get(5)?,
                    value: row.get(6)?,
                    address: row.get(7)?,
                    city: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Write back the classification pass result. Fields are overwritten, not
/// appended; rerunning the pass reproduces the same row.
pub fn update_analysis(
    root: &Path,
    order_id: &str,
    product: &str,
    value: f64,
    address: Option<&str>,
    city: &str,
) -> Result<(), error::LeadboxError> {
    let broker = DbBroker::new(root);
    broker.with_conn(&db::orders_db_path(root), "orders.analyze", |conn| {
        conn.execute(
            "UPDATE orders SET product = ?1, value = ?2, address = ?3, city = ?4, status = ?5
             WHERE id = ?6",
            rusqlite::params![product, value, address, city, STATUS_ANALYZED, order_id],
        )?;
        Ok(())
    })
}

pub fn delete_order(root: &Path, order_id: &str) -> Result<(), error::LeadboxError> {
    let broker = DbBroker::new(root);
    let removed = broker.with_conn(&db::orders_db_path(root), "orders.delete", |conn| {
        Ok(conn.execute("DELETE FROM orders WHERE id = ?1", [order_id])?)
    })?;
    if removed == 0 {
        return Err(error::LeadboxError::NotFound(format!("order {}", order_id)));
    }
    Ok(())
}

pub fn run_orders_cli(root: &Path, cli: OrdersCli) -> Result<(), error::LeadboxError> {
    match cli.command {
        OrdersCommand::List { status } => {
            let mut records = fetch_all(root)?;
            if let Some(s) = status {
                records.retain(|r| r.status == s);
            }
            println!("{}", serde_json::to_string_pretty(&records).unwrap_or_default());
        }
        OrdersCommand::Delete { id } => {
            delete_order(root, &id)?;
            println!(
                "{}",
                serde_json::json!({ "ts": now_iso(), "cmd": "orders.delete", "id": id, "status": "ok" })
            );
        }
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "orders",
        "version": "0.1.0",
        "description": "Imported conversation orders",
        "commands": [
            { "name": "list", "parameters": ["status"] },
            { "name": "delete", "parameters": ["id"] }
        ],
        "storage": ["orders.db"]
    })
}
