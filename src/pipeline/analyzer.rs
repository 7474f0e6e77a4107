//! Rule-based classification pass over imported orders.
//!
//! Three independent extractions per order: product/price from the ordered
//! pricing-rule table (first match wins), city from a fixed priority town list,
//! and a street address from a number + street-suffix pattern. All four fields
//! are overwritten on every pass, so reruns are idempotent.

use crate::core::broker::DbBroker;
use crate::core::db;
use crate::core::error;
use crate::core::schemas;
use crate::core::time::now_iso;
use clap::{Parser, Subcommand};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use ulid::Ulid;

pub const PRODUCT_UNSURE: &str = "Unsure";
pub const CITY_UNKNOWN: &str = "Unknown";
pub const REGION: &str = "TX";

/// Towns checked in priority order; the first case-insensitive hit wins.
pub const TOWNS: &[&str] = &["Longview", "Tyler", "Marshall", "Kilgore", "Gladewater"];

/// Number + word(s) + common street-suffix token.
static STREET_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d{2,5}\s\w+\s?(?:St|Ave|Rd|Dr|Hwy|Ln|Blvd)\w*").unwrap()
});

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PricingRule {
    pub id: String,
    pub name: String,
    pub price: f64,
    /// Comma-separated keyword terms; any one of them matching selects the rule.
    pub keywords: String,
    pub reply: String,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub product: String,
    pub value: f64,
}

/// First rule (by position) any of whose keyword terms is a case-insensitive
/// substring of `text`. Rule order is a total determinant: an earlier rule wins
/// even when a later rule's keyword also appears.
pub fn classify(text: &str, rules: &[PricingRule]) -> Classification {
    let haystack = text.to_lowercase();
    for rule in rules {
        let hit = rule
            .keywords
            .split(',')
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .any(|k| haystack.contains(&k));
        if hit {
            return Classification {
                product: rule.name.clone(),
                value: rule.price,
            };
        }
    }
    Classification {
        product: PRODUCT_UNSURE.to_string(),
        value: 0.0,
    }
}

/// Town-list scan in fixed priority order; "Unknown" when nothing matches.
pub fn match_city(text: &str) -> &'static str {
    let haystack = text.to_lowercase();
    TOWNS
        .iter()
        .find(|t| haystack.contains(&t.to_lowercase()))
        .copied()
        .unwrap_or(CITY_UNKNOWN)
}

/// Heuristic street-address extraction. A known city gets appended as
/// ", city, region"; an unknown one leaves the bare street string.
pub fn extract_address(text: &str, city: &str) -> Option<String> {
    STREET_ADDRESS.find(text).map(|m| {
        if city != CITY_UNKNOWN {
            format!("{}, {}, {}", m.as_str(), city, REGION)
        } else {
            m.as_str().to_string()
        }
    })
}

/// Run the classification pass over every stored order and write the fields
/// back. Returns the number of orders analyzed.
pub fn apply_pricing_logic(root: &Path) -> Result<usize, error::LeadboxError> {
    let rules = list_rules(root)?;
    let all = crate::pipeline::orders::fetch_all(root)?;
    let count = all.len();
    for order in all {
        let text = &order.raw_message;
        let class = classify(text, &rules);
        let city = match_city(text);
        let address = extract_address(text, city);
        crate::pipeline::orders::update_analysis(
            root,
            &order.id,
            &class.product,
            class.value,
            address.as_deref(),
            city,
        )?;
    }
    Ok(count)
}

/// Append a rule after the current last position.
pub fn add_rule(
    root: &Path,
    name: &str,
    price: f64,
    keywords: &str,
    reply: &str,
) -> Result<String, error::LeadboxError> {
    if keywords.split(',').all(|k| k.trim().is_empty()) {
        return Err(error::LeadboxError::ValidationError(
            "pricing rule needs at least one keyword".to_string(),
        ));
    }
    let broker = DbBroker::new(root);
    broker.with_conn(&db::orders_db_path(root), "pricing.add", |conn| {
        conn.execute(schemas::ORDERS_DB_SCHEMA_PRICING_RULES, [])?;
        let next_pos: i64 = conn.query_row(
            "SELECT COALESCE(MAX(position), -1) + 1 FROM pricing_rules",
            [],
            |row| row.get(0),
        )?;
        let id = Ulid::new().to_string();
        conn.execute(
            "INSERT INTO pricing_rules (id, name, price, keywords, reply, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![id, name, price, keywords, reply, next_pos],
        )?;
        Ok(id)
    })
}

/// Rules in evaluation order.
pub fn list_rules(root: &Path) -> Result<Vec<PricingRule>, error::LeadboxError> {
    let broker = DbBroker::new(root);
    broker.with_conn(&db::orders_db_path(root), "pricing.list", |conn| {
        conn.execute(schemas::ORDERS_DB_SCHEMA_PRICING_RULES, [])?;
        let mut stmt = conn.prepare(
            "SELECT id, name, price, keywords, reply, position
             FROM pricing_rules ORDER BY position, rowid",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(PricingRule {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    price: row.get(2)?,
                    keywords: row.get(3)?,
                    reply: row.get(4)?,
                    position: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn remove_rule(root: &Path, id: &str) -> Result<(), error::LeadboxError> {
    let broker = DbBroker::new(root);
    let removed = broker.with_conn(&db::orders_db_path(root), "pricing.remove", |conn| {
        Ok(conn.execute("DELETE FROM pricing_rules WHERE id = ?1", [id])?)
    })?;
    if removed == 0 {
        return Err(error::LeadboxError::NotFound(format!("pricing rule {}", id)));
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[clap(name = "pricing", about = "Manage the ordered pricing-rule table.")]
pub struct PricingCli {
    #[clap(subcommand)]
    pub command: PricingCommand,
}

#[derive(Subcommand, Debug)]
pub enum PricingCommand {
    /// Append a rule (evaluated after all existing rules).
    Add {
        #[clap(long)]
        name: String,
        #[clap(long)]
        price: f64,
        /// Comma-separated match terms, e.g. "full cord, 1 cord".
        #[clap(long)]
        keywords: String,
        #[clap(long, default_value = "")]
        reply: String,
    },
    /// List rules in evaluation order.
    List,
    /// Remove a rule by id.
    Remove {
        #[clap(long)]
        id: String,
    },
}

pub fn run_pricing_cli(root: &Path, cli: PricingCli) -> Result<(), error::LeadboxError> {
    match cli.command {
        PricingCommand::Add {
            name,
            price,
            keywords,
            reply,
        } => {
            let id = add_rule(root, &name, price, &keywords, &reply)?;
            println!(
                "{}",
                serde_json::json!({ "ts": now_iso(), "cmd": "pricing.add", "id": id, "status": "ok" })
            );
        }
        PricingCommand::List => {
            let rules = list_rules(root)?;
            println!("{}", serde_json::to_string_pretty(&rules).unwrap_or_default());
        }
        PricingCommand::Remove { id } => {
            remove_rule(root, &id)?;
            println!(
                "{}",
                serde_json::json!({ "ts": now_iso(), "cmd": "pricing.remove", "id": id, "status": "ok" })
            );
        }
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "analyzer",
        "version": "0.1.0",
        "description": "Ordered-rule classification of orders (product, price, city, address)",
        "commands": [
            { "name": "analyze", "parameters": [] },
            { "name": "pricing.add", "parameters": ["name", "price", "keywords", "reply"] },
            { "name": "pricing.list", "parameters": [] },
            { "name": "pricing.remove", "parameters": ["id"] }
        ],
        "storage": ["orders.db"]
    })
}
