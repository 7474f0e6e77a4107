//! Leadbox: a local-first lead intelligence pipeline.
//!
//! **Leadbox watches a remote conversation inbox and turns it into structured,
//! queryable lead state — all persisted locally.**
//!
//! Three cooperating flows share two SQLite bins under one store root:
//!
//! - **Passive scanning**: a background scheduler drives periodic scans under a
//!   persisted on/off flag and interval; each scan matches watchlist terms
//!   against visible inbox rows and persists new matches without duplication.
//! - **Harvesting**: a bounded, time-windowed indexer walks the inbox backward
//!   in time to discover conversation targets; a detail fetcher trims each
//!   conversation into a snippet that is imported as an order (unique by
//!   message text).
//! - **Classification**: an ordered pricing-rule pass extracts product, price,
//!   city, and street address from each order's free text and writes the
//!   fields back, idempotently.
//!
//! # Architecture
//!
//! - **Local-first**: all state lives in `intel.db` and `orders.db` under the
//!   store root; every mutation routes through the `DbBroker` and leaves an
//!   audit event in `broker.events.jsonl`.
//! - **Seam at the browser**: page automation is behind the [`core::page::PageSource`]
//!   trait. This crate ships no browser backend; scan and harvest are library
//!   APIs that accept an authenticated session, while the CLI covers the
//!   store-backed operator commands.
//! - **Coordination via the store**: the scheduler and the operator CLI never
//!   share in-process state; toggles are picked up at the next loop iteration.
//!
//! # Crate Structure
//!
//! - [`core`]: store plumbing (bins, broker, error type, page seam, session)
//! - [`pipeline`]: subsystem implementations (watchlist, autopilot, scanner,
//!   indexer, fetcher, harvest, orders, analyzer, leads)

pub mod core;
pub mod pipeline;
pub mod subsystems;

use crate::core::{db, error, session, store};
use crate::pipeline::{analyzer, autopilot, leads, orders, watchlist};

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "leadbox",
    version = env!("CARGO_PKG_VERSION"),
    about = "Local-first lead intelligence pipeline"
)]
struct Cli {
    /// Store root directory (default: $LEADBOX_HOME, else ~/.leadbox/data).
    #[clap(long, global = true)]
    dir: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize the store bins.
    Init,

    /// Universal watchlist of tracking phrases.
    Watch(watchlist::WatchCli),

    /// Background scanner state and interval.
    Autopilot(autopilot::AutopilotCli),

    /// Discovered watch-term matches.
    Leads(leads::LeadsCli),

    /// Imported conversation orders.
    Orders(orders::OrdersCli),

    /// Ordered pricing rules for classification.
    Pricing(analyzer::PricingCli),

    /// Run the classification pass over all stored orders.
    Analyze,

    /// Session artifact status.
    Auth(AuthCli),

    /// Print machine-readable subsystem descriptors.
    Schema,

    /// Print version.
    Version,
}

#[derive(clap::Args, Debug)]
struct AuthCli {
    #[clap(subcommand)]
    command: AuthCommand,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Report whether the session artifact is present.
    Status,
}

pub fn run() -> Result<(), error::LeadboxError> {
    let cli = Cli::parse();
    let root = store::resolve_root(cli.dir.clone());

    match cli.command {
        Command::Init => {
            db::initialize_all(&root)?;
            println!(
                "{} store initialized at {}",
                "leadbox".bright_cyan().bold(),
                root.display()
            );
            println!(
                "  {} bins: {}, {}",
                "▸".bright_cyan(),
                crate::core::schemas::INTEL_DB_NAME,
                crate::core::schemas::ORDERS_DB_NAME
            );
        }
        Command::Watch(watch_cli) => {
            watchlist::run_watch_cli(&root, watch_cli)?;
        }
        Command::Autopilot(ap_cli) => {
            autopilot::run_autopilot_cli(&root, ap_cli)?;
        }
        Command::Leads(leads_cli) => {
            leads::run_leads_cli(&root, leads_cli)?;
        }
        Command::Orders(orders_cli) => {
            orders::run_orders_cli(&root, orders_cli)?;
        }
        Command::Pricing(pricing_cli) => {
            analyzer::run_pricing_cli(&root, pricing_cli)?;
        }
        Command::Analyze => {
            let analyzed = analyzer::apply_pricing_logic(&root)?;
            println!(
                "{}",
                serde_json::json!({
                    "ts": crate::core::time::now_iso(),
                    "cmd": "analyze",
                    "orders": analyzed,
                    "status": "ok"
                })
            );
        }
        Command::Auth(auth_cli) => match auth_cli.command {
            AuthCommand::Status => {
                let present = session::has_session(&root);
                let label = if present {
                    "PRESENT".bright_green().bold()
                } else {
                    "ABSENT".bright_red().bold()
                };
                println!("Session artifact: {}", label);
                println!("Path:             {}", session::session_path(&root).display());
                if !present {
                    println!(
                        "  {} scans and harvests are no-ops until the automation layer saves one",
                        "▸".bright_yellow()
                    );
                }
            }
        },
        Command::Schema => {
            println!(
                "{}",
                serde_json::to_string_pretty(&subsystems::subsystem_schemas())
                    .unwrap_or_default()
            );
        }
        Command::Version => {
            println!("leadbox {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
