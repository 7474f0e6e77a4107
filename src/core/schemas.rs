//! Centralized database schema definitions for the leadbox consolidated bins.
//!
//! Leadbox uses 2 consolidated SQLite databases ("bins") to manage state:
//! 1. intel.db: Watchlist terms, the autopilot singleton state row, and lead matches.
//! 2. orders.db: Imported conversation orders and the ordered pricing-rule table.

// --- 1. Intel Bin ---
pub const INTEL_DB_NAME: &str = "intel.db";

pub const INTEL_DB_SCHEMA_WATCHLIST: &str = "
    CREATE TABLE IF NOT EXISTS watchlist (
        id TEXT PRIMARY KEY,
        word TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL
    )
";

// Singleton row, id is always 1. Full-row replace on every update.
pub const INTEL_DB_SCHEMA_SYSTEM_STATE: &str = "
    CREATE TABLE IF NOT EXISTS system_state (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        autopilot_active INTEGER NOT NULL,
        interval TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
";

pub const INTEL_DB_SEED_SYSTEM_STATE: &str =
    "INSERT OR IGNORE INTO system_state (id, autopilot_active, interval, updated_at)
     VALUES (1, 0, '1 hour', '')";

pub const INTEL_DB_SCHEMA_LEADS: &str = "
    CREATE TABLE IF NOT EXISTS leads (
        id TEXT PRIMARY KEY,
        user_profile TEXT NOT NULL,
        raw_message TEXT NOT NULL,
        keyword_found TEXT NOT NULL,
        scanned_at TEXT NOT NULL
    )
";

// --- 2. Orders Bin ---
pub const ORDERS_DB_NAME: &str = "orders.db";

pub const ORDERS_DB_SCHEMA_ORDERS: &str = "
    CREATE TABLE IF NOT EXISTS orders (
        id TEXT PRIMARY KEY,
        customer TEXT NOT NULL,
        raw_message TEXT NOT NULL UNIQUE,
        date_found TEXT NOT NULL,
        status TEXT NOT NULL,
        product TEXT,
        value REAL,
        address TEXT,
        city TEXT
    )
";

// Evaluation order is `position` ascending; order is configuration, not accident.
pub const ORDERS_DB_SCHEMA_PRICING_RULES: &str = "
    CREATE TABLE IF NOT EXISTS pricing_rules (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        price REAL NOT NULL,
        keywords TEXT NOT NULL,
        reply TEXT NOT NULL,
        position INTEGER NOT NULL
    )
";
