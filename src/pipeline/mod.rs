pub mod analyzer;
pub mod autopilot;
pub mod fetcher;
pub mod harvest;
pub mod indexer;
pub mod leads;
pub mod orders;
pub mod scanner;
pub mod watchlist;
