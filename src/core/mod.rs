pub mod broker;
pub mod db;
pub mod error;
pub mod page;
pub mod schemas;
pub mod session;
pub mod store;
pub mod time;
