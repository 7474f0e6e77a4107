use crate::core::page::PageError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeadboxError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Page automation error: {0}")]
    PageError(#[from] PageError),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
}
