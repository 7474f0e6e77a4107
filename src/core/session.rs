//! Session artifact presence check.
//!
//! The credential bundle (cookie/storage-state blob) is produced and refreshed
//! by the automation layer outside this crate. The pipeline only cares whether
//! it exists: a missing artifact makes scan/index/fetch a silent no-op, never
//! an error.

use std::path::{Path, PathBuf};

pub const SESSION_FILE: &str = "session.json";

pub fn session_path(root: &Path) -> PathBuf {
    root.join(SESSION_FILE)
}

pub fn has_session(root: &Path) -> bool {
    session_path(root).exists()
}
