pub mod doctor;
pub mod inspect;
pub mod similar;
pub mod stats;
pub mod validate;
pub mod worker;

use anyhow::{Context, Result};
use rusqlite::Connection;

use neurovault::config::NeuroVaultConfig;

/// Open the configured database for a one-shot command.
fn open_store(config: &NeuroVaultConfig) -> Result<Connection> {
    let db_path = config.resolved_db_path();
    neurovault::db::open_database(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))
}
