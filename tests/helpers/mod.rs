#![allow(dead_code)]

use std::sync::Arc;

use neurovault::config::NeuroVaultConfig;
use neurovault::db;
use neurovault::memory::store::create_memory;
use neurovault::memory::types::NewMemory;
use neurovault::server::AppState;
use neurovault::validation::queue::{ValidationJob, ValidationQueue};
use rusqlite::Connection;
use tokio::sync::mpsc::UnboundedReceiver;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::open_memory_database().unwrap()
}

/// Insert a memory with the default category. Returns its id.
pub fn insert_memory(conn: &Connection, title: &str, summary: &str) -> i64 {
    create_memory(conn, &NewMemory::new("tester", title, summary)).unwrap()
}

/// A 300-char summary containing the keywords "research" and "note".
pub fn passing_summary() -> String {
    let mut s = String::from("research note ");
    s.push_str(&"x".repeat(300 - s.len()));
    s
}

/// App state over a fresh in-memory store. The receiver is returned instead of
/// a running worker so tests decide when queued jobs run.
pub fn test_state(config: NeuroVaultConfig) -> (AppState, UnboundedReceiver<ValidationJob>) {
    let db = db::shared(test_db());
    let (queue, rx) = ValidationQueue::channel();
    (AppState::new(db, queue, Arc::new(config)), rx)
}
