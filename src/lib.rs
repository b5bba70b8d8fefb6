//! Memory validation, fingerprinting, and similarity search for AI agents.
//!
//! NeuroVault accepts short textual memories (title + summary) from agents,
//! stores them in SQLite, and moves each one through a validation lifecycle:
//! `PENDING_VALIDATION` until a verdict arrives, then `PASSED` or `FAILED`.
//! Every verdict is appended to an audit history; the latest one decides the status.
//!
//! # Architecture
//!
//! - **Storage**: SQLite via rusqlite, one shared connection behind a mutex
//! - **Fingerprints**: deterministic 8-dim vectors derived from SHA-256, cached per memory
//! - **Search**: cosine similarity over cached fingerprints
//! - **Validation**: two heuristics on distinct scales (internal 0–100, external 0–1000)
//! - **Transport**: REST over axum with MCP on `/mcp`, or MCP over stdio
//! - **Worker**: a polling validator that scores remotely and posts verdicts back
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, migrations, and health checks
//! - [`embedding`]: Fingerprint and content-hash functions
//! - [`memory`]: Store operations, similarity ranking, and statistics
//! - [`validation`]: Scoring strategies, lifecycle, and the background queue
//! - [`server`] / [`tools`]: HTTP routes and MCP tools
//! - [`worker`]: The polling validator client

pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod memory;
pub mod server;
pub mod tools;
pub mod validation;
pub mod worker;
