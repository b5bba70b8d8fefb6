//! Domain error conditions that callers need to tell apart.
//!
//! Most failures in NeuroVault travel as [`anyhow::Error`]; the variants here are
//! the ones the HTTP and MCP layers inspect via `downcast_ref` to pick a response.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NeuroVaultError {
    /// The addressed memory id does not exist.
    #[error("memory not found: {0}")]
    MemoryNotFound(i64),

    /// A status string that is not one of the three lifecycle states.
    #[error("unknown memory status: {0}")]
    UnknownStatus(String),
}

/// Returns the missing memory id if `err` is (or wraps) a not-found condition.
pub fn not_found_id(err: &anyhow::Error) -> Option<i64> {
    match err.downcast_ref::<NeuroVaultError>() {
        Some(NeuroVaultError::MemoryNotFound(id)) => Some(*id),
        _ => None,
    }
}
