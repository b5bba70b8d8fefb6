//! Validation lifecycle: persist verdicts and move memory status.
//!
//! Every memory starts as `PENDING_VALIDATION`. Each recorded verdict appends a
//! history row and overwrites the status with `PASSED` or `FAILED`; the latest
//! verdict wins and earlier rows are kept for audit. The per-memory count and
//! running score average are folded in by the same transaction.

use anyhow::Result;
use rusqlite::Connection;

use super::Scorer;
use crate::error::NeuroVaultError;
use crate::memory::store;
use crate::memory::types::{MemoryStatus, Validation, Verdict};

/// Score `memory_id` with `scorer` and record the result as `validator`.
///
/// Returns `Ok(None)` when the memory does not exist; nothing is written in that case.
/// The read, duplicate count, insert, and status update share one transaction.
pub fn run_validation(
    conn: &mut Connection,
    memory_id: i64,
    validator: &str,
    scorer: &dyn Scorer,
) -> Result<Option<Validation>> {
    let tx = conn.transaction()?;

    let Some(memory) = store::find_memory(&tx, memory_id)? else {
        tracing::warn!(memory_id, validator, "validation skipped: memory not found");
        return Ok(None);
    };

    let duplicates = store::count_by_content_hash(&tx, &memory.content_hash)?;
    let card = scorer.score(&memory, duplicates);

    let validation = store::insert_validation(
        &tx,
        memory_id,
        validator,
        card.score,
        card.valid,
        Some(&card.reason),
    )?;
    store::record_score(&tx, memory_id, card.score)?;
    let status = MemoryStatus::from_verdict(card.valid);
    store::set_status(&tx, memory_id, status)?;
    tx.commit()?;

    tracing::info!(
        memory_id,
        validator,
        strategy = scorer.name(),
        score = card.score,
        status = %status,
        "memory validated"
    );
    Ok(Some(validation))
}

/// Persist a verdict computed elsewhere, without re-scoring.
///
/// Fails with [`NeuroVaultError::MemoryNotFound`] for an unknown memory.
pub fn submit_verdict(conn: &mut Connection, verdict: &Verdict) -> Result<Validation> {
    let tx = conn.transaction()?;

    if store::find_memory(&tx, verdict.memory_id)?.is_none() {
        return Err(NeuroVaultError::MemoryNotFound(verdict.memory_id).into());
    }

    let validation = store::insert_validation(
        &tx,
        verdict.memory_id,
        &verdict.validator,
        verdict.score,
        verdict.valid,
        verdict.reason.as_deref(),
    )?;
    store::record_score(&tx, verdict.memory_id, verdict.score)?;
    let status = MemoryStatus::from_verdict(verdict.valid);
    store::set_status(&tx, verdict.memory_id, status)?;
    tx.commit()?;

    tracing::info!(
        memory_id = verdict.memory_id,
        validator = %verdict.validator,
        score = verdict.score,
        status = %status,
        "verdict recorded"
    );
    Ok(validation)
}
