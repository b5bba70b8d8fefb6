//! Forward-only schema migrations and fingerprint upkeep.
//!
//! `schema_meta.schema_version` tracks the layout; each step runs in its own
//! transaction. After the layout is current, [`run_migrations`] also
//! re-fingerprints rows written under an older `fingerprint_scheme`.

use std::collections::BTreeMap;

use rusqlite::{params, Connection, OptionalExtension};

use crate::embedding::{self, FINGERPRINT_SCHEME};
use crate::memory::store::next_average;

/// The schema version that the current binary expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    let val: String = conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'schema_version'",
        [],
        |row| row.get(0),
    )?;
    Ok(val.parse::<u32>().unwrap_or(0))
}

/// The scheme that produced the cached `memories.embedding` values, if recorded.
pub fn get_fingerprint_scheme(conn: &Connection) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'fingerprint_scheme'",
        [],
        |row| row.get(0),
    )
    .optional()
}

/// Bring the database to [`CURRENT_SCHEMA_VERSION`], then refresh stale fingerprints.
pub fn run_migrations(conn: &mut Connection) -> rusqlite::Result<()> {
    let mut version = get_schema_version(conn)?;
    tracing::debug!(
        schema_version = version,
        target = CURRENT_SCHEMA_VERSION,
        "checking migrations"
    );

    while version < CURRENT_SCHEMA_VERSION {
        let next = version + 1;
        tracing::info!(from = version, to = next, "running migration");

        let tx = conn.transaction()?;
        match next {
            2 => add_validation_aggregates(&tx)?,
            _ => {
                tracing::error!(version = next, "unknown migration target");
                break;
            }
        }
        tx.execute(
            "UPDATE schema_meta SET value = ?1 WHERE key = 'schema_version'",
            [next.to_string()],
        )?;
        tx.commit()?;

        version = next;
    }

    let tx = conn.transaction()?;
    refresh_fingerprints(&tx)?;
    tx.commit()
}

/// v1 → v2: per-memory `validation_count` and `avg_score`, replayed from history.
fn add_validation_aggregates(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "ALTER TABLE memories ADD COLUMN validation_count INTEGER NOT NULL DEFAULT 0;
         ALTER TABLE memories ADD COLUMN avg_score REAL NOT NULL DEFAULT 0;",
    )?;

    let mut totals: BTreeMap<i64, (i64, f64)> = BTreeMap::new();
    {
        let mut stmt = conn.prepare("SELECT memory_id, score FROM validations ORDER BY id")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?)))?;
        for row in rows {
            let (memory_id, score) = row?;
            let (count, avg) = totals.entry(memory_id).or_insert((0, 0.0));
            *avg = next_average(*avg, *count, score);
            *count += 1;
        }
    }

    for (memory_id, (count, avg)) in &totals {
        conn.execute(
            "UPDATE memories SET validation_count = ?1, avg_score = ?2 WHERE id = ?3",
            params![count, avg, memory_id],
        )?;
    }
    tracing::info!(memories = totals.len(), "validation aggregates backfilled");
    Ok(())
}

/// Recompute every cached fingerprint when the recorded scheme is not the current one.
/// Returns the number of rows rewritten.
fn refresh_fingerprints(conn: &Connection) -> rusqlite::Result<usize> {
    let stored = get_fingerprint_scheme(conn)?;
    if stored.as_deref() == Some(FINGERPRINT_SCHEME) {
        return Ok(0);
    }

    let rows: Vec<(i64, String)> = {
        let mut stmt = conn.prepare("SELECT id, summary FROM memories ORDER BY id")?;
        let collected = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        collected
    };
    for (id, summary) in &rows {
        let encoded = embedding::encode_fingerprint(&embedding::fingerprint(summary));
        conn.execute(
            "UPDATE memories SET embedding = ?1 WHERE id = ?2",
            params![encoded, id],
        )?;
    }

    conn.execute(
        "INSERT OR REPLACE INTO schema_meta (key, value) VALUES ('fingerprint_scheme', ?1)",
        [FINGERPRINT_SCHEME],
    )?;
    if !rows.is_empty() {
        tracing::warn!(
            previous = stored.as_deref().unwrap_or("(none)"),
            current = FINGERPRINT_SCHEME,
            rows = rows.len(),
            "re-fingerprinted memories written under another scheme"
        );
    }
    Ok(rows.len())
}
