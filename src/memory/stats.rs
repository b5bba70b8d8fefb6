use anyhow::Result;
use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::memory::types::MemoryStatus;

/// Aggregate counts over the whole store.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_memories: i64,
    pub by_status: BTreeMap<String, i64>,
    pub total_validations: i64,
    pub distinct_agents: i64,
    /// Content hashes shared by more than one memory.
    pub duplicate_groups: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_memory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_memory: Option<String>,
}

/// Activity of one address, as a submitter and as a validator.
#[derive(Debug, Serialize, PartialEq)]
pub struct AgentStats {
    pub address: String,
    pub submission_count: i64,
    pub validation_count: i64,
    /// Mean score of the validations this address authored, truncated; 0 when none.
    pub avg_validation_score: i64,
}

/// Compute store-wide statistics.
pub fn memory_stats(conn: &Connection) -> Result<StatsResponse> {
    let total_memories: i64 =
        conn.query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))?;
    let total_validations: i64 =
        conn.query_row("SELECT COUNT(*) FROM validations", [], |row| row.get(0))?;
    let distinct_agents: i64 =
        conn.query_row("SELECT COUNT(DISTINCT agent) FROM memories", [], |row| row.get(0))?;
    let duplicate_groups: i64 = conn.query_row(
        "SELECT COUNT(*) FROM (SELECT content_hash FROM memories GROUP BY content_hash HAVING COUNT(*) > 1)",
        [],
        |row| row.get(0),
    )?;
    let (oldest_memory, newest_memory): (Option<String>, Option<String>) = conn.query_row(
        "SELECT MIN(created_at), MAX(created_at) FROM memories",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(StatsResponse {
        total_memories,
        by_status: count_by_status(conn)?,
        total_validations,
        distinct_agents,
        duplicate_groups,
        oldest_memory,
        newest_memory,
    })
}

/// Count by status; every status is present, zero if unused.
fn count_by_status(conn: &Connection) -> Result<BTreeMap<String, i64>> {
    let mut map: BTreeMap<String, i64> = MemoryStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();

    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM memories GROUP BY status")?;
    let rows: Vec<(String, i64)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    for (status, count) in rows {
        map.insert(status, count);
    }
    Ok(map)
}

/// Submission and validation activity for `address`.
pub fn agent_stats(conn: &Connection, address: &str) -> Result<AgentStats> {
    let submission_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM memories WHERE agent = ?1",
        params![address],
        |row| row.get(0),
    )?;
    let (validation_count, avg): (i64, Option<f64>) = conn.query_row(
        "SELECT COUNT(*), AVG(score) FROM validations WHERE validator = ?1",
        params![address],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(AgentStats {
        address: address.to_string(),
        submission_count,
        validation_count,
        avg_validation_score: avg.map(|a| a.trunc() as i64).unwrap_or(0),
    })
}
