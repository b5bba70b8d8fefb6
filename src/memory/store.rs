//! Row-level store operations for memories and validations.
//!
//! [`create_memory`] is the write path for submissions: it resolves the input aliases,
//! fingerprints the summary, derives the content hash, and inserts the row as
//! `PENDING_VALIDATION`. The remaining functions are the get/put/list/aggregate
//! primitives the lifecycle manager and the HTTP layer build on.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::embedding;
use crate::error::NeuroVaultError;
use crate::memory::types::{Memory, MemoryStatus, NewMemory, Validation, VALIDATION_QUORUM};

const MEMORY_COLUMNS: &str = "id, agent, title, summary, category, metadata, cid, \
                              content_hash, embedding, status, created_at, \
                              validation_count, avg_score";

const VALIDATION_COLUMNS: &str = "id, memory_id, validator, score, valid, reason, created_at";

/// Filters for [`list_memories`]. `None` fields are not applied.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub status: Option<MemoryStatus>,
    pub agent: Option<String>,
    pub category: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl ListFilter {
    pub fn with_limit(limit: i64) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }
}

/// Insert a new memory and return its id.
pub fn create_memory(conn: &Connection, input: &NewMemory) -> Result<i64> {
    let title = input.title_text();
    let summary = input.summary_text();

    let fingerprint = embedding::encode_fingerprint(&embedding::fingerprint(summary));
    let content_hash = match input.content_hash.as_deref() {
        Some(supplied) if !supplied.is_empty() => supplied.to_string(),
        _ => embedding::content_hash(summary, title),
    };
    let metadata = serde_json::to_string(&input.metadata.clone().unwrap_or_default())
        .context("failed to serialize metadata")?;
    let now = chrono::Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO memories (agent, title, summary, category, metadata, cid, content_hash, embedding, status, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            input.resolved_agent(),
            title,
            summary,
            input.resolved_category(),
            metadata,
            input.resolved_cid(),
            content_hash,
            fingerprint,
            MemoryStatus::PendingValidation.as_str(),
            now,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Fetch a memory, or `None` if the id does not exist.
pub fn find_memory(conn: &Connection, memory_id: i64) -> Result<Option<Memory>> {
    let sql = format!("SELECT {MEMORY_COLUMNS} FROM memories WHERE id = ?1");
    let memory = conn
        .query_row(&sql, params![memory_id], memory_from_row)
        .optional()?;
    Ok(memory)
}

/// Fetch a memory, failing with [`NeuroVaultError::MemoryNotFound`] if it does not exist.
pub fn get_memory(conn: &Connection, memory_id: i64) -> Result<Memory> {
    find_memory(conn, memory_id)?.ok_or_else(|| NeuroVaultError::MemoryNotFound(memory_id).into())
}

/// List memories newest first.
pub fn list_memories(conn: &Connection, filter: &ListFilter) -> Result<Vec<Memory>> {
    let mut clauses: Vec<&str> = Vec::new();
    let mut values: Vec<String> = Vec::new();

    if let Some(status) = filter.status {
        clauses.push("status = ?");
        values.push(status.as_str().to_string());
    }
    if let Some(ref agent) = filter.agent {
        clauses.push("agent = ?");
        values.push(agent.clone());
    }
    if let Some(ref category) = filter.category {
        clauses.push("category = ?");
        values.push(category.clone());
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    // SQLite treats a negative LIMIT as unbounded
    let sql = format!(
        "SELECT {MEMORY_COLUMNS} FROM memories {where_clause} ORDER BY id DESC LIMIT {} OFFSET {}",
        filter.limit,
        filter.offset.max(0),
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(values.iter()), memory_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// All memories submitted by `agent`, newest first.
pub fn memories_by_agent(conn: &Connection, agent: &str) -> Result<Vec<Memory>> {
    let sql = format!("SELECT {MEMORY_COLUMNS} FROM memories WHERE agent = ?1 ORDER BY id DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![agent], memory_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Memories with fewer than [`VALIDATION_QUORUM`] validations, oldest first.
pub fn unvalidated_memories(conn: &Connection, limit: i64) -> Result<Vec<Memory>> {
    let sql = format!(
        "SELECT {MEMORY_COLUMNS} FROM memories WHERE validation_count < ?1 ORDER BY id ASC LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![VALIDATION_QUORUM, limit], memory_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Number of memories sharing `content_hash`, including the one being scored.
pub fn count_by_content_hash(conn: &Connection, content_hash: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM memories WHERE content_hash = ?1",
        params![content_hash],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Overwrite a memory's status. Returns `false` if no row matched.
pub fn set_status(conn: &Connection, memory_id: i64, status: MemoryStatus) -> Result<bool> {
    let rows = conn.execute(
        "UPDATE memories SET status = ?1 WHERE id = ?2",
        params![status.as_str(), memory_id],
    )?;
    Ok(rows > 0)
}

/// Running mean after one more score, truncated toward zero.
pub fn next_average(avg: f64, count: i64, score: f64) -> f64 {
    ((avg * count as f64 + score) / (count + 1) as f64).trunc()
}

/// Fold `score` into the memory's `validation_count` and `avg_score`.
/// Returns the new `(count, avg)`, or `None` if no row matched.
pub fn record_score(conn: &Connection, memory_id: i64, score: f64) -> Result<Option<(i64, f64)>> {
    let current: Option<(i64, f64)> = conn
        .query_row(
            "SELECT validation_count, avg_score FROM memories WHERE id = ?1",
            params![memory_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    let Some((count, avg)) = current else {
        return Ok(None);
    };

    let updated = (count + 1, next_average(avg, count, score));
    conn.execute(
        "UPDATE memories SET validation_count = ?1, avg_score = ?2 WHERE id = ?3",
        params![updated.0, updated.1, memory_id],
    )?;
    Ok(Some(updated))
}

/// Append a validation record and return it.
pub fn insert_validation(
    conn: &Connection,
    memory_id: i64,
    validator: &str,
    score: f64,
    valid: bool,
    reason: Option<&str>,
) -> Result<Validation> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO validations (memory_id, validator, score, valid, reason, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![memory_id, validator, score, valid, reason, now],
    )?;

    Ok(Validation {
        id: conn.last_insert_rowid(),
        memory_id,
        validator: validator.to_string(),
        score,
        valid,
        reason: reason.map(str::to_string),
        created_at: now,
    })
}

/// Validation history, newest first. `memory_id = None` lists across all memories.
pub fn list_validations(
    conn: &Connection,
    memory_id: Option<i64>,
    limit: i64,
) -> Result<Vec<Validation>> {
    let limit = limit.max(0);
    let rows = match memory_id {
        Some(id) => {
            let sql = format!(
                "SELECT {VALIDATION_COLUMNS} FROM validations WHERE memory_id = ?1 ORDER BY id DESC LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![id, limit], validation_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
        None => {
            let sql = format!(
                "SELECT {VALIDATION_COLUMNS} FROM validations ORDER BY id DESC LIMIT ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![limit], validation_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        }
    };
    Ok(rows)
}

/// `(id, title, summary, embedding)` for every memory in id order, for similarity ranking.
pub fn similarity_candidates(
    conn: &Connection,
) -> Result<Vec<(i64, String, String, Option<Vec<f64>>)>> {
    let mut stmt =
        conn.prepare("SELECT id, title, summary, embedding FROM memories ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| {
            let raw: Option<String> = row.get(3)?;
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                embedding::decode_fingerprint(raw.as_deref()),
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn memory_from_row(row: &Row<'_>) -> rusqlite::Result<Memory> {
    let metadata_str: String = row.get(5)?;
    let embedding_str: Option<String> = row.get(8)?;
    let status_str: String = row.get(9)?;
    let status = status_str.parse::<MemoryStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let validation_count: i64 = row.get(11)?;

    Ok(Memory {
        id: row.get(0)?,
        agent: row.get(1)?,
        title: row.get(2)?,
        summary: row.get(3)?,
        category: row.get(4)?,
        metadata: serde_json::from_str(&metadata_str).unwrap_or_default(),
        cid: row.get(6)?,
        content_hash: row.get(7)?,
        embedding: embedding::decode_fingerprint(embedding_str.as_deref()),
        status,
        created_at: row.get(10)?,
        validation_count,
        avg_score: row.get(12)?,
        validated: validation_count >= VALIDATION_QUORUM,
    })
}

fn validation_from_row(row: &Row<'_>) -> rusqlite::Result<Validation> {
    Ok(Validation {
        id: row.get(0)?,
        memory_id: row.get(1)?,
        validator: row.get(2)?,
        score: row.get(3)?,
        valid: row.get(4)?,
        reason: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn test_db() -> Connection {
        db::open_memory_database().unwrap()
    }

    #[test]
    fn test_create_memory_starts_pending_with_fingerprint() {
        let conn = test_db();
        let input = NewMemory::new("agent-1", "Title", "A summary worth keeping");
        let id = create_memory(&conn, &input).unwrap();

        let memory = get_memory(&conn, id).unwrap();
        assert_eq!(memory.agent, "agent-1");
        assert_eq!(memory.status, MemoryStatus::PendingValidation);
        assert_eq!(memory.category, "general");
        assert!(memory.metadata.is_empty());
        assert_eq!(
            memory.embedding,
            Some(embedding::fingerprint("A summary worth keeping"))
        );
        assert_eq!(
            memory.content_hash,
            embedding::content_hash("A summary worth keeping", "Title")
        );
    }

    #[test]
    fn test_ids_increase_monotonically() {
        let conn = test_db();
        let a = create_memory(&conn, &NewMemory::new("a", "", "one")).unwrap();
        let b = create_memory(&conn, &NewMemory::new("a", "", "two")).unwrap();
        assert!(b > a);
    }

    #[test]
    fn test_supplied_content_hash_is_kept() {
        let conn = test_db();
        let mut input = NewMemory::new("a", "t", "s");
        input.content_hash = Some(format!("0x{}", "a".repeat(64)));
        let id = create_memory(&conn, &input).unwrap();
        assert_eq!(
            get_memory(&conn, id).unwrap().content_hash,
            format!("0x{}", "a".repeat(64))
        );
    }

    #[test]
    fn test_metadata_and_cid_are_stored() {
        let conn = test_db();
        let mut input = NewMemory::new("a", "t", "s");
        let mut meta = serde_json::Map::new();
        meta.insert("foo".into(), serde_json::json!("bar"));
        input.metadata = Some(meta);
        input.ipfs_cid = Some("bafytestcid123".into());
        let id = create_memory(&conn, &input).unwrap();

        let memory = get_memory(&conn, id).unwrap();
        assert_eq!(memory.metadata["foo"], "bar");
        assert_eq!(memory.cid.as_deref(), Some("bafytestcid123"));
    }

    #[test]
    fn test_get_memory_not_found() {
        let conn = test_db();
        let err = get_memory(&conn, 42).unwrap_err();
        assert_eq!(crate::error::not_found_id(&err), Some(42));
        assert!(find_memory(&conn, 42).unwrap().is_none());
    }

    #[test]
    fn test_list_memories_filters_and_orders_newest_first() {
        let conn = test_db();
        let first = create_memory(&conn, &NewMemory::new("alice", "", "one")).unwrap();
        let second =
            create_memory(&conn, &NewMemory::new("bob", "", "two").with_category("science"))
                .unwrap();
        set_status(&conn, first, MemoryStatus::Passed).unwrap();

        let all = list_memories(&conn, &ListFilter::with_limit(100)).unwrap();
        assert_eq!(all.iter().map(|m| m.id).collect::<Vec<_>>(), vec![second, first]);

        let passed = list_memories(
            &conn,
            &ListFilter {
                status: Some(MemoryStatus::Passed),
                ..ListFilter::with_limit(100)
            },
        )
        .unwrap();
        assert_eq!(passed.len(), 1);
        assert_eq!(passed[0].id, first);

        let science = list_memories(
            &conn,
            &ListFilter {
                category: Some("science".into()),
                agent: Some("bob".into()),
                ..ListFilter::with_limit(100)
            },
        )
        .unwrap();
        assert_eq!(science.len(), 1);
        assert_eq!(science[0].id, second);

        let paged = list_memories(
            &conn,
            &ListFilter {
                offset: 1,
                ..ListFilter::with_limit(1)
            },
        )
        .unwrap();
        assert_eq!(paged[0].id, first);

        assert_eq!(list_memories(&conn, &ListFilter::with_limit(-1)).unwrap().len(), 2);
        assert!(list_memories(&conn, &ListFilter::with_limit(0)).unwrap().is_empty());
    }

    #[test]
    fn test_count_by_content_hash_includes_self() {
        let conn = test_db();
        let id = create_memory(&conn, &NewMemory::new("a", "t", "s")).unwrap();
        let hash = get_memory(&conn, id).unwrap().content_hash;
        assert_eq!(count_by_content_hash(&conn, &hash).unwrap(), 1);

        // different agent and category, same text
        create_memory(&conn, &NewMemory::new("b", "t", "s").with_category("art")).unwrap();
        assert_eq!(count_by_content_hash(&conn, &hash).unwrap(), 2);
    }

    #[test]
    fn test_validations_are_listed_newest_first() {
        let conn = test_db();
        let id = create_memory(&conn, &NewMemory::new("a", "t", "s")).unwrap();
        let v1 = insert_validation(&conn, id, "v1", 10.0, false, Some("first")).unwrap();
        let v2 = insert_validation(&conn, id, "v2", 90.0, true, None).unwrap();

        let history = list_validations(&conn, Some(id), 10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], v2);
        assert_eq!(history[1], v1);

        assert_eq!(list_validations(&conn, None, 1).unwrap().len(), 1);
        assert!(list_validations(&conn, Some(id + 1), 10).unwrap().is_empty());
    }

    #[test]
    fn test_record_score_keeps_truncated_running_mean() {
        let conn = test_db();
        let id = create_memory(&conn, &NewMemory::new("a", "t", "s")).unwrap();
        assert_eq!(record_score(&conn, id, 10.0).unwrap(), Some((1, 10.0)));
        assert_eq!(record_score(&conn, id, 11.0).unwrap(), Some((2, 10.0)));
        assert_eq!(record_score(&conn, id, 30.0).unwrap(), Some((3, 16.0)));
        assert!(get_memory(&conn, id).unwrap().validated);
        assert_eq!(record_score(&conn, id + 1, 1.0).unwrap(), None);
    }

    #[test]
    fn test_unvalidated_memories_lists_oldest_first() {
        let conn = test_db();
        let settled = create_memory(&conn, &NewMemory::new("a", "", "one")).unwrap();
        let older = create_memory(&conn, &NewMemory::new("a", "", "two")).unwrap();
        let newer = create_memory(&conn, &NewMemory::new("a", "", "three")).unwrap();
        for _ in 0..3 {
            record_score(&conn, settled, 50.0).unwrap();
        }
        record_score(&conn, newer, 50.0).unwrap();

        let ids: Vec<i64> = unvalidated_memories(&conn, 10)
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![older, newer]);
        assert_eq!(unvalidated_memories(&conn, 1).unwrap()[0].id, older);
    }

    #[test]
    fn test_unreadable_embedding_loads_as_none() {
        let conn = test_db();
        let id = create_memory(&conn, &NewMemory::new("a", "t", "s")).unwrap();
        conn.execute(
            "UPDATE memories SET embedding = 'garbage' WHERE id = ?1",
            params![id],
        )
        .unwrap();
        assert!(get_memory(&conn, id).unwrap().embedding.is_none());
        assert!(similarity_candidates(&conn).unwrap()[0].3.is_none());
    }
}
