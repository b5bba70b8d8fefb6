//! REST endpoints over the store, the ranker, and the validation lifecycle.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::ApiError;
use super::AppState;
use crate::db::with_db;
use crate::embedding::fingerprint;
use crate::memory::search::{find_similar, SimilarMemory};
use crate::memory::stats::{agent_stats, memory_stats, AgentStats, StatsResponse};
use crate::memory::store::{self, ListFilter};
use crate::memory::types::{Memory, MemoryStatus, NewMemory, Validation, Verdict};
use crate::validation::lifecycle::submit_verdict;
use crate::validation::queue::ValidationJob;

type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/embed", post(embed))
        .route("/memories", post(create_memory).get(list_memories))
        .route("/memories/unvalidated", get(list_unvalidated))
        .route("/memories/{id}", get(get_memory))
        .route("/agent/{address}", get(memories_by_agent))
        .route("/agent/{address}/stats", get(get_agent_stats))
        .route("/stats", get(get_stats))
        .route("/validate", post(validate))
        .route("/validations", get(list_validations))
        .route("/similar", get(similar))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct EmbedRequest {
    #[serde(default)]
    text: String,
}

async fn embed(Json(req): Json<EmbedRequest>) -> Json<Value> {
    Json(json!({ "embedding": fingerprint(&req.text) }))
}

async fn create_memory(
    State(state): State<AppState>,
    Json(input): Json<NewMemory>,
) -> ApiResult<Value> {
    let id = with_db(&state.db, move |conn| store::create_memory(conn, &input)).await?;
    tracing::info!(id, "memory created");

    if state.config.validation.validate_on_create {
        let job = ValidationJob::new(id, state.config.validation.sync_validator.clone());
        if let Err(e) = state.queue.enqueue(job) {
            tracing::warn!(id, "validate-on-create skipped: {e:#}");
        }
    }
    Ok(Json(json!({ "id": id })))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<i64>,
    offset: Option<i64>,
    status: Option<String>,
    category: Option<String>,
    agent: Option<String>,
}

async fn list_memories(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> ApiResult<Vec<Memory>> {
    let status = match q.status.as_deref().filter(|s| !s.is_empty()) {
        Some(s) => Some(
            s.parse::<MemoryStatus>()
                .map_err(|e| ApiError::bad_request(e.to_string()))?,
        ),
        None => None,
    };
    let filter = ListFilter {
        status,
        agent: q.agent,
        category: q.category,
        limit: q.limit.unwrap_or(state.config.retrieval.default_list_limit),
        offset: q.offset.unwrap_or(0),
    };
    let rows = with_db(&state.db, move |conn| store::list_memories(conn, &filter)).await?;
    Ok(Json(rows))
}

const DEFAULT_UNVALIDATED_LIMIT: i64 = 10;

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: Option<i64>,
}

async fn list_unvalidated(
    State(state): State<AppState>,
    Query(q): Query<LimitQuery>,
) -> ApiResult<Vec<Memory>> {
    let limit = q.limit.unwrap_or(DEFAULT_UNVALIDATED_LIMIT);
    let rows = with_db(&state.db, move |conn| store::unvalidated_memories(conn, limit)).await?;
    Ok(Json(rows))
}

async fn get_memory(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    let history_limit = state.config.retrieval.history_limit;
    let (memory, validations) = with_db(&state.db, move |conn| {
        let memory = store::get_memory(conn, id)?;
        let validations = store::list_validations(conn, Some(id), history_limit)?;
        Ok((memory, validations))
    })
    .await?;
    Ok(Json(json!({ "memory": memory, "validations": validations })))
}

async fn memories_by_agent(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult<Vec<Memory>> {
    let rows = with_db(&state.db, move |conn| store::memories_by_agent(conn, &address)).await?;
    Ok(Json(rows))
}

async fn get_agent_stats(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult<AgentStats> {
    let stats = with_db(&state.db, move |conn| agent_stats(conn, &address)).await?;
    Ok(Json(stats))
}

async fn get_stats(State(state): State<AppState>) -> ApiResult<StatsResponse> {
    let stats = with_db(&state.db, |conn| memory_stats(conn)).await?;
    Ok(Json(stats))
}

/// Body of `POST /validate`. Both `score` and `valid` present means a direct
/// verdict; anything else asks the backend to score the memory itself.
#[derive(Debug, Deserialize)]
struct ValidateRequest {
    memory_id: Option<i64>,
    validator: Option<String>,
    score: Option<f64>,
    #[serde(alias = "is_valid")]
    valid: Option<bool>,
    #[serde(alias = "explanation")]
    reason: Option<String>,
    #[serde(default)]
    simulate: bool,
}

async fn validate(
    State(state): State<AppState>,
    Json(req): Json<ValidateRequest>,
) -> ApiResult<Value> {
    let memory_id = req
        .memory_id
        .ok_or_else(|| ApiError::bad_request("memory_id is required"))?;

    if let (Some(score), Some(valid)) = (req.score, req.valid) {
        let verdict = Verdict {
            memory_id,
            validator: req.validator.unwrap_or_else(|| "validator".to_string()),
            score,
            valid,
            reason: req.reason,
        };
        with_db(&state.db, move |conn| submit_verdict(conn, &verdict)).await?;
        return Ok(Json(json!({ "ok": true })));
    }

    let job = ValidationJob {
        memory_id,
        validator: req
            .validator
            .unwrap_or_else(|| state.config.validation.trigger_validator.clone()),
        simulate: req.simulate,
    };
    state.queue.enqueue(job)?;
    Ok(Json(json!({ "enqueued": true })))
}

#[derive(Debug, Deserialize)]
struct ValidationsQuery {
    #[serde(rename = "memoryId")]
    memory_id: Option<i64>,
    limit: Option<i64>,
}

async fn list_validations(
    State(state): State<AppState>,
    Query(q): Query<ValidationsQuery>,
) -> ApiResult<Vec<Validation>> {
    let limit = q.limit.unwrap_or(state.config.retrieval.default_list_limit);
    let rows = with_db(&state.db, move |conn| {
        store::list_validations(conn, q.memory_id, limit)
    })
    .await?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
struct SimilarQuery {
    #[serde(default)]
    q: String,
    limit: Option<i64>,
}

async fn similar(
    State(state): State<AppState>,
    Query(q): Query<SimilarQuery>,
) -> ApiResult<Vec<SimilarMemory>> {
    let limit = q.limit.unwrap_or(state.config.retrieval.default_similar_limit);
    let rows = with_db(&state.db, move |conn| find_similar(conn, &q.q, limit)).await?;
    Ok(Json(rows))
}
