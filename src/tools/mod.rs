pub mod find_similar;
pub mod inspect_memory;
pub mod memory_stats;
pub mod submit_memory;
pub mod validate_memory;

use find_similar::FindSimilarParams;
use inspect_memory::InspectMemoryParams;
use memory_stats::MemoryStatsParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use rusqlite::Connection;
use serde::Serialize;
use submit_memory::SubmitMemoryParams;
use validate_memory::ValidateMemoryParams;

use crate::db::with_db;
use crate::memory::types::{NewMemory, Verdict};
use crate::server::AppState;
use crate::validation::queue::ValidationJob;
use crate::validation::{lifecycle, scorer_by_name};

/// The NeuroVault MCP tool handler. Holds the same shared state as the HTTP
/// routes and exposes the tools via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct NeuroVaultTools {
    tool_router: ToolRouter<Self>,
    state: AppState,
}

impl NeuroVaultTools {
    /// Run store work on the blocking pool and flatten errors to tool messages.
    async fn call_db<T, F>(&self, what: &str, f: F) -> Result<T, String>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> anyhow::Result<T> + Send + 'static,
    {
        with_db(&self.state.db, f)
            .await
            .map_err(|e| format!("{what} failed: {e:#}"))
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("serialization failed: {e}"))
}

#[tool_router]
impl NeuroVaultTools {
    pub fn new(state: AppState) -> Self {
        Self {
            tool_router: Self::tool_router(),
            state,
        }
    }

    /// Submit a memory for validation.
    #[tool(description = "Submit a memory (title + summary). It is stored as PENDING_VALIDATION and fingerprinted for similarity search. Returns the new id.")]
    async fn submit_memory(
        &self,
        Parameters(params): Parameters<SubmitMemoryParams>,
    ) -> Result<String, String> {
        let metadata = match params.metadata {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::Object(map)) => Some(map),
            Some(_) => return Err("metadata must be a JSON object".into()),
        };
        let input = NewMemory {
            agent: params.agent,
            title: params.title,
            summary: params.summary,
            category: params.category,
            metadata,
            cid: params.cid,
            ..NewMemory::default()
        };

        tracing::info!(
            summary_len = input.summary_text().len(),
            agent = %input.resolved_agent(),
            "submit_memory called"
        );

        let id = self
            .call_db("store", move |conn| {
                crate::memory::store::create_memory(conn, &input)
            })
            .await?;

        let validation = &self.state.config.validation;
        if validation.validate_on_create {
            let job = ValidationJob::new(id, validation.sync_validator.clone());
            if let Err(e) = self.state.queue.enqueue(job) {
                tracing::warn!(id, "validate-on-create skipped: {e:#}");
            }
        }

        Ok(serde_json::json!({ "id": id }).to_string())
    }

    /// Score a memory now, or record a precomputed verdict.
    #[tool(description = "Validate a memory. Without score/valid, scores it with the chosen strategy and updates its status to PASSED or FAILED. With both score and valid, records that verdict directly.")]
    async fn validate_memory(
        &self,
        Parameters(params): Parameters<ValidateMemoryParams>,
    ) -> Result<String, String> {
        tracing::info!(memory_id = params.memory_id, "validate_memory called");

        if let (Some(score), Some(valid)) = (params.score, params.valid) {
            let verdict = Verdict {
                memory_id: params.memory_id,
                validator: params.validator.unwrap_or_else(|| "validator".into()),
                score,
                valid,
                reason: params.reason,
            };
            let validation = self
                .call_db("verdict", move |conn| lifecycle::submit_verdict(conn, &verdict))
                .await?;
            return to_json(&validation);
        }

        let strategy = params.strategy.as_deref().unwrap_or("internal");
        let scorer = scorer_by_name(strategy)
            .ok_or_else(|| format!("unknown strategy '{strategy}' (expected internal or external)"))?;
        let validator = params
            .validator
            .unwrap_or_else(|| scorer.name().to_string());
        let memory_id = params.memory_id;

        let validation = self
            .call_db("validation", move |conn| {
                lifecycle::run_validation(conn, memory_id, &validator, scorer.as_ref())
            })
            .await?
            .ok_or_else(|| format!("memory not found: {memory_id}"))?;
        to_json(&validation)
    }

    /// Rank stored memories by fingerprint similarity.
    #[tool(description = "Find memories whose summaries are most similar to the query text. Returns id, title, summary, and cosine score, best first.")]
    async fn find_similar(
        &self,
        Parameters(params): Parameters<FindSimilarParams>,
    ) -> Result<String, String> {
        tracing::info!(query_len = params.query.len(), "find_similar called");
        let limit = params
            .limit
            .unwrap_or(self.state.config.retrieval.default_similar_limit);
        let query = params.query;
        let results = self
            .call_db("search", move |conn| {
                crate::memory::search::find_similar(conn, &query, limit)
            })
            .await?;
        to_json(&results)
    }

    /// Inspect a memory and its recent validations.
    #[tool(description = "Inspect a memory by ID. Returns the full record (status, validation count, average score) and its most recent validations, newest first.")]
    async fn inspect_memory(
        &self,
        Parameters(params): Parameters<InspectMemoryParams>,
    ) -> Result<String, String> {
        tracing::info!(id = params.id, "inspect_memory called");
        let id = params.id;
        let limit = params
            .history_limit
            .unwrap_or(self.state.config.retrieval.history_limit);
        let (memory, validations) = self
            .call_db("inspect", move |conn| {
                let memory = crate::memory::store::get_memory(conn, id)?;
                let validations = crate::memory::store::list_validations(conn, Some(id), limit)?;
                Ok((memory, validations))
            })
            .await?;
        to_json(&serde_json::json!({ "memory": memory, "validations": validations }))
    }

    /// Report store-wide or per-agent statistics.
    #[tool(description = "Get statistics: totals and counts per status, or one agent's submission and validation activity when 'agent' is given.")]
    async fn memory_stats(
        &self,
        Parameters(params): Parameters<MemoryStatsParams>,
    ) -> Result<String, String> {
        tracing::info!(agent = ?params.agent, "memory_stats called");
        match params.agent {
            Some(agent) => {
                let stats = self
                    .call_db("stats", move |conn| {
                        crate::memory::stats::agent_stats(conn, &agent)
                    })
                    .await?;
                to_json(&stats)
            }
            None => {
                let stats = self
                    .call_db("stats", |conn| crate::memory::stats::memory_stats(conn))
                    .await?;
                to_json(&stats)
            }
        }
    }
}

#[tool_handler]
impl ServerHandler for NeuroVaultTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "NeuroVault stores agent memories and validates them. Use submit_memory to \
                 add one, validate_memory to score it, find_similar to search, and \
                 inspect_memory to see its status and validation history."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
