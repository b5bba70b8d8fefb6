//! Polling validator.
//!
//! Fetches candidate memories from a NeuroVault backend over HTTP, scores each
//! with the [`ExternalHeuristic`], and posts the verdict back to `/validate`.
//! Without a validator key the client runs in dry-run mode and only logs what it
//! would submit. Every network or decode failure is logged and skipped.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::WorkerConfig;
use crate::memory::types::{default_category, MemoryStatus};
use crate::validation::external::ExternalHeuristic;

/// The fields the worker needs from a `GET /memories` item.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CandidateMemory {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default = "default_category")]
    pub category: String,
}

/// Body posted to `/validate`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VerdictPayload {
    pub memory_id: i64,
    pub validator: String,
    pub score: f64,
    pub valid: bool,
    pub reason: String,
}

pub struct ValidatorClient {
    http: reqwest::Client,
    backend_url: String,
    validator_address: String,
    dry_run: bool,
    pending_only: bool,
    heuristic: ExternalHeuristic,
}

impl ValidatorClient {
    /// Build a client from config. Dry-run is forced when `force_dry_run` is set
    /// or no validator key is configured.
    pub fn new(config: &WorkerConfig, force_dry_run: bool) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        let dry_run = force_dry_run || config.validator_key.is_none();
        if dry_run {
            tracing::warn!("no validator key configured or --dry given; running in dry-run mode");
        }

        Ok(Self {
            http,
            backend_url: config.backend_url.trim_end_matches('/').to_string(),
            validator_address: config.validator_address.clone(),
            dry_run,
            pending_only: config.pending_only,
            heuristic: ExternalHeuristic::default(),
        })
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn candidates_url(&self, limit: i64) -> String {
        let mut url = format!("{}/memories?limit={limit}", self.backend_url);
        if self.pending_only {
            url.push_str("&status=");
            url.push_str(MemoryStatus::PendingValidation.as_str());
        }
        url
    }

    /// Up to `limit` candidates. Any failure yields an empty batch.
    pub async fn fetch_candidates(&self, limit: i64) -> Vec<CandidateMemory> {
        match self.try_fetch(limit).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::error!(backend = %self.backend_url, "failed to fetch candidates: {e:#}");
                Vec::new()
            }
        }
    }

    async fn try_fetch(&self, limit: i64) -> Result<Vec<CandidateMemory>> {
        let candidates = self
            .http
            .get(self.candidates_url(limit))
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<CandidateMemory>>()
            .await
            .context("unexpected candidate list shape")?;
        Ok(candidates)
    }

    /// Score `memory` and build the verdict to submit.
    pub fn verdict_for(&self, memory: &CandidateMemory) -> VerdictPayload {
        let card = self
            .heuristic
            .score_fields(&memory.title, &memory.summary, &memory.category);
        VerdictPayload {
            memory_id: memory.id,
            validator: self.validator_address.clone(),
            score: card.score,
            valid: card.valid,
            reason: format!("{} (dry-run={})", card.reason, self.dry_run),
        }
    }

    /// Score and submit one candidate. Returns whether it counts as processed.
    pub async fn validate_and_submit(&self, memory: &CandidateMemory) -> bool {
        let payload = self.verdict_for(memory);

        if self.dry_run {
            tracing::info!(
                memory_id = payload.memory_id,
                score = payload.score,
                valid = payload.valid,
                "dry-run: would submit validation"
            );
            return true;
        }

        let url = format!("{}/validate", self.backend_url);
        let result = async {
            self.http
                .post(&url)
                .json(&payload)
                .send()
                .await?
                .error_for_status()?;
            Ok::<_, reqwest::Error>(())
        }
        .await;

        match result {
            Ok(()) => {
                tracing::info!(memory_id = memory.id, score = payload.score, "submitted validation");
                true
            }
            Err(e) => {
                tracing::error!(memory_id = memory.id, "failed to submit validation: {e}");
                false
            }
        }
    }

    /// One poll cycle. Returns the number of successfully processed candidates.
    pub async fn run_once(&self, batch_size: i64) -> usize {
        let candidates = self.fetch_candidates(batch_size).await;
        let mut processed = 0;
        for memory in &candidates {
            if self.validate_and_submit(memory).await {
                processed += 1;
            }
        }
        tracing::info!(fetched = candidates.len(), processed, "validator cycle finished");
        processed
    }
}

/// Poll every `interval` until ctrl-c.
pub async fn run_daemon(client: &ValidatorClient, interval: Duration, batch_size: i64) -> Result<()> {
    tracing::info!(interval_secs = interval.as_secs(), "starting validator daemon");
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                client.run_once(batch_size).await;
            }
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for ctrl-c")?;
                tracing::info!("validator daemon stopped");
                return Ok(());
            }
        }
    }
}
