//! Core record definitions.
//!
//! Defines [`MemoryStatus`] (the validation lifecycle), [`Memory`] (a stored
//! submission), [`Validation`] (one scoring event), and the input shapes for the
//! create and verdict paths.

use serde::{Deserialize, Serialize};

use crate::error::NeuroVaultError;

/// Lifecycle state of a memory. Every verdict overwrites it; none is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemoryStatus {
    PendingValidation,
    Passed,
    Failed,
}

impl MemoryStatus {
    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingValidation => "PENDING_VALIDATION",
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
        }
    }

    pub fn from_verdict(valid: bool) -> Self {
        if valid {
            Self::Passed
        } else {
            Self::Failed
        }
    }

    pub const ALL: [MemoryStatus; 3] = [Self::PendingValidation, Self::Passed, Self::Failed];
}

impl std::fmt::Display for MemoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MemoryStatus {
    type Err = NeuroVaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_VALIDATION" => Ok(Self::PendingValidation),
            "PASSED" => Ok(Self::Passed),
            "FAILED" => Ok(Self::Failed),
            other => Err(NeuroVaultError::UnknownStatus(other.to_string())),
        }
    }
}

/// A memory record, matching the `memories` table schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub id: i64,
    pub agent: String,
    #[serde(default)]
    pub title: String,
    /// The text that is scored and fingerprinted.
    #[serde(default)]
    pub summary: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Opaque content pointer, e.g. an IPFS CID.
    #[serde(default)]
    pub cid: Option<String>,
    pub content_hash: String,
    /// Cached fingerprint of `summary`; `None` if the stored value is missing or unreadable.
    #[serde(default)]
    pub embedding: Option<Vec<f64>>,
    pub status: MemoryStatus,
    pub created_at: String,
    #[serde(default)]
    pub validation_count: i64,
    /// Running mean of every recorded score, truncated after each verdict.
    #[serde(default)]
    pub avg_score: f64,
    /// `validation_count` has reached [`VALIDATION_QUORUM`].
    #[serde(default)]
    pub validated: bool,
}

/// One scoring event against a memory. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    pub id: i64,
    pub memory_id: i64,
    pub validator: String,
    pub score: f64,
    pub valid: bool,
    pub reason: Option<String>,
    pub created_at: String,
}

pub fn default_category() -> String {
    "general".to_string()
}

pub const DEFAULT_AGENT: &str = "web-ui";

/// Validations needed before a memory leaves the unvalidated backlog.
pub const VALIDATION_QUORUM: i64 = 3;

/// Create-memory input. Accepts both the agent-facing and the legacy field names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewMemory {
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub submitter: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub cid: Option<String>,
    #[serde(default)]
    pub ipfs_cid: Option<String>,
    #[serde(default)]
    pub content_hash: Option<String>,
}

impl NewMemory {
    pub fn new(agent: &str, title: &str, summary: &str) -> Self {
        Self {
            agent: Some(agent.to_string()),
            title: Some(title.to_string()),
            summary: Some(summary.to_string()),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    /// `agent`, then `submitter`, then [`DEFAULT_AGENT`]. Empty strings count as missing.
    pub fn resolved_agent(&self) -> &str {
        non_empty(self.agent.as_deref())
            .or_else(|| non_empty(self.submitter.as_deref()))
            .unwrap_or(DEFAULT_AGENT)
    }

    /// `ipfs_cid` takes precedence over `cid`.
    pub fn resolved_cid(&self) -> Option<&str> {
        non_empty(self.ipfs_cid.as_deref()).or_else(|| non_empty(self.cid.as_deref()))
    }

    pub fn resolved_category(&self) -> &str {
        self.category.as_deref().unwrap_or("general")
    }

    pub fn title_text(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    pub fn summary_text(&self) -> &str {
        self.summary.as_deref().unwrap_or("")
    }
}

/// A verdict computed elsewhere (e.g. by the polling worker), persisted verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub memory_id: i64,
    pub validator: String,
    pub score: f64,
    pub valid: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_sql_strings() {
        for status in MemoryStatus::ALL {
            assert_eq!(status.as_str().parse::<MemoryStatus>().unwrap(), status);
        }
        assert!("LOCKED".parse::<MemoryStatus>().is_err());
    }

    #[test]
    fn status_serializes_like_the_column() {
        let json = serde_json::to_string(&MemoryStatus::PendingValidation).unwrap();
        assert_eq!(json, "\"PENDING_VALIDATION\"");
        assert_eq!(MemoryStatus::from_verdict(true), MemoryStatus::Passed);
        assert_eq!(MemoryStatus::from_verdict(false), MemoryStatus::Failed);
    }

    #[test]
    fn new_memory_accepts_legacy_field_names() {
        let input: NewMemory = serde_json::from_str(
            r#"{"submitter":"tester","title":"T","ipfs_cid":"bafy","cid":"ignored"}"#,
        )
        .unwrap();
        assert_eq!(input.resolved_agent(), "tester");
        assert_eq!(input.resolved_cid(), Some("bafy"));
        assert_eq!(input.summary_text(), "");
        assert_eq!(input.resolved_category(), "general");
    }

    #[test]
    fn new_memory_defaults_agent() {
        let input: NewMemory = serde_json::from_str("{}").unwrap();
        assert_eq!(input.resolved_agent(), DEFAULT_AGENT);
        assert_eq!(input.resolved_cid(), None);
    }
}
