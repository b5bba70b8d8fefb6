//! MCP `memory_stats` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `memory_stats` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MemoryStatsParams {
    /// When set, report activity for this address instead of store-wide totals.
    #[schemars(description = "Optional agent address to report submission and validation activity for")]
    pub agent: Option<String>,
}
