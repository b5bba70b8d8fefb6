//! MCP `find_similar` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `find_similar` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FindSimilarParams {
    #[schemars(description = "Query text to compare against stored summaries")]
    pub query: String,

    /// Maximum number of results. Defaults to 5.
    #[schemars(description = "Maximum number of results to return. Defaults to 5.")]
    pub limit: Option<i64>,
}
