//! MCP `submit_memory` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `submit_memory` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SubmitMemoryParams {
    #[schemars(description = "Short title of the memory")]
    pub title: Option<String>,

    /// The scored and fingerprinted text.
    #[schemars(description = "Body text of the memory. This is what gets scored and searched.")]
    pub summary: Option<String>,

    #[schemars(description = "Submitting agent identifier or address. Defaults to 'web-ui'.")]
    pub agent: Option<String>,

    #[schemars(
        description = "Category label, e.g. 'science', 'history', 'art'. Defaults to 'general'."
    )]
    pub category: Option<String>,

    #[schemars(description = "Optional JSON object of free-form metadata")]
    pub metadata: Option<serde_json::Value>,

    #[schemars(description = "Optional content pointer such as an IPFS CID")]
    pub cid: Option<String>,
}
