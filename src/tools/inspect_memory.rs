use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct InspectMemoryParams {
    #[schemars(description = "ID of the memory to inspect")]
    pub id: i64,

    #[schemars(description = "How many recent validations to include. Defaults to 10.")]
    pub history_limit: Option<i64>,
}
