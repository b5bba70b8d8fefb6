use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ValidateMemoryParams {
    #[schemars(description = "ID of the memory to validate")]
    pub memory_id: i64,

    #[schemars(
        description = "Scoring strategy: 'internal' (0-100, pass at 50) or 'external' (0-1000, pass at 300). Defaults to 'internal'. Ignored when score and valid are given."
    )]
    pub strategy: Option<String>,

    #[schemars(description = "Name recorded as the validator. Defaults to the strategy name.")]
    pub validator: Option<String>,

    #[schemars(description = "Precomputed score. With 'valid', records the verdict as-is.")]
    pub score: Option<f64>,

    #[schemars(description = "Precomputed pass/fail. With 'score', records the verdict as-is.")]
    pub valid: Option<bool>,

    #[schemars(description = "Optional explanation stored with a precomputed verdict")]
    pub reason: Option<String>,
}
