//! CLI `validate` command: score one memory against the local database.

use anyhow::{bail, Result};

use neurovault::config::NeuroVaultConfig;
use neurovault::error::NeuroVaultError;
use neurovault::validation::external::ExternalHeuristic;
use neurovault::validation::internal::InternalHeuristic;
use neurovault::validation::lifecycle::run_validation;
use neurovault::validation::Scorer;

pub fn validate(
    config: &NeuroVaultConfig,
    id: i64,
    external: bool,
    validator: Option<&str>,
) -> Result<()> {
    let mut conn = super::open_store(config)?;

    let scorer: Box<dyn Scorer> = if external {
        Box::new(ExternalHeuristic::default())
    } else {
        Box::new(InternalHeuristic)
    };
    let validator = validator.unwrap_or(scorer.name());

    let Some(v) = run_validation(&mut conn, id, validator, scorer.as_ref())? else {
        bail!(NeuroVaultError::MemoryNotFound(id));
    };

    println!(
        "Memory {id}: score {} / {} ({})",
        v.score,
        scorer.max_score(),
        if v.valid { "PASSED" } else { "FAILED" }
    );
    if let Some(reason) = v.reason {
        println!("  {reason}");
    }
    Ok(())
}
