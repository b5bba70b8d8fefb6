//! CLI `inspect` command: display a memory and its validation history.

use anyhow::Result;

use neurovault::config::NeuroVaultConfig;
use neurovault::memory::store;

pub fn inspect(config: &NeuroVaultConfig, id: i64) -> Result<()> {
    let conn = super::open_store(config)?;
    let m = store::get_memory(&conn, id)?;
    let history = store::list_validations(&conn, Some(id), config.retrieval.history_limit)?;

    println!("Memory: {}", m.id);
    println!("{}", "=".repeat(50));
    println!("  Title:          {}", m.title);
    println!("  Agent:          {}", m.agent);
    println!("  Category:       {}", m.category);
    println!("  Status:         {}", m.status);
    println!(
        "  Validations:    {} (avg score {}, validated={})",
        m.validation_count, m.avg_score, m.validated
    );
    println!("  Content hash:   {}", m.content_hash);
    if let Some(ref cid) = m.cid {
        println!("  CID:            {cid}");
    }
    println!("  Created:        {}", m.created_at);
    if !m.metadata.is_empty() {
        println!("  Metadata:       {}", serde_json::to_string_pretty(&m.metadata)?);
    }
    println!();
    println!("Summary:");
    println!("  {}", m.summary);

    if !history.is_empty() {
        println!();
        println!("Validations (newest first):");
        for v in &history {
            println!(
                "  [{}] {:<14} score={:<7} valid={:<5} {}",
                v.created_at,
                v.validator,
                v.score,
                v.valid,
                v.reason.as_deref().unwrap_or(""),
            );
        }
    }

    Ok(())
}
