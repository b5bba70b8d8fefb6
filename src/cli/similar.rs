use anyhow::Result;

use neurovault::config::NeuroVaultConfig;

/// Rank stored memories against `query` and print the hits.
pub fn similar(config: &NeuroVaultConfig, query: &str, limit: Option<i64>) -> Result<()> {
    let conn = super::open_store(config)?;
    let limit = limit.unwrap_or(config.retrieval.default_similar_limit);
    let results = neurovault::memory::search::find_similar(&conn, query, limit)?;

    if results.is_empty() {
        println!("No memories found.");
        return Ok(());
    }

    for (rank, r) in results.iter().enumerate() {
        let preview: String = r.summary.chars().take(80).collect();
        println!("{:>2}. [{}] {:.4}  {}", rank + 1, r.id, r.score, r.title);
        println!("      {preview}");
    }
    Ok(())
}
