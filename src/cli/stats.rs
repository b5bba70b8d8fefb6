use anyhow::Result;

use neurovault::config::NeuroVaultConfig;
use neurovault::memory::stats::{agent_stats, memory_stats};
use neurovault::memory::types::MemoryStatus;

/// Display store-wide statistics, or one agent's activity.
pub fn stats(config: &NeuroVaultConfig, agent: Option<&str>) -> Result<()> {
    let conn = super::open_store(config)?;

    if let Some(address) = agent {
        let s = agent_stats(&conn, address)?;
        println!("Agent {}", s.address);
        println!("{}", "=".repeat(40));
        println!("  Submissions:         {}", s.submission_count);
        println!("  Validations:         {}", s.validation_count);
        println!("  Avg validation:      {}", s.avg_validation_score);
        return Ok(());
    }

    let response = memory_stats(&conn)?;

    println!("Memory Statistics");
    println!("{}", "=".repeat(40));
    println!("  Total memories:      {}", response.total_memories);
    println!("  Total validations:   {}", response.total_validations);
    println!("  Distinct agents:     {}", response.distinct_agents);
    println!("  Duplicate groups:    {}", response.duplicate_groups);
    println!();

    println!("By Status:");
    for status in MemoryStatus::ALL {
        let count = response.by_status.get(status.as_str()).copied().unwrap_or(0);
        println!("  {:<20} {}", status.as_str(), count);
    }

    if let Some(ref oldest) = response.oldest_memory {
        println!();
        println!("Oldest memory:         {oldest}");
    }
    if let Some(ref newest) = response.newest_memory {
        println!("Newest memory:         {newest}");
    }

    Ok(())
}
