//! CLI `doctor` command: run database diagnostics and print a health report.

use anyhow::{Context, Result};

use neurovault::config::NeuroVaultConfig;
use neurovault::db;
use neurovault::embedding::FINGERPRINT_SCHEME;

pub fn doctor(config: &NeuroVaultConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `neurovault serve` to initialize.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let conn = db::open_database(&db_path).context("failed to open database (may be corrupt)")?;
    let report = db::check_database_health(&conn).context("failed to run health check")?;

    println!("NeuroVault Health Report");
    println!("========================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!();
    println!("Fingerprint scheme:");
    println!(
        "  Stored:          {}",
        report.fingerprint_scheme.as_deref().unwrap_or("(not set)")
    );
    println!("  Current:         {FINGERPRINT_SCHEME}");
    if report.fingerprint_scheme.as_deref() == Some(FINGERPRINT_SCHEME) {
        println!("  Status:          OK (match)");
    } else {
        println!("  WARNING: scheme mismatch, reopen the store to re-fingerprint.");
    }
    println!();
    println!("Row counts:");
    println!("  Memories:        {}", report.memory_count);
    println!("  Pending:         {}", report.pending_count);
    println!("  Validations:     {}", report.validation_count);
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
        println!();
        println!("Recovery: restore from a backup, e.g.");
        println!("  cp backup.sqlite3 {}", db_path.display());
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
