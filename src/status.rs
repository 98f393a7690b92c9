// System status display — shows DB stats, saved settings, last scan time.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use crate::store::Store;

/// Display system status to the terminal.
pub async fn show(store: &Arc<dyn Store>, db_display_path: &str) -> Result<()> {
    if !Path::new(db_display_path).exists() {
        println!("Database: not initialized");
        println!("\nRun `ratioed init` to set up the database.");
        return Ok(());
    }

    // Database file size
    let file_size = std::fs::metadata(db_display_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", db_display_path, file_size);

    // Settings
    let settings = store.get_settings().await?;
    let key_state = if settings.api_key.is_empty() {
        "not set".to_string()
    } else {
        format!("set ({} chars)", settings.api_key.len())
    };
    println!(
        "Settings: API key {}, min ratio {}%, max results {}, {}",
        key_state,
        settings.min_ratio,
        settings.max_results,
        if settings.enabled { "enabled" } else { "disabled" }
    );
    if settings.api_key.is_empty() {
        println!("  Run `ratioed settings --api-key <KEY>` to set one");
    }

    // Stored results
    let results = store.get_results().await?;
    if results.is_empty() {
        println!("Stored results: none yet");
        println!("  Run `ratioed scan <snapshot> --url <page-url>` to scan a page");
    } else {
        let errors = results.iter().filter(|s| s.error).count();
        println!(
            "Stored results: {} videos, {} without usable stats",
            results.len(),
            errors
        );
    }

    // Last scan
    match store.get_scan_state("last_scan_at").await? {
        Some(last_scan) => println!("Last scan: {}", last_scan),
        None => println!("Last scan: never"),
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
