// Store status display: DB file size and row counts.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

use crate::db::Database;

/// Display store status to the terminal.
pub async fn show(db: &Arc<dyn Database>, db_display_path: &str) -> Result<()> {
    // Database file size
    let file_size = std::fs::metadata(db_display_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", db_display_path, file_size);

    let counts = db.counts().await?;
    println!("Groups: {}", counts.groups);
    if counts.groups == 0 {
        println!("  Run `threadwatch crawl` to discover your configured groups");
    }
    println!(
        "Threads: {} total, {} matched",
        counts.threads,
        if counts.matched_threads > 0 {
            counts.matched_threads.to_string().green().bold()
        } else {
            counts.matched_threads.to_string().normal()
        }
    );
    println!("Comments: {}", counts.comments);

    Ok(())
}

/// Whether a database file exists at `db_path`.
pub fn is_initialized(db_path: &str) -> bool {
    Path::new(db_path).exists()
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
