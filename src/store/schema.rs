// Database schema — table creation and migrations.
//
// A `schema_version` table tracks which migrations have run; each migration
// is a function that executes SQL statements.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet.
///
/// Idempotent — safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Tracks schema version for future migrations
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- User settings, one row per key (apiKey, minRatio, maxResults, enabled)
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Snapshot of the last scan's result cache, replaced wholesale after
        -- each pass. position preserves first-seen order.
        CREATE TABLE IF NOT EXISTS video_results (
            position INTEGER PRIMARY KEY,
            video_id TEXT NOT NULL,
            url TEXT NOT NULL,
            views INTEGER NOT NULL,
            likes INTEGER NOT NULL,
            like_ratio TEXT NOT NULL,
            error INTEGER NOT NULL DEFAULT 0,
            message TEXT,
            saved_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Scan state — last-scan timestamps and similar bookkeeping
        CREATE TABLE IF NOT EXISTS scan_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Index for looking up a stored result by video id
        CREATE INDEX IF NOT EXISTS idx_results_video_id
            ON video_results(video_id);
        ",
    )
    .context("Failed to create database tables")?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    Ok(())
}

/// Count the number of tables in the database (useful for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_tables_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
    }

    #[test]
    fn expected_table_count() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        // schema_version, settings, video_results, scan_state
        assert_eq!(table_count(&conn).unwrap(), 4i64);
    }
}
