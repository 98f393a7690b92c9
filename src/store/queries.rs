// Query functions — synchronous rusqlite operations the SqliteStore wraps.
//
// Settings live as one row per key, the way the browser storage held them;
// a missing or corrupt row falls back to that key's default rather than
// failing the whole load.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::settings::Settings;
use crate::stats::VideoStat;

// --- Settings ---

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()
        .with_context(|| format!("Failed to read setting {key}"))?;
    Ok(value)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
        params![key, value],
    )
    .with_context(|| format!("Failed to save setting {key}"))?;
    Ok(())
}

/// Assemble the settings object, falling back per key to the defaults.
pub fn load_settings(conn: &Connection) -> Result<Settings> {
    let defaults = Settings::default();
    let api_key = get_setting(conn, "apiKey")?.unwrap_or(defaults.api_key);
    let min_ratio = get_setting(conn, "minRatio")?
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.min_ratio);
    let max_results = get_setting(conn, "maxResults")?
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.max_results);
    let enabled = get_setting(conn, "enabled")?
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.enabled);
    Ok(Settings {
        api_key,
        min_ratio,
        max_results,
        enabled,
    })
}

pub fn save_settings(conn: &Connection, settings: &Settings) -> Result<()> {
    set_setting(conn, "apiKey", &settings.api_key)?;
    set_setting(conn, "minRatio", &settings.min_ratio.to_string())?;
    set_setting(conn, "maxResults", &settings.max_results.to_string())?;
    set_setting(conn, "enabled", &settings.enabled.to_string())?;
    Ok(())
}

// --- Result snapshots ---

/// Replace the stored result snapshot wholesale, preserving order.
pub fn replace_results(conn: &Connection, stats: &[VideoStat]) -> Result<()> {
    conn.execute("DELETE FROM video_results", [])
        .context("Failed to clear stored results")?;
    let mut stmt = conn.prepare(
        "INSERT INTO video_results
            (position, video_id, url, views, likes, like_ratio, error, message)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    for (position, stat) in stats.iter().enumerate() {
        stmt.execute(params![
            position as i64,
            stat.video_id,
            stat.url,
            stat.views,
            stat.likes,
            stat.like_ratio,
            stat.error,
            stat.message,
        ])
        .with_context(|| format!("Failed to store result for {}", stat.video_id))?;
    }
    Ok(())
}

/// The stored snapshot, in the order it was saved.
pub fn get_results(conn: &Connection) -> Result<Vec<VideoStat>> {
    let mut stmt = conn.prepare(
        "SELECT video_id, url, views, likes, like_ratio, error, message
         FROM video_results ORDER BY position",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(VideoStat {
            video_id: row.get(0)?,
            url: row.get(1)?,
            views: row.get(2)?,
            likes: row.get(3)?,
            like_ratio: row.get(4)?,
            error: row.get(5)?,
            message: row.get(6)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("Failed to read stored result")?);
    }
    Ok(out)
}

// --- Scan state ---

pub fn get_scan_state(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM scan_state WHERE key = ?1",
            [key],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("Failed to read scan state {key}"))?;
    Ok(value)
}

pub fn set_scan_state(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO scan_state (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
        params![key, value],
    )
    .with_context(|| format!("Failed to save scan state {key}"))?;
    Ok(())
}
