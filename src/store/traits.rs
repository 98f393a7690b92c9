// Store trait — backend-agnostic async interface for persistence.
//
// Implementors: SqliteStore (wraps rusqlite) and MemoryStore (tests). All
// methods are async so the synchronous rusqlite backend (behind a Mutex)
// and purely in-memory state fit one interface.

use anyhow::Result;
use async_trait::async_trait;

use crate::settings::Settings;
use crate::stats::VideoStat;

#[async_trait]
pub trait Store: Send + Sync {
    // --- Lifecycle ---

    /// Count the user-created tables (init confirmation).
    async fn table_count(&self) -> Result<i64>;

    // --- Settings ---

    /// Load the full settings object, defaulting any missing key.
    async fn get_settings(&self) -> Result<Settings>;

    /// Persist the full settings object.
    async fn save_settings(&self, settings: &Settings) -> Result<()>;

    // --- Result snapshots ---

    /// Replace the stored result snapshot with a fresh one.
    async fn save_results(&self, stats: &[VideoStat]) -> Result<()>;

    /// The last stored snapshot, in first-seen order.
    async fn get_results(&self) -> Result<Vec<VideoStat>>;

    // --- Scan state ---

    /// Get a scan state value by key (e.g., "last_scan_at").
    async fn get_scan_state(&self, key: &str) -> Result<Option<String>>;

    /// Set a scan state value (upsert).
    async fn set_scan_state(&self, key: &str, value: &str) -> Result<()>;
}
