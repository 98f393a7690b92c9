// SqliteStore — rusqlite backend implementing the Store trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is
// !Send. Trait methods lock the mutex, do synchronous rusqlite work, and
// return; the lock is never held across an await point.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::traits::Store;
use crate::settings::Settings;
use crate::stats::VideoStat;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn get_settings(&self) -> Result<Settings> {
        let conn = self.conn.lock().await;
        super::queries::load_settings(&conn)
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::save_settings(&conn, settings)
    }

    async fn save_results(&self, stats: &[VideoStat]) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::replace_results(&conn, stats)
    }

    async fn get_results(&self) -> Result<Vec<VideoStat>> {
        let conn = self.conn.lock().await;
        super::queries::get_results(&conn)
    }

    async fn get_scan_state(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        super::queries::get_scan_state(&conn, key)
    }

    async fn set_scan_state(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::set_scan_state(&conn, key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatLookup;

    async fn test_store() -> SqliteStore {
        let conn = Connection::open_in_memory().unwrap();
        crate::store::schema::create_tables(&conn).unwrap();
        SqliteStore::new(conn)
    }

    #[tokio::test]
    async fn trait_settings_round_trip() {
        let store = test_store().await;
        assert_eq!(store.get_settings().await.unwrap(), Settings::default());

        let mut settings = Settings::default();
        settings.api_key = "AIzaTest".to_string();
        settings.max_results = 25;
        store.save_settings(&settings).await.unwrap();
        assert_eq!(store.get_settings().await.unwrap(), settings);
    }

    #[tokio::test]
    async fn trait_results_round_trip() {
        let store = test_store().await;
        assert!(store.get_results().await.unwrap().is_empty());

        let stats = vec![
            VideoStat::from_lookup("abc123", "url", &StatLookup::success(1_000_000, 50_000)),
        ];
        store.save_results(&stats).await.unwrap();
        let stored = store.get_results().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].like_ratio, "5.0000");
    }

    #[tokio::test]
    async fn trait_scan_state_round_trip() {
        let store = test_store().await;
        assert_eq!(store.get_scan_state("last_scan_at").await.unwrap(), None);
        store.set_scan_state("last_scan_at", "now").await.unwrap();
        assert_eq!(
            store.get_scan_state("last_scan_at").await.unwrap().as_deref(),
            Some("now")
        );
    }

    #[tokio::test]
    async fn trait_table_count() {
        let store = test_store().await;
        assert_eq!(store.table_count().await.unwrap(), 4);
    }
}
