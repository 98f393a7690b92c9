// MemoryStore — in-memory Store for tests and ephemeral runs. Same
// semantics as the SQLite backend without touching the filesystem.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use super::traits::Store;
use crate::settings::Settings;
use crate::stats::VideoStat;

#[derive(Default)]
struct State {
    settings: Option<Settings>,
    results: Vec<VideoStat>,
    scan_state: HashMap<String, String>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        let store = Self::new();
        store.state.lock().unwrap().settings = Some(settings);
        store
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn table_count(&self) -> Result<i64> {
        Ok(0)
    }

    async fn get_settings(&self) -> Result<Settings> {
        let state = self.state.lock().unwrap();
        Ok(state.settings.clone().unwrap_or_default())
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.state.lock().unwrap().settings = Some(settings.clone());
        Ok(())
    }

    async fn save_results(&self, stats: &[VideoStat]) -> Result<()> {
        self.state.lock().unwrap().results = stats.to_vec();
        Ok(())
    }

    async fn get_results(&self) -> Result<Vec<VideoStat>> {
        Ok(self.state.lock().unwrap().results.clone())
    }

    async fn get_scan_state(&self, key: &str) -> Result<Option<String>> {
        Ok(self.state.lock().unwrap().scan_state.get(key).cloned())
    }

    async fn set_scan_state(&self, key: &str, value: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .scan_state
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
