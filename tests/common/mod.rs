// Shared test fixtures: page snapshot builders, a scripted stats provider,
// and a session harness wired to the in-memory store.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::{mpsc, Semaphore};

use ratioed::page::SnapshotNode;
use ratioed::protocol::{EngineEvent, TabId};
use ratioed::session::{PageSession, SessionOptions};
use ratioed::settings::{Settings, SharedSettings};
use ratioed::stats::{StatLookup, StatsProvider};
use ratioed::store::MemoryStore;

pub const HOMEPAGE_URL: &str = "https://www.youtube.com/";
pub const GOOGLE_URL: &str = "https://www.google.com/search?q=rust+tutorials";

/// One YouTube video card the way the homepage grid renders it.
pub fn video_card(video_id: &str) -> serde_json::Value {
    json!({
        "tag": "ytd-rich-grid-media",
        "children": [
            {
                "tag": "a",
                "attrs": { "id": "thumbnail", "href": format!("/watch?v={video_id}") },
                "children": [ { "tag": "img", "attrs": { "src": "thumb.jpg" } } ]
            },
            {
                "tag": "h3",
                "children": [
                    {
                        "tag": "a",
                        "attrs": { "id": "video-title" },
                        "children": [ format!("Video {video_id}") ]
                    }
                ]
            }
        ]
    })
}

/// A homepage snapshot holding one card per video id.
pub fn homepage_snapshot(video_ids: &[&str]) -> SnapshotNode {
    let cards: Vec<serde_json::Value> = video_ids.iter().map(|id| video_card(id)).collect();
    serde_json::from_value(json!({ "tag": "body", "children": cards })).unwrap()
}

/// One Google result block wrapping a YouTube watch link.
pub fn google_result(video_id: &str) -> serde_json::Value {
    json!({
        "tag": "div",
        "attrs": { "class": "g" },
        "children": [
            {
                "tag": "a",
                "attrs": { "href": format!("https://www.youtube.com/watch?v={video_id}") },
                "children": [
                    { "tag": "h3", "children": [ format!("Result {video_id}") ] }
                ]
            }
        ]
    })
}

pub fn google_snapshot(video_ids: &[&str]) -> SnapshotNode {
    let results: Vec<serde_json::Value> = video_ids.iter().map(|id| google_result(id)).collect();
    serde_json::from_value(json!({ "tag": "body", "children": results })).unwrap()
}

/// Stats provider returning scripted lookups and recording every call.
/// With a gate installed, each fetch consumes one permit, so tests can
/// hold the pipeline at a fetch boundary.
pub struct ScriptedProvider {
    lookups: Mutex<HashMap<String, StatLookup>>,
    calls: Mutex<Vec<String>>,
    gate: Option<Arc<Semaphore>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            lookups: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            gate: None,
            delay: None,
        }
    }

    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    pub fn success(self, video_id: &str, views: i64, likes: i64) -> Self {
        self.lookups
            .lock()
            .unwrap()
            .insert(video_id.to_string(), StatLookup::success(views, likes));
        self
    }

    pub fn failure(self, video_id: &str, message: &str) -> Self {
        self.lookups
            .lock()
            .unwrap()
            .insert(video_id.to_string(), StatLookup::failure(message));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl StatsProvider for ScriptedProvider {
    async fn fetch(&self, video_id: &str) -> StatLookup {
        self.calls.lock().unwrap().push(video_id.to_string());
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let lookup = self.lookups.lock().unwrap().get(video_id).cloned();
        lookup.unwrap_or_else(|| StatLookup::failure("Video not found or API quota exceeded"))
    }
}

/// Settings with a key configured, the way a working install looks.
pub fn test_settings() -> Settings {
    Settings {
        api_key: "AIzaTestKey".to_string(),
        ..Settings::default()
    }
}

pub struct Harness {
    pub session: PageSession,
    pub settings: SharedSettings,
    pub store: Arc<MemoryStore>,
    pub provider: Arc<ScriptedProvider>,
    pub events: mpsc::UnboundedReceiver<EngineEvent>,
}

/// A session over the in-memory store with a short settle delay so watcher
/// tests don't wait out the real two seconds.
pub fn harness(settings: Settings, provider: ScriptedProvider) -> Harness {
    let shared = settings.clone().shared();
    let store = Arc::new(MemoryStore::with_settings(settings));
    let provider = Arc::new(provider);
    let (events_tx, events) = mpsc::unbounded_channel();
    let session = PageSession::new(
        TabId(1),
        Arc::clone(&shared),
        Arc::clone(&provider) as Arc<dyn StatsProvider>,
        Arc::clone(&store) as Arc<dyn ratioed::store::Store>,
        events_tx,
        SessionOptions {
            settle_delay: Duration::from_millis(20),
            status_auto_hide: Duration::from_millis(50),
            show_progress: false,
        },
    );
    Harness {
        session,
        settings: shared,
        store,
        provider,
        events,
    }
}

/// The visible text of the title belonging to a video id, if any.
pub async fn title_text(session: &PageSession, video_id: &str) -> Option<String> {
    let id = video_id.to_string();
    session
        .with_document(move |doc| {
            let title = ratioed::page::Selector::parse("#video-title");
            doc.query_all(&title)
                .into_iter()
                .map(|n| doc.text_content(n))
                .find(|text| text.contains(&id))
        })
        .await
}
