// YouTube Data API v3 client. Counts come back as decimal strings in the
// `statistics` part; everything else about the response is left alone.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{StatLookup, StatsProvider};
use crate::store::Store;

pub const DEFAULT_API_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Live API client. The key is read from the store on every fetch so a key
/// saved mid-session takes effect without restarting anything.
pub struct YouTubeStatsClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn Store>,
}

impl YouTubeStatsClient {
    pub fn new(base_url: impl Into<String>, store: Arc<dyn Store>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            store,
        }
    }

    async fn request(&self, video_id: &str, api_key: &str) -> StatLookup {
        let url = format!(
            "{}/videos?id={}&part=statistics&key={}",
            self.base_url, video_id, api_key
        );

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(e) => return StatLookup::failure(e.to_string()),
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = match response.json::<ApiErrorResponse>().await {
                Ok(body) => body.error.message,
                Err(_) => format!("HTTP error {status}"),
            };
            return StatLookup::failure(message);
        }

        let body: VideoListResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => return StatLookup::failure(e.to_string()),
        };

        let Some(item) = body.items.first() else {
            return StatLookup::failure("Video not found or API quota exceeded");
        };
        let Some(stats) = &item.statistics else {
            return StatLookup::failure("No statistics found for video");
        };

        let views = stats.view_count.as_deref().unwrap_or("0").parse().unwrap_or(0);
        let likes = stats.like_count.as_deref().unwrap_or("0").parse().unwrap_or(0);
        StatLookup::success(views, likes)
    }
}

#[async_trait]
impl StatsProvider for YouTubeStatsClient {
    async fn fetch(&self, video_id: &str) -> StatLookup {
        let api_key = match self.store.get_settings().await {
            Ok(settings) => settings.api_key,
            Err(e) => return StatLookup::failure(e.to_string()),
        };
        if api_key.is_empty() {
            return StatLookup::failure("No YouTube API key provided");
        }

        debug!(video_id, "Fetching video statistics");
        let lookup = self.request(video_id, &api_key).await;
        if lookup.error {
            warn!(video_id, message = ?lookup.message, "Statistics fetch failed");
        }
        lookup
    }
}

// Response shapes, trimmed to the fields we read.

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    statistics: Option<VideoStatistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
    like_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}
