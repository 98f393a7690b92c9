// Video statistics: lookups, the per-session result cache, and the
// serialized stat records that persistence and the popup surface share.

pub mod provider;
pub mod youtube;

pub use provider::StatsProvider;
pub use youtube::YouTubeStatsClient;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ratio::like_ratio;

/// Raw outcome of one statistics fetch. Failures are values, not errors;
/// a scan pass keeps going past them.
#[derive(Debug, Clone, PartialEq)]
pub struct StatLookup {
    pub views: i64,
    pub likes: i64,
    pub error: bool,
    pub message: Option<String>,
}

impl StatLookup {
    pub fn success(views: i64, likes: i64) -> Self {
        Self {
            views,
            likes,
            error: false,
            message: None,
        }
    }

    /// The error sentinel: counts of -1 and a human-readable reason.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            views: -1,
            likes: -1,
            error: true,
            message: Some(message.into()),
        }
    }
}

/// One cached video result. `like_ratio` is the ratio percentage with four
/// decimals, or the literal "0" when the lookup failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStat {
    pub video_id: String,
    pub url: String,
    pub views: i64,
    pub likes: i64,
    pub like_ratio: String,
    pub error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl VideoStat {
    pub fn from_lookup(video_id: &str, url: &str, lookup: &StatLookup) -> Self {
        if lookup.error || lookup.views < 0 || lookup.likes < 0 {
            Self {
                video_id: video_id.to_string(),
                url: url.to_string(),
                views: lookup.views,
                likes: lookup.likes,
                like_ratio: "0".to_string(),
                error: true,
                message: lookup.message.clone(),
            }
        } else {
            Self {
                video_id: video_id.to_string(),
                url: url.to_string(),
                views: lookup.views,
                likes: lookup.likes,
                like_ratio: format!("{:.4}", like_ratio(lookup.views, lookup.likes)),
                error: false,
                message: None,
            }
        }
    }

    /// The stored ratio as a number again, for threshold checks and display.
    pub fn ratio_value(&self) -> f64 {
        self.like_ratio.parse().unwrap_or(0.0)
    }
}

/// Per-session stat cache. Each video is fetched at most once for the life
/// of a page; iteration order is insertion order so persisted results keep
/// the order videos were first seen in.
#[derive(Debug, Default)]
pub struct ResultCache {
    order: Vec<String>,
    by_id: HashMap<String, VideoStat>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, video_id: &str) -> Option<&VideoStat> {
        self.by_id.get(video_id)
    }

    pub fn insert(&mut self, stat: VideoStat) {
        if !self.by_id.contains_key(&stat.video_id) {
            self.order.push(stat.video_id.clone());
        }
        self.by_id.insert(stat.video_id.clone(), stat);
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.by_id.clear();
    }

    /// Everything in the cache, in first-seen order.
    pub fn stats(&self) -> Vec<VideoStat> {
        self.order
            .iter()
            .filter_map(|id| self.by_id.get(id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_failure_becomes_error_sentinel() {
        let stat = VideoStat::from_lookup("abc", "url", &StatLookup::failure("quota"));
        assert_eq!(stat.views, -1);
        assert_eq!(stat.likes, -1);
        assert_eq!(stat.like_ratio, "0");
        assert!(stat.error);
        assert_eq!(stat.message.as_deref(), Some("quota"));
    }

    #[test]
    fn clean_lookup_stores_four_decimal_ratio() {
        let stat = VideoStat::from_lookup("abc", "url", &StatLookup::success(1000, 57));
        assert_eq!(stat.like_ratio, "5.7000");
        assert!(!stat.error);
        assert!((stat.ratio_value() - 5.7).abs() < 1e-9);
    }

    #[test]
    fn zero_views_is_valid_but_ratio_zero() {
        let stat = VideoStat::from_lookup("abc", "url", &StatLookup::success(0, 0));
        assert_eq!(stat.like_ratio, "0.0000");
        assert!(!stat.error);
    }

    #[test]
    fn cache_keeps_first_seen_order() {
        let mut cache = ResultCache::new();
        for id in ["b", "a", "c"] {
            cache.insert(VideoStat::from_lookup(id, "url", &StatLookup::success(100, 10)));
        }
        // re-inserting must not move an entry
        cache.insert(VideoStat::from_lookup("a", "url", &StatLookup::success(200, 20)));
        let ids: Vec<_> = cache.stats().into_iter().map(|s| s.video_id).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("a").map(|s| s.views), Some(200));
    }
}
