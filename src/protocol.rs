// Message protocol between the popup/content surfaces and the engine.
// Requests are tagged by `action`, engine-initiated events by `event`,
// matching the JSON the browser side sends and expects.

use serde::{Deserialize, Serialize};

use crate::page::SnapshotNode;
use crate::settings::Settings;
use crate::stats::VideoStat;

/// Identifier for one browser tab, as assigned by the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u32);

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One inbound request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    GetSettings,
    SaveSettings {
        settings: Settings,
    },
    /// Kick off a full scan of the active tab.
    Analyze,
    /// A session finished a pass; `count` drives the badge.
    ResultsReady {
        count: usize,
    },
    ClearRatios,
    /// A page finished loading. The snapshot is optional so a bare
    /// navigation notice can still reclassify the session.
    PageLoaded {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dom: Option<SnapshotNode>,
    },
    SettingsUpdated {
        settings: Settings,
    },
    /// Subtrees appended to the live page since the last snapshot.
    PageGrew {
        nodes: Vec<SnapshotNode>,
    },
    GetResults,
}

/// Host-loop frame: every request arrives addressed to a tab.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub tab_id: TabId,
    #[serde(flatten)]
    pub request: Request,
}

/// The universal reply shape. Which optional fields are set depends on the
/// request; `success: false` always comes with `error` or `message`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<VideoStat>>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            ..Default::default()
        }
    }

    /// The soft rejection a second analyze gets while a pass is running.
    pub fn busy() -> Self {
        Self {
            success: false,
            message: Some("Already scanning".to_string()),
            ..Default::default()
        }
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            success: true,
            settings: Some(settings),
            ..Default::default()
        }
    }

    pub fn with_results(results: Vec<VideoStat>) -> Self {
        Self {
            success: true,
            results: Some(results),
            ..Default::default()
        }
    }
}

/// Engine-initiated frames pushed out through the host loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum EngineEvent {
    #[serde(rename_all = "camelCase")]
    ResultsReady { tab_id: TabId, count: usize },
    #[serde(rename_all = "camelCase")]
    AnnotationsUpdated {
        tab_id: TabId,
        annotations: Vec<AnnotationRecord>,
    },
    BadgeUpdated { text: String, color: String },
}

/// One applied annotation, enough for a thin client to mirror the change
/// without re-deriving any ratio logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRecord {
    pub video_id: String,
    pub prefix: String,
    pub tier: String,
    pub tooltip: String,
    /// Title text before the prefix was applied.
    pub title_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_round_trip_by_action_tag() {
        let parsed: Request =
            serde_json::from_str(r#"{"action": "analyze"}"#).unwrap();
        assert!(matches!(parsed, Request::Analyze));

        let parsed: Request =
            serde_json::from_str(r#"{"action": "resultsReady", "count": 4}"#).unwrap();
        assert!(matches!(parsed, Request::ResultsReady { count: 4 }));

        let parsed: Request = serde_json::from_str(
            r#"{"action": "pageLoaded", "url": "https://www.youtube.com/"}"#,
        )
        .unwrap();
        match parsed {
            Request::PageLoaded { url, dom } => {
                assert_eq!(url, "https://www.youtube.com/");
                assert!(dom.is_none());
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn envelope_flattens_tab_and_action() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"tabId": 7, "action": "clearRatios"}"#).unwrap();
        assert_eq!(envelope.tab_id, TabId(7));
        assert!(matches!(envelope.request, Request::ClearRatios));
    }

    #[test]
    fn error_responses_skip_empty_fields() {
        let json = serde_json::to_value(Response::error("nope")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "nope");
        assert!(json.get("settings").is_none());
        assert!(json.get("results").is_none());
    }

    #[test]
    fn events_carry_camel_case_fields() {
        let event = EngineEvent::ResultsReady {
            tab_id: TabId(3),
            count: 9,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "resultsReady");
        assert_eq!(json["tabId"], 3);
        assert_eq!(json["count"], 9);
    }
}
