// User settings shared by the coordinator, page sessions, and the CLI.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared handle to the live settings. The coordinator writes on save,
/// every page session reads at annotation time.
pub type SharedSettings = Arc<RwLock<Settings>>;

/// User-facing settings, persisted as individual keys and synced to every
/// open page session when saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// YouTube Data API key. Empty until the user provides one.
    pub api_key: String,
    /// Minimum like ratio (percent) a video must reach to get a prefix.
    /// Failed lookups are annotated regardless so the user sees them.
    pub min_ratio: f64,
    /// Cap on how many candidates a full scan examines.
    pub max_results: u32,
    /// Master toggle. Turning it off restores every annotated title.
    pub enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            min_ratio: 0.1,
            max_results: 50,
            enabled: true,
        }
    }
}

impl Settings {
    /// Check a payload before persisting it. An empty API key is allowed
    /// here; the analyze entry point rejects it with its own message.
    pub fn validate(&self) -> Result<()> {
        if !self.min_ratio.is_finite() || self.min_ratio < 0.0 {
            bail!("Minimum ratio must be a positive number");
        }
        if self.max_results < 1 {
            bail!("Maximum results must be at least 1");
        }
        Ok(())
    }

    pub fn shared(self) -> SharedSettings {
        Arc::new(RwLock::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_first_run_state() {
        let settings = Settings::default();
        assert_eq!(settings.api_key, "");
        assert!((settings.min_ratio - 0.1).abs() < f64::EPSILON);
        assert_eq!(settings.max_results, 50);
        assert!(settings.enabled);
    }

    #[test]
    fn validate_rejects_bad_numbers() {
        let mut settings = Settings::default();
        settings.min_ratio = -0.5;
        assert!(settings.validate().is_err());

        settings.min_ratio = f64::NAN;
        assert!(settings.validate().is_err());

        settings.min_ratio = 0.0;
        settings.max_results = 0;
        assert!(settings.validate().is_err());

        settings.max_results = 1;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert!(json.get("apiKey").is_some());
        assert!(json.get("minRatio").is_some());
        assert!(json.get("maxResults").is_some());
        assert!(json.get("enabled").is_some());
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"minRatio": 2.5}"#).unwrap();
        assert!((settings.min_ratio - 2.5).abs() < f64::EPSILON);
        assert_eq!(settings.max_results, 50);
        assert!(settings.enabled);
    }
}
