use std::env;

use anyhow::Result;

use crate::stats::youtube::DEFAULT_API_URL;

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file is
/// loaded automatically at startup via dotenvy.
pub struct Config {
    /// YouTube Data API key seed — used when the store has no key saved
    /// yet. The live credential the scan uses comes from the settings.
    pub api_key: String,
    /// YouTube Data API base URL (defaults to the public v3 endpoint;
    /// tests and mocks point it elsewhere).
    pub api_url: String,
    pub db_path: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default except the API key, which stays empty
    /// until the user provides one here or through settings.
    pub fn load() -> Result<Self> {
        Ok(Self {
            api_key: env::var("YOUTUBE_API_KEY").unwrap_or_default(),
            api_url: env::var("YOUTUBE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            db_path: env::var("RATIOED_DB_PATH").unwrap_or_else(|_| "./ratioed.db".to_string()),
        })
    }

    /// Check that an API key is available from somewhere before a scan.
    /// `saved_key` is whatever the settings store currently holds.
    pub fn require_api_key(&self, saved_key: &str) -> Result<()> {
        if saved_key.is_empty() && self.api_key.is_empty() {
            anyhow::bail!(
                "No YouTube API key provided. Set YOUTUBE_API_KEY in your .env file\n\
                 or save one with `ratioed settings --api-key <KEY>`."
            );
        }
        Ok(())
    }
}
