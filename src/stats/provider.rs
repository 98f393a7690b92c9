// Statistics lookup behind a trait so scan passes can run against scripted
// data in tests and the CLI can swap transports later.

use async_trait::async_trait;

use super::StatLookup;

#[async_trait]
pub trait StatsProvider: Send + Sync {
    /// Fetch view and like counts for one video. Failures come back inside
    /// the lookup rather than as an Err, so one bad video never aborts a
    /// whole scan pass.
    async fn fetch(&self, video_id: &str) -> StatLookup;
}
