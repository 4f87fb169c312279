// Capability interface over the resolution backend

use async_trait::async_trait;

use crate::resolver::errors::ResolveError;
use crate::resolver::models::TranscriptRecord;

/// A backend able to turn a watchable locator into a direct stream URL
/// and an 11-character video ID into timed caption segments.
#[async_trait]
pub trait ResolverEngine: Send + Sync {
    /// Name of the engine (for logging)
    fn name(&self) -> &'static str;

    /// Resolve a recognized locator into a direct stream URL.
    async fn resolve_stream(&self, locator: &str) -> Result<String, ResolveError>;

    /// Resolve a video ID into ordered caption segments.
    async fn resolve_transcript(&self, video_id: &str)
        -> Result<Vec<TranscriptRecord>, ResolveError>;
}
