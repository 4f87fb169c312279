// Passthrough engine, used when resolution is disabled

use async_trait::async_trait;

use super::traits::ResolverEngine;
use crate::resolver::errors::ResolveError;
use crate::resolver::models::TranscriptRecord;

/// No-op backend: locators resolve to themselves and transcripts to an
/// empty sequence. Keeps the bridge wired for hosts that ship without
/// the scripting runtime.
pub struct NullEngine;

#[async_trait]
impl ResolverEngine for NullEngine {
    fn name(&self) -> &'static str {
        "null"
    }

    async fn resolve_stream(&self, locator: &str) -> Result<String, ResolveError> {
        Ok(locator.to_string())
    }

    async fn resolve_transcript(
        &self,
        _video_id: &str,
    ) -> Result<Vec<TranscriptRecord>, ResolveError> {
        Ok(Vec::new())
    }
}
