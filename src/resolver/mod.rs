// YouTube resolver facade: link heuristics, playlist scanning, package
// provisioning and driver-backed stream/transcript resolution.

pub mod engine;
pub mod errors;
pub mod locator;
pub mod models;
pub mod playlist;
pub mod process;
pub mod provision;
pub mod session;

use std::path::Path;

use tokio::sync::OnceCell;

use crate::resolver::engine::{DriverKind, PyDriverEngine, PyRuntime};
use crate::resolver::errors::ResolveError;
use crate::resolver::models::TranscriptRecord;
use crate::resolver::provision::{ensure_package, PackageSpec, PYTUBE, TRANSCRIPT_API};
use crate::resolver::session::ResolverSession;

/// Entry point for stream and transcript resolution.
///
/// Holds one shared interpreter runtime and two independent lazy
/// sessions. Every public method is total: failures are logged and
/// degrade to the fallback value, they never surface to the caller.
pub struct YoutubeResolver {
    runtime: OnceCell<Option<PyRuntime>>,
    stream: ResolverSession<PyDriverEngine>,
    transcript: ResolverSession<PyDriverEngine>,
}

impl YoutubeResolver {
    pub fn new() -> Self {
        Self {
            runtime: OnceCell::new(),
            stream: ResolverSession::new("StreamResolver"),
            transcript: ResolverSession::new("TranscriptResolver"),
        }
    }

    /// Discover the interpreter once; both sessions share the result.
    async fn runtime(&self) -> Result<PyRuntime, ResolveError> {
        let slot = self
            .runtime
            .get_or_init(|| async {
                match PyRuntime::discover() {
                    Ok(rt) => {
                        log::info!("[Resolver] runtime ready: {}", rt.interpreter());
                        Some(rt)
                    }
                    Err(err) => {
                        log::error!("[Resolver] runtime discovery failed: {}", err);
                        None
                    }
                }
            })
            .await;
        slot.clone()
            .ok_or_else(|| ResolveError::Bootstrap("python runtime unavailable".to_string()))
    }

    /// Provision the package, then bring up the driver for `kind`.
    async fn bootstrap_engine(
        &self,
        kind: DriverKind,
        spec: &PackageSpec,
    ) -> Result<PyDriverEngine, ResolveError> {
        let package = ensure_package(spec).await?;
        let runtime = self.runtime().await?;
        if kind == DriverKind::Transcript {
            // The transcript package calls out over HTTP at resolve time.
            runtime.ensure_module("requests", "requests").await?;
        }
        PyDriverEngine::bootstrap(runtime, kind, &package).await
    }

    /// Resolve free-form text into a direct stream URL.
    ///
    /// Text without a recognizable YouTube link comes back unchanged. A
    /// recognized link that fails to resolve yields an empty string.
    pub async fn resolve_stream_url(&self, text: &str) -> String {
        let locator = match locator::extract_stream_locator(text) {
            Some(locator) => locator,
            None => return text.to_string(),
        };
        log::debug!("[StreamResolver] locator: {}", locator);
        self.stream
            .resolve_stream_with(
                || self.bootstrap_engine(DriverKind::Stream, &PYTUBE),
                &locator,
            )
            .await
    }

    /// Resolve free-form text into the video's transcript records.
    ///
    /// Text without an extractable video ID, and any resolution failure,
    /// yield an empty sequence.
    pub async fn resolve_transcripts(&self, text: &str) -> Vec<TranscriptRecord> {
        let video_id = match locator::extract_video_id(text) {
            Some(id) => id,
            None => return Vec::new(),
        };
        log::debug!("[TranscriptResolver] video id: {}", video_id);
        self.transcript
            .resolve_transcript_with(
                || self.bootstrap_engine(DriverKind::Transcript, &TRANSCRIPT_API),
                &video_id,
            )
            .await
    }

    /// Expand a playlist URL into its watch links. See [`playlist::parse_playlist`].
    pub async fn parse_playlist(&self, url: &str, force: bool) -> Vec<String> {
        playlist::parse_playlist(url, force).await
    }

    /// Scan a saved playlist page on disk for watch links.
    pub fn parse_playlist_file(&self, path: &Path) -> Vec<String> {
        playlist::parse_playlist_file(path)
    }
}

impl Default for YoutubeResolver {
    fn default() -> Self {
        Self::new()
    }
}
