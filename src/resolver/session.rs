// Lazily-built resolver sessions with sticky failure semantics

use std::future::Future;
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::resolver::engine::ResolverEngine;
use crate::resolver::errors::ResolveError;
use crate::resolver::models::TranscriptRecord;

/// One lazily-initialized engine slot.
///
/// The engine is built at most once, on first use, behind a one-time
/// initialization guard (exclusive during construction, shared reads
/// afterward). A failed build is recorded as `None` and never retried:
/// the session stays invalid for the remaining process lifetime.
pub struct ResolverSession<E> {
    slot: OnceCell<Option<Arc<E>>>,
    tag: &'static str,
}

impl<E: ResolverEngine> ResolverSession<E> {
    pub fn new(tag: &'static str) -> Self {
        Self {
            slot: OnceCell::new(),
            tag,
        }
    }

    /// Whether the session has been built and is usable.
    pub fn is_valid(&self) -> bool {
        matches!(self.slot.get(), Some(Some(_)))
    }

    async fn engine<F, Fut>(&self, build: F) -> Option<Arc<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<E, ResolveError>>,
    {
        let tag = self.tag;
        self.slot
            .get_or_init(|| async move {
                match build().await {
                    Ok(engine) => {
                        log::debug!("[{}] session ready ({})", tag, engine.name());
                        Some(Arc::new(engine))
                    }
                    Err(err) => {
                        log::error!(
                            "[{}] session bootstrap failed ({}): {}",
                            tag,
                            err.category(),
                            err
                        );
                        None
                    }
                }
            })
            .await
            .clone()
    }

    /// Resolve a stream locator.
    ///
    /// Invalid session: the locator comes back unchanged. A failed call:
    /// empty string for this call only; the session stays usable.
    pub async fn resolve_stream_with<F, Fut>(&self, build: F, locator: &str) -> String
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<E, ResolveError>>,
    {
        let engine = match self.engine(build).await {
            Some(engine) => engine,
            None => return locator.to_string(),
        };
        match engine.resolve_stream(locator).await {
            Ok(url) => url,
            Err(err) => {
                log::error!("[{}] resolve failed ({}): {}", self.tag, err.category(), err);
                String::new()
            }
        }
    }

    /// Resolve a video ID into transcript records.
    ///
    /// Invalid session or a failed call both degrade to an empty
    /// sequence; a failed call does not invalidate the session.
    pub async fn resolve_transcript_with<F, Fut>(
        &self,
        build: F,
        video_id: &str,
    ) -> Vec<TranscriptRecord>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<E, ResolveError>>,
    {
        let engine = match self.engine(build).await {
            Some(engine) => engine,
            None => return Vec::new(),
        };
        match engine.resolve_transcript(video_id).await {
            Ok(records) => records,
            Err(err) => {
                log::error!("[{}] resolve failed ({}): {}", self.tag, err.category(), err);
                Vec::new()
            }
        }
    }
}
