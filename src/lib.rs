//! YouTube stream and transcript resolution.
//!
//! Recognizes YouTube links in free-form text, expands playlists into
//! their watch links, provisions the resolver packages into a per-user
//! cache, and drives them through an external interpreter runtime.
//! Resolution is best-effort by design: every entry point degrades to a
//! safe fallback instead of returning an error to the caller.

pub mod resolver;

pub use resolver::engine::{DriverKind, NullEngine, PyDriverEngine, PyRuntime, ResolverEngine};
pub use resolver::errors::ResolveError;
pub use resolver::locator::{extract_stream_locator, extract_video_id, url_unescape};
pub use resolver::models::TranscriptRecord;
pub use resolver::playlist::{parse_playlist, parse_playlist_file, scan_watch_links};
pub use resolver::provision::{ensure_package, PackageSpec, PYTUBE, TRANSCRIPT_API};
pub use resolver::YoutubeResolver;
