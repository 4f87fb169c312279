// Data types shared across the resolver

use serde::{Deserialize, Serialize};

/// One timed caption segment, as produced by the transcript driver.
///
/// Records come back as an ordered sequence; a fresh `Vec` is built on
/// every resolve call and owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    /// Caption text
    pub text: String,
    /// Offset from the start of the video, in seconds
    pub start: f64,
    /// Segment length in seconds
    pub duration: f64,
}
