// Heuristic recognition of YouTube links and video IDs in noisy input
//
// Both extractors use the same two-stage pipeline: try the pattern on the
// raw text, then percent-decode once and try exactly once more. Decoding
// is never applied to its own output.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref STREAM_RE: Regex =
        Regex::new(r"(http(s)?://)?((w){3}\.)?youtu(be|\.be)?(\.com)?/.+").unwrap();
    static ref ID_RE: Regex = Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").unwrap();
}

/// Find a watchable link inside `text`.
///
/// On a match the result is the substring from the match start to the end
/// of the input, so query parameters and other trailing context survive.
pub fn extract_stream_locator(text: &str) -> Option<String> {
    two_pass(text, |candidate| {
        STREAM_RE
            .find(candidate)
            .map(|m| candidate[m.start()..].to_string())
    })
}

/// Find an 11-character video ID following `v=` or a path separator.
/// Only the captured ID is returned, never the surrounding text.
pub fn extract_video_id(text: &str) -> Option<String> {
    two_pass(text, |candidate| {
        ID_RE.captures(candidate).map(|caps| caps[1].to_string())
    })
}

fn two_pass(text: &str, matcher: impl Fn(&str) -> Option<String>) -> Option<String> {
    if let Some(hit) = matcher(text) {
        return Some(hit);
    }
    matcher(&url_unescape(text))
}

/// Single non-recursive percent-decode pass.
///
/// A `%` followed by two hex digits decodes to that byte. A `%` not
/// followed by two hex digits is preserved verbatim, along with the rest
/// of its segment. The output is never rescanned, so `"%2520"` decodes to
/// `"%20"` and no further.
pub fn url_unescape(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_locator_plain() {
        let text = "check this out: https://www.youtube.com/watch?v=dQw4w9WgXcQ&foo=bar";
        let locator = extract_stream_locator(text).unwrap();
        assert_eq!(locator, "https://www.youtube.com/watch?v=dQw4w9WgXcQ&foo=bar");
    }

    #[test]
    fn test_stream_locator_short_link() {
        let locator = extract_stream_locator("youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(locator, "youtu.be/dQw4w9WgXcQ");
    }

    #[test]
    fn test_stream_locator_percent_encoded() {
        // No match on the raw text, found after one decode pass.
        let text = "https%3A%2F%2Fwww.youtube.com%2Fwatch%3Fv%3DdQw4w9WgXcQ";
        let locator = extract_stream_locator(text).unwrap();
        assert_eq!(locator, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }

    #[test]
    fn test_stream_locator_miss_leaves_input_alone() {
        assert_eq!(extract_stream_locator("just some notes"), None);
    }

    #[test]
    fn test_video_id_from_query() {
        let id = extract_video_id("...v=ABCDEFGHIJK...").unwrap();
        assert_eq!(id, "ABCDEFGHIJK");
    }

    #[test]
    fn test_video_id_mobile_url() {
        let id = extract_video_id("https://m.youtube.com/watch?v=dQw4w9WgXcQ&foo=bar").unwrap();
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn test_video_id_percent_encoded() {
        let id = extract_video_id("watch%3Fv%3DdQw4w9WgXcQ").unwrap();
        assert_eq!(id, "dQw4w9WgXcQ");
    }

    #[test]
    fn test_video_id_needs_eleven_characters() {
        assert_eq!(extract_video_id("v=tooshort"), None);
    }

    #[test]
    fn test_unescape_decodes_valid_sequences() {
        assert_eq!(url_unescape("a%20b"), "a b");
        assert_eq!(url_unescape("%41%42"), "AB");
    }

    #[test]
    fn test_unescape_preserves_incomplete_sequences() {
        assert_eq!(url_unescape("a%2"), "a%2");
        assert_eq!(url_unescape("%zz"), "%zz");
        assert_eq!(url_unescape("abc"), "abc");
    }

    #[test]
    fn test_unescape_is_not_recursive() {
        assert_eq!(url_unescape("%2520"), "%20");
    }
}
