// Byte-level scan for watch-link references in page content
//
// No HTML parsing happens here. The scanner walks raw bytes looking for
// the literal `/watch?v=` marker, which is what pages, playlists and
// saved HTML files all contain regardless of encoding.

use std::path::Path;
use std::time::Duration;

use memmap2::Mmap;

const WATCH_MARKER: &[u8] = b"/watch?v=";
const SITE_ORIGIN: &str = "https://www.youtube.com";
const PLAYLIST_QUERY_MARKER: &str = "/playlist?list=";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Extract every distinct watch link referenced in `buffer`.
///
/// Each reference runs from the marker to the next `&`, `"`, `'` or `\`
/// byte (or buffer end) and is prefixed with the canonical site origin.
/// Duplicates are suppressed, first-occurrence order is preserved. The
/// scan resumes just past each marker rather than past the full
/// reference, so overlapping duplicates are still considered once each.
pub fn scan_watch_links(buffer: &[u8]) -> Vec<String> {
    // Dedup happens on the raw reference bytes, before any lossy text
    // conversion can collapse distinct byte sequences.
    let mut references: Vec<&[u8]> = Vec::new();
    let mut pos = 0;
    while let Some(found) = find(&buffer[pos..], WATCH_MARKER) {
        let start = pos + found;
        let rest = &buffer[start..];
        let end = rest
            .iter()
            .position(|&b| matches!(b, b'&' | b'"' | b'\'' | b'\\'))
            .unwrap_or(rest.len());
        let reference = &rest[..end];
        if !references.contains(&reference) {
            references.push(reference);
        }
        pos = start + WATCH_MARKER.len();
    }
    references
        .into_iter()
        .map(|r| format!("{}{}", SITE_ORIGIN, String::from_utf8_lossy(r)))
        .collect()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Fetch a playlist page and scan it for watch links.
///
/// Proceeds only if the URL carries the playlist query marker, unless
/// `force` overrides the gate. Fetch failures degrade to an empty list.
pub async fn parse_playlist(url: &str, force: bool) -> Vec<String> {
    if !force && !url.contains(PLAYLIST_QUERY_MARKER) {
        return Vec::new();
    }

    match fetch_page(url).await {
        Ok(body) => scan_watch_links(&body),
        Err(e) => {
            log::warn!("[Playlist] fetch failed for {}: {}", url, e);
            Vec::new()
        }
    }
}

async fn fetch_page(url: &str) -> Result<Vec<u8>, reqwest::Error> {
    let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    Ok(body.to_vec())
}

/// Scan a local file (typically a saved page) for watch links.
///
/// The file is only opened when its name contains "playlist" or "watch",
/// or ends in ".html" case-insensitively; anything else comes back empty
/// without touching the filesystem.
pub fn parse_playlist_file(path: &Path) -> Vec<String> {
    if !file_name_is_scannable(path) {
        return Vec::new();
    }

    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) => {
            log::warn!("[Playlist] cannot open {}: {}", path.display(), e);
            return Vec::new();
        }
    };
    let map = match unsafe { Mmap::map(&file) } {
        Ok(m) => m,
        Err(e) => {
            log::warn!("[Playlist] cannot map {}: {}", path.display(), e);
            return Vec::new();
        }
    };
    scan_watch_links(&map)
}

pub(crate) fn file_name_is_scannable(path: &Path) -> bool {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => {
            name.contains("playlist")
                || name.contains("watch")
                || name.to_lowercase().ends_with(".html")
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_dedup_keeps_first_occurrence_order() {
        let buffer = b"/watch?v=ID1&x ... /watch?v=ID2\" ... /watch?v=ID1&y";
        let links = scan_watch_links(buffer);
        assert_eq!(
            links,
            vec![
                "https://www.youtube.com/watch?v=ID1",
                "https://www.youtube.com/watch?v=ID2",
            ]
        );
    }

    #[test]
    fn test_scan_dedup_is_byte_exact() {
        // Both references convert to the same replacement-character text,
        // but their bytes differ, so both survive.
        let buffer = b"/watch?v=q\xFF1&x /watch?v=q\xFE1&y";
        let links = scan_watch_links(buffer);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0], links[1]);
    }

    #[test]
    fn test_scan_anchor_markup() {
        let buffer = br#"<a href="/watch?v=AAAAAAAAAAA&list=xyz">x</a><a href="/watch?v=BBBBBBBBBBB">y</a>"#;
        let links = scan_watch_links(buffer);
        assert_eq!(
            links,
            vec![
                "https://www.youtube.com/watch?v=AAAAAAAAAAA",
                "https://www.youtube.com/watch?v=BBBBBBBBBBB",
            ]
        );
    }

    #[test]
    fn test_scan_terminators() {
        let buffer = b"/watch?v=q1\\tail /watch?v=q2'tail";
        let links = scan_watch_links(buffer);
        assert_eq!(
            links,
            vec![
                "https://www.youtube.com/watch?v=q1",
                "https://www.youtube.com/watch?v=q2",
            ]
        );
    }

    #[test]
    fn test_scan_reference_runs_to_buffer_end() {
        let links = scan_watch_links(b"/watch?v=tail");
        assert_eq!(links, vec!["https://www.youtube.com/watch?v=tail"]);
    }

    #[test]
    fn test_scan_without_marker_is_empty() {
        assert!(scan_watch_links(b"<html>no videos here</html>").is_empty());
    }

    #[test]
    fn test_file_name_gate() {
        assert!(file_name_is_scannable(Path::new("/tmp/playlist.txt")));
        assert!(file_name_is_scannable(Path::new("watch-later.bin")));
        assert!(file_name_is_scannable(Path::new("SAVED.HTML")));
        assert!(!file_name_is_scannable(Path::new("notes.txt")));
    }

    #[test]
    fn test_parse_playlist_file_skips_other_names() {
        // The gate fails before any filesystem access, so a path that
        // does not exist still returns cleanly.
        let links = parse_playlist_file(Path::new("/nonexistent/notes.txt"));
        assert!(links.is_empty());
    }

    #[test]
    fn test_parse_playlist_file_scans_html() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playlist.html");
        std::fs::write(&path, "<a href=\"/watch?v=CCCCCCCCCCC\">z</a>").unwrap();
        let links = parse_playlist_file(&path);
        assert_eq!(links, vec!["https://www.youtube.com/watch?v=CCCCCCCCCCC"]);
    }

    #[tokio::test]
    async fn test_parse_playlist_gate_without_force() {
        // No playlist marker and no force: the gate short-circuits before
        // any network access happens.
        let links = parse_playlist("https://example.com/watchlist", false).await;
        assert!(links.is_empty());
    }
}
