//! Deterministic save-path derivation for captures and journey exports.
//!
//! Pure string work: given the same URL, timestamp, and sequence number the
//! same folder and filename come back, which keeps exports collision-free
//! and the logic trivially testable. Malformed URLs never fail; they fall
//! back to a fixed domain token.

use chrono::{TimeZone, Utc};

/// Domain token used when the source URL cannot be parsed
pub const FALLBACK_DOMAIN: &str = "screenshot";

/// Filename prefix for single captures
const SNAP_PREFIX: &str = "snap";

/// Filename prefix for journey entries
const JOURNEY_PREFIX: &str = "journey";

/// A derived save location: folder plus filename, both filesystem-safe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePath {
    pub folder: String,
    pub filename: String,
}

impl SavePath {
    /// Folder and filename joined with `/` (the separator the download
    /// provider expects)
    pub fn joined(&self) -> String {
        format!("{}/{}", self.folder, self.filename)
    }
}

/// Derive the save path for a capture.
///
/// `sequence` distinguishes journey entries (zero-padded to three digits in
/// the filename) from single captures.
pub fn build_path(url: &str, timestamp_ms: i64, sequence: Option<u32>) -> SavePath {
    let domain = domain_token(url);
    let time = time_token(timestamp_ms);
    let folder = format!("{}_{}", domain, time);
    let filename = match sequence {
        Some(seq) => format!("{}_{}_{}_{:03}.png", JOURNEY_PREFIX, domain, time, seq),
        None => format!("{}_{}_{}.png", SNAP_PREFIX, domain, time),
    };
    SavePath { folder, filename }
}

/// Extract a filesystem-safe domain token from a URL.
///
/// Strips the scheme, userinfo, port and path, drops a leading `www.`, and
/// replaces every non-alphanumeric character with `_`. Anything that does
/// not look like a URL with an authority yields [`FALLBACK_DOMAIN`].
pub fn domain_token(url: &str) -> String {
    let Some(rest) = url.split_once("://").map(|(_, rest)| rest) else {
        return FALLBACK_DOMAIN.to_string();
    };
    let authority = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or("");
    let host = authority
        .rsplit_once('@')
        .map_or(authority, |(_, host)| host);
    let host = host.split(':').next().unwrap_or("");
    let host = host.strip_prefix("www.").unwrap_or(host);

    if host.is_empty() || !host.chars().any(|c| c.is_ascii_alphanumeric()) {
        return FALLBACK_DOMAIN.to_string();
    }
    host.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// ISO-8601-derived time token, millisecond precision, with `:` and `.`
/// replaced so it is safe in file and folder names. Milliseconds keep rapid
/// back-to-back captures of the same page from colliding.
pub fn time_token(timestamp_ms: i64) -> String {
    let datetime = Utc
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .unwrap_or_else(|| Utc.timestamp_millis_opt(0).unwrap());
    datetime.format("%Y-%m-%dT%H-%M-%S-%3f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_path_is_pure() {
        let a = build_path("https://example.com/page", 1_700_000_000_000, Some(3));
        let b = build_path("https://example.com/page", 1_700_000_000_000, Some(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_build_path_single_capture() {
        let path = build_path("https://example.com/page", 0, None);
        assert_eq!(path.folder, "example_com_1970-01-01T00-00-00-000");
        assert_eq!(path.filename, "snap_example_com_1970-01-01T00-00-00-000.png");
    }

    #[test]
    fn test_build_path_sub_second_captures_do_not_collide() {
        let a = build_path("https://example.com/page-a", 1_700_000_000_100, None);
        let b = build_path("https://example.com/page-a", 1_700_000_000_900, None);
        assert_ne!(a.folder, b.folder);
        assert_ne!(a.filename, b.filename);
    }

    #[test]
    fn test_build_path_journey_sequence_is_zero_padded() {
        let path = build_path("https://example.com", 0, Some(7));
        assert!(path.filename.ends_with("_007.png"), "{}", path.filename);
        let path = build_path("https://example.com", 0, Some(42));
        assert!(path.filename.ends_with("_042.png"), "{}", path.filename);
    }

    #[test]
    fn test_domain_token_strips_www_and_sanitizes() {
        assert_eq!(domain_token("https://www.example.com/a/b"), "example_com");
        assert_eq!(domain_token("http://sub.example.co.uk:8080/x"), "sub_example_co_uk");
        assert_eq!(domain_token("https://user:pw@example.com/"), "example_com");
    }

    #[test]
    fn test_domain_token_malformed_falls_back() {
        assert_eq!(domain_token("not a url"), FALLBACK_DOMAIN);
        assert_eq!(domain_token(""), FALLBACK_DOMAIN);
        assert_eq!(domain_token("https://"), FALLBACK_DOMAIN);
        assert_eq!(domain_token("https://..."), FALLBACK_DOMAIN);
    }

    #[test]
    fn test_time_token_has_no_colons_or_dots() {
        let token = time_token(1_700_000_123_456);
        assert!(!token.contains(':'));
        assert!(!token.contains('.'));
        assert!(token.starts_with("2023-11-"));
    }

    #[test]
    fn test_time_token_out_of_range_falls_back_to_epoch() {
        assert_eq!(time_token(i64::MAX), "1970-01-01T00-00-00-000");
    }

    #[test]
    fn test_joined() {
        let path = build_path("https://example.com", 0, None);
        assert_eq!(path.joined(), format!("{}/{}", path.folder, path.filename));
    }
}
