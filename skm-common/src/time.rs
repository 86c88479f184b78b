//! Time and text formatting helpers

use chrono::{DateTime, Utc};

/// Format a timestamp as `YYYYMMDD_HHMM` for artifact file names
pub fn artifact_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d_%H%M").to_string()
}

/// First `max_chars` characters of `text`
///
/// Counts Unicode scalar values, not bytes or UTF-16 units: an emoji or other
/// astral character counts as one and is never split.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Truncated preview of `text` with a trailing `...` when it was cut
pub fn preview(text: &str, max_chars: usize) -> String {
    let head = truncate_chars(text, max_chars);
    if head.len() < text.len() {
        format!("{}...", head)
    } else {
        head.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_artifact_timestamp_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 59).unwrap();
        assert_eq!(artifact_timestamp(at), "20240307_0905");
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("Разработка API", 10), "Разработка");
        assert_eq!(truncate_chars("short", 50), "short");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn test_truncate_chars_keeps_astral_characters_whole() {
        assert_eq!(truncate_chars("🚀🚀🚀 launch", 2), "🚀🚀");
        assert_eq!(truncate_chars("a🚀b", 2), "a🚀");
    }

    #[test]
    fn test_preview_adds_ellipsis_only_when_cut() {
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("abc", 3), "abc");
    }
}
