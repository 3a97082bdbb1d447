//! SubRip caption text to plain transcript text.

use super::unescape;
use regex::Regex;
use std::sync::OnceLock;

fn timestamp_line() -> &'static Regex {
    static TIMESTAMP: OnceLock<Regex> = OnceLock::new();
    TIMESTAMP.get_or_init(|| Regex::new(r"^\d{2}:\d{2}:\d{2}").expect("static regex"))
}

/// Strip sequence numbers and timing lines from SRT text.
///
/// Remaining lines are trimmed, entity-decoded and joined with single spaces.
pub fn strip_srt(srt: &str) -> String {
    srt.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.chars().all(|c| c.is_ascii_digit()))
        .filter(|line| !timestamp_line().is_match(line))
        .map(unescape)
        .collect::<Vec<_>>()
        .join(" ")
}
