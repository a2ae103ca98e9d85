//! Small string helpers shared by the extractors and the reconciler.
//!
//! - Whitespace normalisation for text pulled out of uncontrolled markup
//! - Char-boundary-safe truncation for persisted fields
//! - Log truncation so response bodies never flood the log stream

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to roughly `max` bytes (backed off to the
/// nearest char boundary) with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Collapse every run of whitespace (including newlines and NBSP) into a
/// single space and trim both ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep at most `max_chars` characters. Counts chars, not bytes, so Turkish
/// text is never cut in the middle of a code point.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
