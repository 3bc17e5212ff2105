/// Maximum number of characters kept in a record's snippet.
pub const SNIPPET_MAX_CHARS: usize = 2000;

/// Trim the text and collapse every internal whitespace run (newlines
/// included) to a single space.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The first [`SNIPPET_MAX_CHARS`] characters of `text`.
///
/// Counts characters, not bytes, so multi-byte text is never cut inside
/// a code point.
pub fn snippet(text: &str) -> String {
    match text.char_indices().nth(SNIPPET_MAX_CHARS) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
