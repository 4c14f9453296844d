/// Shortest token (in characters) that earns its own index key.
/// Single letters would attach every restaurant to a one-character prefix.
pub const MIN_TOKEN_CHARS: usize = 2;

/// Whitespace-separated name tokens of at least `min_chars` characters
pub fn name_tokens(name: &str, min_chars: usize) -> impl Iterator<Item = &str> {
    name.split_whitespace()
        .filter(move |t| t.chars().count() >= min_chars)
}

/// Comma-separated, trimmed cuisine tokens of at least `min_chars` characters
pub fn cuisine_tokens(cuisines: &str, min_chars: usize) -> impl Iterator<Item = &str> {
    split_list(cuisines).filter(move |t| t.chars().count() >= min_chars)
}

/// Split a comma-joined list, trimming entries and dropping empty ones
pub fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Case-insensitive substring test; `needle_lower` must already be lowercase
pub fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    if haystack.is_ascii() && needle_lower.is_ascii() {
        return haystack
            .as_bytes()
            .windows(needle_lower.len().max(1))
            .any(|w| w.eq_ignore_ascii_case(needle_lower.as_bytes()))
            || needle_lower.is_empty();
    }
    haystack.to_lowercase().contains(needle_lower)
}
