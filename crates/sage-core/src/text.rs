//! UTF-8-safe text segmentation for chunked delivery.
//!
//! Transports cap outbound message size, so generated output is split into
//! ordered segments. Splits prefer the last whitespace boundary within the
//! limit so words stay intact, and always land on char boundaries. Segments
//! partition the input: concatenating them reconstructs it exactly.

/// Split `text` into ordered segments of at most `max_bytes` bytes.
///
/// The cut point is the end of the last whitespace character at or before
/// `max_bytes` in the remaining text; the whitespace stays with the leading
/// segment so the round trip is exact. When no whitespace fits within the
/// limit (a single token longer than the limit), the cut falls back to the
/// largest char boundary within `max_bytes`, and when even one character
/// exceeds the limit, that character is emitted alone. That forced case is
/// the only way a segment may exceed `max_bytes`.
pub fn split_chunks(text: &str, max_bytes: usize) -> Vec<String> {
    let max_bytes = max_bytes.max(1);
    let mut segments = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        if rest.len() <= max_bytes {
            segments.push(rest.to_string());
            break;
        }

        let hard = floor_char_boundary(rest, max_bytes);
        let cut = match rest[..hard].rfind(|c: char| c.is_whitespace()) {
            // Cut just past the whitespace; it began within the limit, and
            // ends at most at `hard`, so the segment stays within bounds.
            Some(pos) => pos + rest[pos..].chars().next().map_or(1, char::len_utf8),
            None if hard > 0 => hard,
            // First char alone is wider than the limit; emit it whole.
            None => rest.chars().next().map_or(1, char::len_utf8),
        };

        segments.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }

    segments
}

/// Truncate a string to at most `max_bytes` bytes at a char boundary.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    &s[..floor_char_boundary(s, max_bytes)]
}

/// Truncate `s` and append `suffix` if the original exceeds `max_bytes`.
///
/// The returned string is at most `max_bytes` bytes long, suffix included.
pub fn truncate_with_suffix(s: &str, max_bytes: usize, suffix: &str) -> String {
    if s.len() <= max_bytes {
        return s.to_owned();
    }
    let body_budget = max_bytes.saturating_sub(suffix.len());
    format!("{}{}", truncate_str(s, body_budget), suffix)
}

/// Largest char boundary in `s` that is `<= max_bytes`.
fn floor_char_boundary(s: &str, max_bytes: usize) -> usize {
    if s.len() <= max_bytes {
        return s.len();
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    end
}
