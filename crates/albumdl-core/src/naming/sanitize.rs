//! Filesystem-safe name components.

/// Linux NAME_MAX in bytes.
pub const NAME_MAX: usize = 255;

/// Sanitizes a title for use as a single path component, at most `max_bytes` long.
///
/// - Replaces NUL, `/`, `\`, and control characters with `_`
/// - Collapses runs of replaced characters into one `_`
/// - Trims leading/trailing spaces, dots and underscores
/// - Truncates on a char boundary
///
/// Spaces inside the title are kept. May return an empty string.
pub fn sanitize_component(name: &str, max_bytes: usize) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_replaced = false;

    for c in name.chars() {
        if c == '\0' || c == '/' || c == '\\' || c.is_control() {
            if !prev_replaced {
                out.push('_');
            }
            prev_replaced = true;
        } else {
            out.push(c);
            prev_replaced = false;
        }
    }

    let trimmed = trim_edges(&out);
    if trimmed.len() <= max_bytes {
        return trimmed.to_string();
    }
    let mut take = max_bytes;
    while take > 0 && !trimmed.is_char_boundary(take) {
        take -= 1;
    }
    trim_edges(&trimmed[..take]).to_string()
}

fn trim_edges(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || c == '.' || c == '_')
}
