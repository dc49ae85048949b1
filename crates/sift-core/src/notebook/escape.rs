//! Line marking for the notebook normalizer.
//!
//! Code-cell source lines are prefixed with a private one-character
//! marker before the document is pretty-printed, so that they can be
//! recognized again in the printed output. The marker is a BEL control
//! character: JSON serializers always render it as the six-byte escape
//! `\u0007`, never alter it, and real source text never starts with it.

/// Marker prepended to every code-cell source line.
pub const ESCAPE: char = '\u{0007}';

/// Prepend the marker to a source line.
pub fn escape(line: &str) -> String {
    let mut escaped = String::with_capacity(line.len() + ESCAPE.len_utf8());
    escaped.push(ESCAPE);
    escaped.push_str(line);
    escaped
}

/// Recover a marked source line from one line of pretty-printed JSON.
///
/// The printed line must be a lone JSON string token (optionally
/// followed by a comma) whose decoded value starts with the marker.
/// Returns the line content with the marker and at most one trailing
/// newline removed, or `None` for structural lines and unmarked
/// strings.
pub fn unescape(printed_line: &str) -> Option<String> {
    let token = printed_line.trim();
    let token = token.strip_suffix(',').unwrap_or(token);

    if token.len() < 2 || !token.starts_with('"') || !token.ends_with('"') {
        return None;
    }

    // Structural lines like `"cell_type": "code"` fail to decode as a
    // single string token and fall through to None.
    let decoded: String = serde_json::from_str(token).ok()?;
    let rest = decoded.strip_prefix(ESCAPE)?;

    // Notebook source lines may carry their own trailing newline; the
    // normalizer re-appends exactly one either way.
    let rest = rest.strip_suffix('\n').unwrap_or(rest);
    Some(rest.to_string())
}
