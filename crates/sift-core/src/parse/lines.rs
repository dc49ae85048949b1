//! Logical-line assembly.
//!
//! Physical source lines are joined into logical lines across open
//! brackets, trailing-backslash continuations, and triple-quoted
//! strings, with comments stripped from the working text. Statement
//! grouping and classification happen one layer up.

use crate::error::{Error, Result};

/// One assembled logical line.
#[derive(Debug, Clone)]
pub struct LogicalLine {
    /// Working text with comments removed (string contents intact).
    pub text: String,
    /// Verbatim physical lines, joined with `\n`.
    pub raw: String,
    /// 1-based number of the first physical line.
    pub line: usize,
    /// Leading whitespace width of the first physical line.
    pub indent: usize,
}

#[derive(Debug)]
struct StringState {
    quote: u8,
    triple: bool,
    /// The next character is backslash-escaped.
    escaped: bool,
}

#[derive(Debug)]
struct ScanState {
    depth: i32,
    string: Option<StringState>,
}

/// Split source text into logical lines.
///
/// Blank and comment-only lines are dropped here. Unterminated strings
/// and unbalanced brackets fail with a [`Error::Syntax`] naming the
/// offending line.
pub fn split_logical_lines(source: &str) -> Result<Vec<LogicalLine>> {
    let mut logical = Vec::new();
    let mut state = ScanState {
        depth: 0,
        string: None,
    };
    let mut text = String::new();
    let mut raw = String::new();
    let mut start_line = 1usize;
    let mut open = false;

    for (idx, phys) in source.lines().enumerate() {
        let lineno = idx + 1;
        if open {
            text.push('\n');
            raw.push('\n');
        } else {
            start_line = lineno;
        }
        raw.push_str(phys);
        open = true;

        let backslash = scan_physical_line(phys, lineno, &mut state, &mut text)?;

        let continues = backslash
            || state.depth > 0
            || matches!(&state.string, Some(s) if s.triple || s.escaped);

        if continues {
            // A backslash at end of line escapes the newline itself.
            if let Some(s) = state.string.as_mut() {
                s.escaped = false;
            }
            continue;
        }

        if state.string.is_some() {
            return Err(Error::syntax(lineno, "unterminated string literal"));
        }

        push_logical(&mut logical, &text, &raw, start_line);
        text.clear();
        raw.clear();
        open = false;
    }

    if open {
        if let Some(s) = &state.string {
            let what = if s.triple {
                "unterminated triple-quoted string literal"
            } else {
                "unterminated string literal"
            };
            return Err(Error::syntax(start_line, what));
        }
        if state.depth > 0 {
            return Err(Error::syntax(
                start_line,
                "unexpected end of source inside brackets",
            ));
        }
        push_logical(&mut logical, &text, &raw, start_line);
    }

    Ok(logical)
}

fn push_logical(logical: &mut Vec<LogicalLine>, text: &str, raw: &str, line: usize) {
    if text.trim().is_empty() {
        return;
    }
    let first = raw.split('\n').next().unwrap_or(raw);
    let indent = first.len() - first.trim_start_matches([' ', '\t']).len();
    logical.push(LogicalLine {
        text: text.to_string(),
        raw: raw.to_string(),
        line,
        indent,
    });
}

/// Scan one physical line, updating bracket/string state and appending
/// the comment-stripped text. Returns true when the line ends with a
/// backslash continuation outside any string.
fn scan_physical_line(
    line: &str,
    lineno: usize,
    state: &mut ScanState,
    text: &mut String,
) -> Result<bool> {
    let bytes = line.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if let Some(string) = state.string.as_mut() {
            if string.escaped {
                string.escaped = false;
                i = push_char(line, i, text);
                continue;
            }
            match bytes[i] {
                b'\\' => {
                    string.escaped = true;
                    text.push('\\');
                    i += 1;
                }
                q if q == string.quote => {
                    if string.triple {
                        if bytes.len() >= i + 3 && bytes[i + 1] == q && bytes[i + 2] == q {
                            state.string = None;
                            text.push_str(&line[i..i + 3]);
                            i += 3;
                        } else {
                            text.push(q as char);
                            i += 1;
                        }
                    } else {
                        state.string = None;
                        text.push(q as char);
                        i += 1;
                    }
                }
                _ => {
                    i = push_char(line, i, text);
                }
            }
            continue;
        }

        match bytes[i] {
            // Comment runs to the end of the physical line.
            b'#' => break,
            q @ (b'\'' | b'"') => {
                let triple = bytes.len() >= i + 3 && bytes[i + 1] == q && bytes[i + 2] == q;
                state.string = Some(StringState {
                    quote: q,
                    triple,
                    escaped: false,
                });
                if triple {
                    text.push_str(&line[i..i + 3]);
                    i += 3;
                } else {
                    text.push(q as char);
                    i += 1;
                }
            }
            b'(' | b'[' | b'{' => {
                state.depth += 1;
                text.push(bytes[i] as char);
                i += 1;
            }
            c @ (b')' | b']' | b'}') => {
                state.depth -= 1;
                if state.depth < 0 {
                    return Err(Error::syntax(lineno, format!("unmatched '{}'", c as char)));
                }
                text.push(c as char);
                i += 1;
            }
            b'\\' if i + 1 == bytes.len() => {
                return Ok(true);
            }
            _ => {
                i = push_char(line, i, text);
            }
        }
    }

    Ok(false)
}

/// Append the (possibly multi-byte) character at byte offset `i`,
/// returning the next offset.
fn push_char(line: &str, i: usize, out: &mut String) -> usize {
    match line[i..].chars().next() {
        Some(ch) => {
            out.push(ch);
            i + ch.len_utf8()
        }
        None => i + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(source: &str) -> Vec<String> {
        split_logical_lines(source)
            .expect("split")
            .into_iter()
            .map(|l| l.text)
            .collect()
    }

    #[test]
    fn plain_lines_split_one_to_one() {
        assert_eq!(texts("x = 1\ny = 2\n"), vec!["x = 1", "y = 2"]);
    }

    #[test]
    fn blank_and_comment_lines_are_dropped() {
        assert_eq!(texts("x = 1\n\n# comment\n   \ny = 2\n"), vec!["x = 1", "y = 2"]);
    }

    #[test]
    fn trailing_comments_are_stripped() {
        assert_eq!(texts("x = 1  # the answer\n"), vec!["x = 1  "]);
    }

    #[test]
    fn hash_inside_string_is_not_a_comment() {
        assert_eq!(texts("s = 'a # b'\n"), vec!["s = 'a # b'"]);
    }

    #[test]
    fn open_brackets_join_lines() {
        let lines = split_logical_lines("xs = [1,\n      2,\n      3]\ny = 2\n").expect("split");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "xs = [1,\n      2,\n      3]");
        assert_eq!(lines[0].line, 1);
        assert_eq!(lines[1].line, 4);
    }

    #[test]
    fn backslash_joins_lines() {
        let lines = split_logical_lines("x = 1 + \\\n    2\n").expect("split");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "x = 1 + \n    2");
    }

    #[test]
    fn triple_quoted_string_spans_lines() {
        let lines = split_logical_lines("s = \"\"\"line one\nline two\"\"\"\n").expect("split");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].text.contains("line one\nline two"));
    }

    #[test]
    fn indent_is_recorded() {
        let lines = split_logical_lines("def f():\n    return 1\n").expect("split");
        assert_eq!(lines[0].indent, 0);
        assert_eq!(lines[1].indent, 4);
    }

    #[test]
    fn unterminated_string_names_the_line() {
        let err = split_logical_lines("x = 1\ny = 'oops\n").expect_err("should fail");
        match err {
            Error::Syntax { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("unterminated"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unbalanced_open_bracket_fails_at_eof() {
        let err = split_logical_lines("x = (1 + \n").expect_err("should fail");
        match err {
            Error::Syntax { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unmatched_close_bracket_fails() {
        let err = split_logical_lines("x = 1)\n").expect_err("should fail");
        match err {
            Error::Syntax { line, message } => {
                assert_eq!(line, 1);
                assert!(message.contains("unmatched"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn escaped_quote_does_not_close_string() {
        assert_eq!(texts("s = 'don\\'t'\n"), vec!["s = 'don\\'t'"]);
    }
}
