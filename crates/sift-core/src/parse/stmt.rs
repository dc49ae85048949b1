//! Top-level statement grouping and classification.
//!
//! Logical lines are grouped by indentation (a header ending with `:`
//! owns the indented lines that follow) and each top-level statement is
//! classified into [`StmtKind`]. Function and class bodies are carried
//! verbatim; compound statements and other non-declaration forms
//! collapse into [`StmtKind::Other`].

use crate::error::{Error, Result};

use super::expr::parse_expression;
use super::lines::{LogicalLine, split_logical_lines};
use super::types::{Alias, ClassDef, FunctionDef, Param, ParamKind, Program, Stmt, StmtKind, Target};

/// Words that open statements the declaration filter never keeps.
const STATEMENT_KEYWORDS: [&str; 19] = [
    "if", "elif", "else", "for", "while", "try", "except", "finally", "with", "return", "raise",
    "pass", "break", "continue", "del", "global", "nonlocal", "assert", "async",
];

/// Parse source text into a program of classified top-level statements.
pub fn parse_program(source: &str) -> Result<Program> {
    let lines = split_logical_lines(source)?;
    let mut body = Vec::new();
    let mut decorators: Vec<String> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = &lines[i];
        if line.indent > 0 {
            return Err(Error::syntax(line.line, "unexpected indent"));
        }

        let trimmed = line.text.trim();
        if let Some(decorator) = trimmed.strip_prefix('@') {
            decorators.push(decorator.trim().to_string());
            i += 1;
            continue;
        }

        // Indented lines after this one form its suite.
        let mut suite = Vec::new();
        let mut suite_line = None;
        let mut j = i + 1;
        while j < lines.len() && lines[j].indent > 0 {
            suite_line.get_or_insert(lines[j].line);
            suite.push(lines[j].raw.clone());
            j += 1;
        }

        let kind = classify(line, suite, std::mem::take(&mut decorators))?;

        // Only suite-bearing statements may be followed by an indent.
        if let Some(at) = suite_line {
            if !matches!(
                kind,
                StmtKind::FunctionDef(_) | StmtKind::ClassDef(_) | StmtKind::Other { .. }
            ) {
                return Err(Error::syntax(at, "unexpected indent"));
            }
        }

        body.push(Stmt {
            kind,
            line: line.line,
        });
        i = j;
    }

    if !decorators.is_empty() {
        tracing::debug!(
            count = decorators.len(),
            "dropping trailing decorators with no declaration"
        );
    }

    Ok(Program { body })
}

fn classify(line: &LogicalLine, suite: Vec<String>, decorators: Vec<String>) -> Result<StmtKind> {
    let text = line.text.trim();
    let lineno = line.line;

    let word = leading_word(text);
    if !decorators.is_empty() && !(word == "def" || word == "class") {
        tracing::debug!(line = lineno, "dropping decorators not attached to a declaration");
    }

    match word {
        "import" => return parse_import(&text[word.len()..], lineno),
        "from" => return parse_from(&text[word.len()..], lineno),
        "def" => return parse_def(text, suite, decorators, lineno),
        "class" => return parse_class(text, suite, decorators, lineno),
        w if STATEMENT_KEYWORDS.contains(&w) => {
            return Ok(StmtKind::Other {
                summary: format!("`{w}` statement"),
            });
        }
        _ => {}
    }

    let top = top_level_bytes(text);
    let eq = top.iter().position(|&(i, c)| c == b'=' && is_bare_eq(text, i));
    let colon = top.iter().position(|&(_, c)| c == b':');

    if let Some(eq) = eq {
        if top.iter().take(eq).any(|&(i, c)| c == b'=' && is_augmented_eq(text, i)) {
            return Ok(StmtKind::Other {
                summary: "augmented assignment".to_string(),
            });
        }
        if colon.is_some_and(|c| c < eq) {
            return Ok(StmtKind::Other {
                summary: "annotated assignment".to_string(),
            });
        }
        return parse_assign(text, &top, lineno);
    }

    if top.iter().any(|&(i, c)| c == b'=' && is_augmented_eq(text, i)) {
        return Ok(StmtKind::Other {
            summary: "augmented assignment".to_string(),
        });
    }
    if text.ends_with(':') {
        // Soft-keyword compounds (`match x:`) land here.
        return Ok(StmtKind::Other {
            summary: "compound statement".to_string(),
        });
    }
    if colon.is_some() {
        return Ok(StmtKind::Other {
            summary: "annotated assignment".to_string(),
        });
    }

    Ok(StmtKind::Expr(parse_expression(text, lineno)?))
}

fn leading_word(text: &str) -> &str {
    let end = text
        .find(|c: char| !(c == '_' || c.is_alphanumeric()))
        .unwrap_or(text.len());
    &text[..end]
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

fn is_dotted_identifier(text: &str) -> bool {
    !text.is_empty() && text.split('.').all(is_identifier)
}

// ---------------------------------------------------------------------
// Imports
// ---------------------------------------------------------------------

fn parse_import(rest: &str, lineno: usize) -> Result<StmtKind> {
    let names = parse_aliases(rest, lineno)?;
    if names.is_empty() {
        return Err(Error::syntax(lineno, "malformed import statement"));
    }
    for alias in &names {
        if !is_dotted_identifier(&alias.name) {
            return Err(Error::syntax(lineno, "malformed import statement"));
        }
    }
    Ok(StmtKind::Import(names))
}

fn parse_from(rest: &str, lineno: usize) -> Result<StmtKind> {
    let (module, names_text) = split_at_import_keyword(rest)
        .ok_or_else(|| Error::syntax(lineno, "malformed import statement"))?;
    let module = module.trim();
    // Relative modules keep their leading dots.
    let plain = module.trim_start_matches('.');
    if module.is_empty() || (!plain.is_empty() && !is_dotted_identifier(plain)) {
        return Err(Error::syntax(lineno, "malformed import statement"));
    }

    let mut names_text = names_text.trim();
    if let Some(inner) = names_text.strip_prefix('(') {
        names_text = inner
            .strip_suffix(')')
            .ok_or_else(|| Error::syntax(lineno, "malformed import statement"))?;
    }

    let names = parse_aliases(names_text, lineno)?;
    if names.is_empty() {
        return Err(Error::syntax(lineno, "malformed import statement"));
    }
    for alias in &names {
        if alias.name != "*" && !is_identifier(&alias.name) {
            return Err(Error::syntax(lineno, "malformed import statement"));
        }
    }
    Ok(StmtKind::ImportFrom {
        module: module.to_string(),
        names,
    })
}

/// Find the `import` keyword separating module from names, respecting
/// word boundaries so modules like `important.util` do not split.
fn split_at_import_keyword(rest: &str) -> Option<(&str, &str)> {
    let bytes = rest.as_bytes();
    let mut search = 0;
    while let Some(off) = rest[search..].find("import") {
        let at = search + off;
        let end = at + "import".len();
        let before = at > 0 && bytes[at - 1].is_ascii_whitespace();
        let after = end >= bytes.len()
            || bytes[end].is_ascii_whitespace()
            || bytes[end] == b'('
            || bytes[end] == b'*';
        if before && after {
            return Some((&rest[..at], &rest[end..]));
        }
        search = end;
    }
    None
}

fn parse_aliases(text: &str, lineno: usize) -> Result<Vec<Alias>> {
    let mut names = Vec::new();
    for piece in text.split(',') {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        let words: Vec<&str> = piece.split_whitespace().collect();
        let alias = match words.as_slice() {
            [name] => Alias {
                name: (*name).to_string(),
                asname: None,
            },
            [name, "as", asname] if is_identifier(asname) => Alias {
                name: (*name).to_string(),
                asname: Some((*asname).to_string()),
            },
            _ => return Err(Error::syntax(lineno, "malformed import statement")),
        };
        names.push(alias);
    }
    Ok(names)
}

// ---------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------

fn parse_def(
    text: &str,
    suite: Vec<String>,
    decorators: Vec<String>,
    lineno: usize,
) -> Result<StmtKind> {
    let rest = text["def".len()..].trim_start();
    let name = leading_word(rest);
    if !is_identifier(name) {
        return Err(Error::syntax(lineno, "expected a name in function definition"));
    }

    let rest = rest[name.len()..].trim_start();
    if !rest.starts_with('(') {
        return Err(Error::syntax(lineno, "expected '(' in function definition"));
    }
    let close = matching_close(rest, 0)
        .ok_or_else(|| Error::syntax(lineno, "expected ')' in function definition"))?;
    let params = parse_params(&rest[1..close], lineno)?;

    // Skip any return annotation to the header colon.
    let after = &rest[close + 1..];
    let colon = top_level_bytes(after)
        .into_iter()
        .find(|&(_, c)| c == b':')
        .map(|(i, _)| i)
        .ok_or_else(|| Error::syntax(lineno, "expected ':' in function definition"))?;

    let body = suite_or_inline(suite, &after[colon + 1..]);
    Ok(StmtKind::FunctionDef(FunctionDef {
        name: name.to_string(),
        params,
        decorators,
        body,
    }))
}

fn parse_class(
    text: &str,
    suite: Vec<String>,
    decorators: Vec<String>,
    lineno: usize,
) -> Result<StmtKind> {
    let rest = text["class".len()..].trim_start();
    let name = leading_word(rest);
    if !is_identifier(name) {
        return Err(Error::syntax(lineno, "expected a name in class definition"));
    }

    let mut rest = rest[name.len()..].trim_start();
    let mut bases = None;
    if rest.starts_with('(') {
        let close = matching_close(rest, 0)
            .ok_or_else(|| Error::syntax(lineno, "expected ')' in class definition"))?;
        let inner = rest[1..close].trim();
        if !inner.is_empty() {
            bases = Some(inner.to_string());
        }
        rest = rest[close + 1..].trim_start();
    }

    let after_colon = rest
        .strip_prefix(':')
        .ok_or_else(|| Error::syntax(lineno, "expected ':' in class definition"))?;

    let body = suite_or_inline(suite, after_colon);
    Ok(StmtKind::ClassDef(ClassDef {
        name: name.to_string(),
        bases,
        decorators,
        body,
    }))
}

fn suite_or_inline(suite: Vec<String>, inline: &str) -> Vec<String> {
    if suite.is_empty() {
        let inline = inline.trim();
        if inline.is_empty() {
            Vec::new()
        } else {
            vec![inline.to_string()]
        }
    } else {
        suite
    }
}

fn parse_params(text: &str, lineno: usize) -> Result<Vec<Param>> {
    let mut params = Vec::new();
    for piece in split_top_level_commas(text) {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }

        let (kind, piece) = if let Some(rest) = piece.strip_prefix("**") {
            (ParamKind::KwArgs, rest.trim_start())
        } else if let Some(rest) = piece.strip_prefix('*') {
            if rest.trim().is_empty() {
                // Bare `*`: keyword-only marker, binds nothing.
                continue;
            }
            (ParamKind::VarArgs, rest.trim_start())
        } else if piece == "/" {
            // Positional-only marker.
            continue;
        } else {
            (ParamKind::Positional, piece)
        };

        let top = top_level_bytes(piece);
        let eq = top.iter().find(|&&(_, c)| c == b'=').map(|&(i, _)| i);
        let head = &piece[..eq.unwrap_or(piece.len())];
        let default = match eq {
            Some(at) => Some(parse_expression(&piece[at + 1..], lineno)?),
            None => None,
        };

        let colon = top_level_bytes(head)
            .into_iter()
            .find(|&(_, c)| c == b':')
            .map(|(i, _)| i);
        let (name, annotation) = match colon {
            Some(at) => (
                head[..at].trim(),
                Some(head[at + 1..].trim().to_string()),
            ),
            None => (head.trim(), None),
        };

        if !is_identifier(name) {
            return Err(Error::syntax(lineno, "malformed parameter list"));
        }
        params.push(Param {
            name: name.to_string(),
            kind,
            annotation,
            default,
        });
    }
    Ok(params)
}

// ---------------------------------------------------------------------
// Assignments
// ---------------------------------------------------------------------

fn parse_assign(text: &str, top: &[(usize, u8)], lineno: usize) -> Result<StmtKind> {
    let mut targets = Vec::new();
    let mut start = 0;
    for &(at, c) in top {
        if c == b'=' && is_bare_eq(text, at) {
            targets.push(parse_target(&text[start..at], lineno)?);
            start = at + 1;
        }
    }
    let value = parse_expression(&text[start..], lineno)?;
    Ok(StmtKind::Assign { targets, value })
}

fn parse_target(text: &str, lineno: usize) -> Result<Target> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::syntax(lineno, "expected an assignment target"));
    }
    if is_identifier(text) {
        return Ok(Target::Name(text.to_string()));
    }

    let top = top_level_bytes(text);
    if top.iter().any(|&(_, c)| c == b',') {
        let mut items = Vec::new();
        for piece in split_top_level_commas(text) {
            let piece = piece.trim();
            if !piece.is_empty() {
                items.push(parse_target(piece, lineno)?);
            }
        }
        return Ok(Target::Tuple(items));
    }

    // Parenthesized or bracketed target group.
    if (text.starts_with('(') && text.ends_with(')'))
        || (text.starts_with('[') && text.ends_with(']'))
    {
        if matching_close(text, 0) == Some(text.len() - 1) {
            let inner = text[1..text.len() - 1].trim();
            if inner.is_empty() {
                return Ok(Target::Opaque(text.to_string()));
            }
            let inner_target = parse_target(inner, lineno)?;
            // `(a, b) = ...` and `[a, b] = ...` both unpack.
            return Ok(match inner_target {
                Target::Tuple(items) => Target::Tuple(items),
                single if text.starts_with('[') => Target::Tuple(vec![single]),
                single => single,
            });
        }
    }

    if text.starts_with('*') {
        return Ok(Target::Starred(text.to_string()));
    }
    if text.ends_with(']') {
        return Ok(Target::Subscript(text.to_string()));
    }
    if top.iter().any(|&(_, c)| c == b'.') && is_dotted_identifier(text) {
        return Ok(Target::Attribute(text.to_string()));
    }
    Ok(Target::Opaque(text.to_string()))
}

/// True when the `=` at byte `at` is a plain assignment operator, not
/// part of `==`, `<=`, `>=`, `!=`, `:=`, or an augmented assignment.
fn is_bare_eq(text: &str, at: usize) -> bool {
    let bytes = text.as_bytes();
    if at == 0 || bytes.get(at + 1) == Some(&b'=') {
        return false;
    }
    !matches!(
        bytes[at - 1],
        b'+' | b'-' | b'*' | b'/' | b'%' | b'@' | b'&' | b'|' | b'^' | b'<' | b'>' | b'=' | b'!'
            | b':' | b'~'
    )
}

/// True when the `=` at byte `at` ends an augmented operator (`+=`,
/// `//=`, `**=`, ...).
fn is_augmented_eq(text: &str, at: usize) -> bool {
    let bytes = text.as_bytes();
    if at == 0 || bytes.get(at + 1) == Some(&b'=') {
        return false;
    }
    matches!(
        bytes[at - 1],
        b'+' | b'-' | b'*' | b'/' | b'%' | b'@' | b'&' | b'|' | b'^' | b'<' | b'>'
    )
}

// ---------------------------------------------------------------------
// Top-level scanning helpers
// ---------------------------------------------------------------------

/// Bytes of `text` at bracket depth zero and outside string literals,
/// with their offsets. The text comes from an assembled logical line,
/// so strings are terminated and brackets balanced.
fn top_level_bytes(text: &str) -> Vec<(usize, u8)> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => i = skip_string(bytes, i),
            b'(' | b'[' | b'{' => {
                depth += 1;
                i += 1;
            }
            b')' | b']' | b'}' => {
                depth -= 1;
                i += 1;
            }
            c => {
                if depth == 0 {
                    out.push((i, c));
                }
                i += 1;
            }
        }
    }
    out
}

/// Byte offset just past the end of the string literal opening at `i`.
fn skip_string(bytes: &[u8], i: usize) -> usize {
    let quote = bytes[i];
    let triple = bytes.len() >= i + 3 && bytes[i + 1] == quote && bytes[i + 2] == quote;
    let mut j = i + if triple { 3 } else { 1 };
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            q if q == quote => {
                if triple {
                    if bytes.len() >= j + 3 && bytes[j + 1] == quote && bytes[j + 2] == quote {
                        return j + 3;
                    }
                    j += 1;
                } else {
                    return j + 1;
                }
            }
            _ => j += 1,
        }
    }
    bytes.len()
}

fn split_top_level_commas(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for (at, c) in top_level_bytes(text) {
        if c == b',' {
            pieces.push(&text[start..at]);
            start = at + 1;
        }
    }
    pieces.push(&text[start..]);
    pieces
}

/// Offset of the bracket closing the one opening at `open_at`.
fn matching_close(text: &str, open_at: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut i = open_at;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => i = skip_string(bytes, i),
            b'(' | b'[' | b'{' => {
                depth += 1;
                i += 1;
            }
            b')' | b']' | b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    None
}
