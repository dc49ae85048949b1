//! Expression tokenizer and recursive descent parser.
//!
//! The grammar covers the constant-style expressions that appear as
//! assignment values and parameter defaults: literals, names,
//! tuple/list/set/dict displays, arithmetic, comparisons, boolean
//! operators, calls, attributes and subscripts. Forms outside that
//! (comprehensions, lambdas, f-strings, slices, ...) parse to
//! [`Expr::Opaque`] rather than failing, so they only error if the
//! loader actually evaluates them. Lexically invalid input is a hard
//! [`Error::Syntax`].

use crate::error::{Error, Result};

use super::types::{BinOp, BoolOp, CmpOp, Expr, UnaryOp};

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Name(String),
    Int(i64),
    Float(f64),
    Str(String),
    /// A formatted (f-prefixed) string literal; unsupported downstream.
    FStr,
    Op(&'static str),
}

/// Grammar-level mismatch: the tokens are legal but the form is not
/// modeled. The whole expression degrades to `Expr::Opaque`.
struct Unsupported;

type Parsed<T> = std::result::Result<T, Unsupported>;

/// Parse an expression from source text.
///
/// `line` is the 1-based statement line used for error reporting.
pub fn parse_expression(text: &str, line: usize) -> Result<Expr> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::syntax(line, "expected an expression"));
    }

    let toks = lex(trimmed, line)?;
    let mut parser = Parser { toks: &toks, pos: 0 };

    match parser.tuple_expr() {
        Ok(expr) if parser.at_end() => Ok(expr),
        _ => Ok(Expr::Opaque(trimmed.to_string())),
    }
}

// ---------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------

const STRING_PREFIXES: [&str; 8] = ["r", "b", "u", "f", "rb", "br", "fr", "rf"];

fn lex(text: &str, line: usize) -> Result<Vec<Tok>> {
    let bytes = text.as_bytes();
    let mut toks = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b' ' | b'\t' | b'\n' | b'\r' => i += 1,
            b'#' => {
                // Comment to end of (embedded) line.
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'\'' | b'"' => {
                let (tok, next) = lex_string(text, i, "", line)?;
                toks.push(tok);
                i = next;
            }
            b'0'..=b'9' => {
                let (tok, next) = lex_number(text, i, line)?;
                toks.push(tok);
                i = next;
            }
            b'.' if i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit() => {
                let (tok, next) = lex_number(text, i, line)?;
                toks.push(tok);
                i = next;
            }
            c if c == b'_' || c.is_ascii_alphabetic() || c >= 0x80 => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i] == b'_' || bytes[i].is_ascii_alphanumeric() || bytes[i] >= 0x80)
                {
                    i += 1;
                }
                let word = &text[start..i];
                // A string prefix glued to a quote is part of the string.
                if i < bytes.len()
                    && (bytes[i] == b'\'' || bytes[i] == b'"')
                    && STRING_PREFIXES.contains(&word.to_ascii_lowercase().as_str())
                {
                    let (tok, next) = lex_string(text, i, word, line)?;
                    toks.push(tok);
                    i = next;
                } else {
                    toks.push(Tok::Name(word.to_string()));
                }
            }
            _ => {
                let (op, len) = lex_operator(&text[i..])
                    .ok_or_else(|| Error::syntax(line, format!("unexpected character '{}'", &text[i..].chars().next().unwrap_or('?'))))?;
                toks.push(Tok::Op(op));
                i += len;
            }
        }
    }

    Ok(toks)
}

fn lex_operator(rest: &str) -> Option<(&'static str, usize)> {
    const TWO: [&str; 12] = [
        "**", "//", "==", "!=", "<=", ">=", "<<", ">>", ":=", "->", "+=", "-=",
    ];
    const ONE: [&str; 20] = [
        "+", "-", "*", "/", "%", "(", ")", "[", "]", "{", "}", ",", ":", ".", "=", "<", ">", "@",
        "|", "&",
    ];
    const EXTRA: [&str; 3] = ["^", "~", ";"];

    for op in TWO {
        if rest.starts_with(op) {
            return Some((op, 2));
        }
    }
    for op in ONE.iter().chain(EXTRA.iter()) {
        if rest.starts_with(op) {
            return Some((op, 1));
        }
    }
    None
}

fn lex_number(text: &str, start: usize, line: usize) -> Result<(Tok, usize)> {
    let bytes = text.as_bytes();
    let mut i = start;

    // Radix literals.
    if bytes[i] == b'0' && i + 1 < bytes.len() {
        let radix = match bytes[i + 1] {
            b'x' | b'X' => Some(16),
            b'o' | b'O' => Some(8),
            b'b' | b'B' => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            i += 2;
            let digits_start = i;
            while i < bytes.len() && (bytes[i] == b'_' || bytes[i].is_ascii_alphanumeric()) {
                i += 1;
            }
            let digits: String = text[digits_start..i].chars().filter(|c| *c != '_').collect();
            let value = i64::from_str_radix(&digits, radix)
                .map_err(|_| Error::syntax(line, format!("invalid numeric literal '{}'", &text[start..i])))?;
            return Ok((Tok::Int(value), i));
        }
    }

    let mut is_float = false;
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        is_float = true;
        i += 1;
        while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'_') {
            i += 1;
        }
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            is_float = true;
            i = j;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
    }

    let digits: String = text[start..i].chars().filter(|c| *c != '_').collect();
    let tok = if is_float {
        Tok::Float(
            digits
                .parse::<f64>()
                .map_err(|_| Error::syntax(line, format!("invalid numeric literal '{digits}'")))?,
        )
    } else {
        match digits.parse::<i64>() {
            Ok(value) => Tok::Int(value),
            // Magnitudes beyond i64 degrade to floats.
            Err(_) => Tok::Float(
                digits
                    .parse::<f64>()
                    .map_err(|_| Error::syntax(line, format!("invalid numeric literal '{digits}'")))?,
            ),
        }
    };
    Ok((tok, i))
}

fn lex_string(text: &str, quote_at: usize, prefix: &str, line: usize) -> Result<(Tok, usize)> {
    let bytes = text.as_bytes();
    let quote = bytes[quote_at];
    let lowered = prefix.to_ascii_lowercase();
    let raw = lowered.contains('r');
    let formatted = lowered.contains('f');

    let triple = bytes.len() >= quote_at + 3
        && bytes[quote_at + 1] == quote
        && bytes[quote_at + 2] == quote;
    let mut i = quote_at + if triple { 3 } else { 1 };

    let mut value = String::new();
    loop {
        if i >= bytes.len() {
            return Err(Error::syntax(line, "unterminated string literal"));
        }
        let c = bytes[i];
        if c == quote {
            if triple {
                if bytes.len() >= i + 3 && bytes[i + 1] == quote && bytes[i + 2] == quote {
                    i += 3;
                    break;
                }
                value.push(quote as char);
                i += 1;
                continue;
            }
            i += 1;
            break;
        }
        if c == b'\\' && !raw {
            if i + 1 >= bytes.len() {
                return Err(Error::syntax(line, "unterminated string literal"));
            }
            let (decoded, consumed) = decode_escape(&text[i..]);
            value.push_str(&decoded);
            i += consumed;
            continue;
        }
        if c == b'\\' {
            // Raw strings keep the backslash but it still shields a quote.
            value.push('\\');
            i += 1;
            if i < bytes.len() {
                i = push_char(text, i, &mut value);
            }
            continue;
        }
        i = push_char(text, i, &mut value);
    }

    if formatted {
        Ok((Tok::FStr, i))
    } else {
        Ok((Tok::Str(value), i))
    }
}

fn decode_escape(rest: &str) -> (String, usize) {
    let bytes = rest.as_bytes();
    debug_assert_eq!(bytes[0], b'\\');
    let Some(c) = bytes.get(1) else {
        return ("\\".to_string(), 1);
    };
    match c {
        b'n' => ("\n".to_string(), 2),
        b't' => ("\t".to_string(), 2),
        b'r' => ("\r".to_string(), 2),
        b'\\' => ("\\".to_string(), 2),
        b'\'' => ("'".to_string(), 2),
        b'"' => ("\"".to_string(), 2),
        b'0' => ("\0".to_string(), 2),
        b'a' => ("\u{7}".to_string(), 2),
        b'b' => ("\u{8}".to_string(), 2),
        b'f' => ("\u{c}".to_string(), 2),
        b'v' => ("\u{b}".to_string(), 2),
        b'\n' => (String::new(), 2),
        b'x' => {
            if rest.len() >= 4 {
                if let Ok(code) = u8::from_str_radix(&rest[2..4], 16) {
                    return ((code as char).to_string(), 4);
                }
            }
            ("\\x".to_string(), 2)
        }
        _ => {
            // Unknown escapes keep the backslash, as the source language does.
            let ch = rest[1..].chars().next().unwrap_or('\\');
            (format!("\\{ch}"), 1 + ch.len_utf8())
        }
    }
}

fn push_char(text: &str, i: usize, out: &mut String) -> usize {
    match text[i..].chars().next() {
        Some(ch) => {
            out.push(ch);
            i + ch.len_utf8()
        }
        None => i + 1,
    }
}

// ---------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------

/// Keywords that can never be plain name atoms here.
const RESERVED: [&str; 11] = [
    "lambda", "if", "else", "for", "in", "is", "await", "yield", "not", "and", "or",
];

struct Parser<'a> {
    toks: &'a [Tok],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.toks.len()
    }

    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn peek_op(&self, op: &str) -> bool {
        matches!(self.peek(), Some(Tok::Op(o)) if *o == op)
    }

    fn peek_name(&self, name: &str) -> bool {
        matches!(self.peek(), Some(Tok::Name(n)) if n == name)
    }

    fn eat_op(&mut self, op: &str) -> bool {
        if self.peek_op(op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_name(&mut self, name: &str) -> bool {
        if self.peek_name(name) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: &str) -> Parsed<()> {
        if self.eat_op(op) { Ok(()) } else { Err(Unsupported) }
    }

    /// Entry point: an expression with optional top-level commas.
    fn tuple_expr(&mut self) -> Parsed<Expr> {
        let first = self.or_expr()?;
        if !self.peek_op(",") {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_op(",") {
            if self.at_end() || self.peek_op(")") || self.peek_op("]") || self.peek_op("}") {
                break;
            }
            items.push(self.or_expr()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn or_expr(&mut self) -> Parsed<Expr> {
        let first = self.and_expr()?;
        if !self.peek_name("or") {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.eat_name("or") {
            values.push(self.and_expr()?);
        }
        Ok(Expr::Bool {
            op: BoolOp::Or,
            values,
        })
    }

    fn and_expr(&mut self) -> Parsed<Expr> {
        let first = self.not_expr()?;
        if !self.peek_name("and") {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.eat_name("and") {
            values.push(self.not_expr()?);
        }
        Ok(Expr::Bool {
            op: BoolOp::And,
            values,
        })
    }

    fn not_expr(&mut self) -> Parsed<Expr> {
        if self.eat_name("not") {
            let operand = self.not_expr()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Parsed<Expr> {
        let left = self.arith()?;
        let mut ops = Vec::new();
        loop {
            let op = match self.peek() {
                Some(Tok::Op("==")) => CmpOp::Eq,
                Some(Tok::Op("!=")) => CmpOp::NotEq,
                Some(Tok::Op("<")) => CmpOp::Lt,
                Some(Tok::Op("<=")) => CmpOp::LtE,
                Some(Tok::Op(">")) => CmpOp::Gt,
                Some(Tok::Op(">=")) => CmpOp::GtE,
                // Identity/membership tests are outside the grammar.
                Some(Tok::Name(n)) if n == "in" || n == "is" => return Err(Unsupported),
                _ => break,
            };
            self.pos += 1;
            ops.push((op, self.arith()?));
        }
        if ops.is_empty() {
            Ok(left)
        } else {
            Ok(Expr::Compare {
                left: Box::new(left),
                ops,
            })
        }
    }

    fn arith(&mut self) -> Parsed<Expr> {
        let mut left = self.term()?;
        loop {
            let op = if self.peek_op("+") {
                BinOp::Add
            } else if self.peek_op("-") {
                BinOp::Sub
            } else {
                break;
            };
            self.pos += 1;
            let right = self.term()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn term(&mut self) -> Parsed<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = if self.peek_op("*") {
                BinOp::Mul
            } else if self.peek_op("//") {
                BinOp::FloorDiv
            } else if self.peek_op("/") {
                BinOp::Div
            } else if self.peek_op("%") {
                BinOp::Mod
            } else {
                break;
            };
            self.pos += 1;
            let right = self.unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn unary(&mut self) -> Parsed<Expr> {
        if self.eat_op("-") {
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });
        }
        if self.eat_op("+") {
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Pos,
                operand: Box::new(operand),
            });
        }
        self.power()
    }

    fn power(&mut self) -> Parsed<Expr> {
        let base = self.postfix()?;
        if self.eat_op("**") {
            // Right associative; unary binds tighter on the right.
            let exponent = self.unary()?;
            return Ok(Expr::Binary {
                op: BinOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Parsed<Expr> {
        let mut expr = self.atom()?;
        loop {
            if self.eat_op("(") {
                let args = self.call_args()?;
                expr = Expr::Call {
                    func: Box::new(expr),
                    args,
                };
            } else if self.eat_op(".") {
                let attr = match self.peek() {
                    Some(Tok::Name(name)) => name.clone(),
                    _ => return Err(Unsupported),
                };
                self.pos += 1;
                expr = Expr::Attribute {
                    value: Box::new(expr),
                    attr,
                };
            } else if self.eat_op("[") {
                let index = self.or_expr()?;
                // Slices are not modeled.
                self.expect_op("]")?;
                expr = Expr::Subscript {
                    value: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn call_args(&mut self) -> Parsed<Vec<Expr>> {
        let mut args = Vec::new();
        if self.eat_op(")") {
            return Ok(args);
        }
        loop {
            // Keyword and star arguments are outside the grammar.
            if self.peek_op("*") || self.peek_op("**") {
                return Err(Unsupported);
            }
            if let Some(Tok::Name(_)) = self.peek() {
                if matches!(self.toks.get(self.pos + 1), Some(Tok::Op("="))) {
                    return Err(Unsupported);
                }
            }
            args.push(self.or_expr()?);
            if self.eat_op(",") {
                if self.eat_op(")") {
                    return Ok(args);
                }
                continue;
            }
            self.expect_op(")")?;
            return Ok(args);
        }
    }

    fn atom(&mut self) -> Parsed<Expr> {
        let tok = self.peek().ok_or(Unsupported)?.clone();
        match tok {
            Tok::Int(value) => {
                self.pos += 1;
                Ok(Expr::Int(value))
            }
            Tok::Float(value) => {
                self.pos += 1;
                Ok(Expr::Float(value))
            }
            Tok::Str(value) => {
                self.pos += 1;
                // Adjacent string literals concatenate.
                let mut value = value;
                while let Some(Tok::Str(next)) = self.peek() {
                    value.push_str(next);
                    self.pos += 1;
                }
                Ok(Expr::Str(value))
            }
            Tok::FStr => Err(Unsupported),
            Tok::Name(name) => {
                self.pos += 1;
                match name.as_str() {
                    "None" => Ok(Expr::None),
                    "True" => Ok(Expr::True),
                    "False" => Ok(Expr::False),
                    n if RESERVED.contains(&n) => Err(Unsupported),
                    _ => Ok(Expr::Name(name)),
                }
            }
            Tok::Op("(") => {
                self.pos += 1;
                if self.eat_op(")") {
                    return Ok(Expr::Tuple(Vec::new()));
                }
                let inner = self.tuple_expr()?;
                self.expect_op(")")?;
                Ok(inner)
            }
            Tok::Op("[") => {
                self.pos += 1;
                let items = self.display_items("]")?;
                Ok(Expr::List(items))
            }
            Tok::Op("{") => {
                self.pos += 1;
                self.brace_display()
            }
            Tok::Op(_) => Err(Unsupported),
        }
    }

    fn display_items(&mut self, close: &str) -> Parsed<Vec<Expr>> {
        let mut items = Vec::new();
        if self.eat_op(close) {
            return Ok(items);
        }
        loop {
            items.push(self.or_expr()?);
            if self.eat_op(",") {
                if self.eat_op(close) {
                    return Ok(items);
                }
                continue;
            }
            self.expect_op(close)?;
            return Ok(items);
        }
    }

    fn brace_display(&mut self) -> Parsed<Expr> {
        if self.eat_op("}") {
            return Ok(Expr::Dict(Vec::new()));
        }
        let first = self.or_expr()?;
        if self.eat_op(":") {
            // Dict display.
            let mut pairs = vec![(first, self.or_expr()?)];
            loop {
                if self.eat_op(",") {
                    if self.eat_op("}") {
                        return Ok(Expr::Dict(pairs));
                    }
                    let key = self.or_expr()?;
                    self.expect_op(":")?;
                    pairs.push((key, self.or_expr()?));
                    continue;
                }
                self.expect_op("}")?;
                return Ok(Expr::Dict(pairs));
            }
        }
        // Set display.
        let mut items = vec![first];
        loop {
            if self.eat_op(",") {
                if self.eat_op("}") {
                    return Ok(Expr::Set(items));
                }
                items.push(self.or_expr()?);
                continue;
            }
            self.expect_op("}")?;
            return Ok(Expr::Set(items));
        }
    }
}
