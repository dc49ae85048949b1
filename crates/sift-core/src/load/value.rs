//! Runtime values produced by loading declarations.

use std::fmt;
use std::rc::Rc;

/// A value bound in a loaded namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Insertion-ordered key/value pairs.
    Dict(Vec<(Value, Value)>),
    Function(Rc<FunctionValue>),
    Class(Rc<ClassValue>),
    /// An imported module, recorded by dotted name only.
    Module(String),
    Builtin(Builtin),
}

/// A loaded function declaration. The body is carried verbatim and
/// never evaluated; defaults are evaluated at definition time.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionValue {
    pub name: String,
    pub params: Vec<(String, Option<Value>)>,
    pub decorators: Vec<String>,
    pub body: Vec<String>,
}

/// A loaded class declaration, header only.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassValue {
    pub name: String,
    pub bases: Option<String>,
    pub decorators: Vec<String>,
    pub body: Vec<String>,
}

/// The built-in functions the evaluator can call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Len,
    Abs,
    Str,
    Int,
    Float,
    Bool,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Len => "len",
            Builtin::Abs => "abs",
            Builtin::Str => "str",
            Builtin::Int => "int",
            Builtin::Float => "float",
            Builtin::Bool => "bool",
        }
    }

    /// Look a builtin up by its source-level name.
    pub fn lookup(name: &str) -> Option<Builtin> {
        match name {
            "print" => Some(Builtin::Print),
            "len" => Some(Builtin::Len),
            "abs" => Some(Builtin::Abs),
            "str" => Some(Builtin::Str),
            "int" => Some(Builtin::Int),
            "float" => Some(Builtin::Float),
            "bool" => Some(Builtin::Bool),
            _ => None,
        }
    }
}

impl Value {
    /// The type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Function(_) => "function",
            Value::Class(_) => "type",
            Value::Module(_) => "module",
            Value::Builtin(_) => "builtin_function_or_method",
        }
    }

    /// Truthiness: empty collections, zero numbers and `None` are false.
    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) | Value::Tuple(items) => !items.is_empty(),
            Value::Dict(pairs) => !pairs.is_empty(),
            _ => true,
        }
    }

    /// The quoting, debug-style rendering.
    pub fn repr(&self) -> String {
        match self {
            Value::None => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Str(s) => quote(s),
            Value::List(items) => {
                let inner: Vec<String> = items.iter().map(Value::repr).collect();
                format!("[{}]", inner.join(", "))
            }
            Value::Tuple(items) => {
                let inner: Vec<String> = items.iter().map(Value::repr).collect();
                if inner.len() == 1 {
                    format!("({},)", inner[0])
                } else {
                    format!("({})", inner.join(", "))
                }
            }
            Value::Dict(pairs) => {
                let inner: Vec<String> = pairs
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.repr(), v.repr()))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
            Value::Function(f) => format!("<function {}>", f.name),
            Value::Class(c) => format!("<class '{}'>", c.name),
            Value::Module(m) => format!("<module '{m}'>"),
            Value::Builtin(b) => format!("<built-in function {}>", b.name()),
        }
    }
}

/// Display renders the plain string form: strings unquoted, everything
/// else as its repr.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            other => f.write_str(&other.repr()),
        }
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if f == f.trunc() && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}
