//! Syntax tree types for the parsed source.
//!
//! The tree is deliberately shallow: top-level statements are fully
//! classified because the declaration filter and the loader act on
//! them, while function and class bodies are carried as raw text and
//! never inspected.

/// A parsed source program: an ordered top-level body of statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
}

/// One top-level statement, tagged with its 1-based source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: usize,
}

/// The recognized top-level statement shapes. Everything outside the
/// whitelist-relevant set collapses into [`StmtKind::Other`].
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `import a.b, c as d`
    Import(Vec<Alias>),
    /// `from pkg.mod import a, b as c` (or `*`)
    ImportFrom { module: String, names: Vec<Alias> },
    /// `def name(params): ...` with any decorators attached.
    FunctionDef(FunctionDef),
    /// `class Name(bases): ...` with any decorators attached.
    ClassDef(ClassDef),
    /// `target = value`, possibly chained (`a = b = value`).
    Assign { targets: Vec<Target>, value: Expr },
    /// A bare expression statement (calls, docstrings, ...).
    Expr(Expr),
    /// Anything else: compound statements, annotated or augmented
    /// assignments, `async def`, and so on.
    Other { summary: String },
}

/// One imported name with its optional binding alias.
#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    pub name: String,
    pub asname: Option<String>,
}

impl Alias {
    /// The identifier this alias binds in the namespace: the alias if
    /// present, otherwise the first segment of a dotted name (matching
    /// how `import a.b` binds `a`).
    pub fn binding(&self) -> &str {
        match &self.asname {
            Some(asname) => asname,
            None => self.name.split('.').next().unwrap_or(&self.name),
        }
    }
}

/// An assignment target. Only bare identifiers matter to the filter;
/// the other shapes are classified so the policy can reject them.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// A bare identifier: `X = ...`
    Name(String),
    /// Tuple/list unpacking: `a, b = ...` or `[a, b] = ...`
    Tuple(Vec<Target>),
    /// Attribute target: `obj.field = ...` (raw text)
    Attribute(String),
    /// Subscript target: `xs[0] = ...` (raw text)
    Subscript(String),
    /// Starred target: `*rest = ...` (raw text)
    Starred(String),
    /// Anything the target grammar does not model (raw text).
    Opaque(String),
}

/// A function declaration header plus its raw body.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub decorators: Vec<String>,
    /// Body lines, kept verbatim and never filtered.
    pub body: Vec<String>,
}

/// One function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    pub annotation: Option<String>,
    pub default: Option<Expr>,
}

/// Parameter flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Positional,
    /// `*args`
    VarArgs,
    /// `**kwargs`
    KwArgs,
}

/// A class declaration header plus its raw body.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    /// Raw text between the parentheses, if any.
    pub bases: Option<String>,
    pub decorators: Vec<String>,
    pub body: Vec<String>,
}

/// An expression. Forms outside this grammar are preserved as
/// [`Expr::Opaque`] and only fail if something tries to evaluate them.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    None,
    True,
    False,
    Int(i64),
    Float(f64),
    Str(String),
    Name(String),
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    Set(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Bool {
        op: BoolOp,
        values: Vec<Expr>,
    },
    /// Chained comparison: `left op0 e0 op1 e1 ...`
    Compare {
        left: Box<Expr>,
        ops: Vec<(CmpOp, Expr)>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    /// Raw text of an expression the grammar does not model
    /// (comprehensions, lambdas, f-strings, ...).
    Opaque(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_binding_uses_first_dotted_segment() {
        let plain = Alias {
            name: "os".to_string(),
            asname: None,
        };
        assert_eq!(plain.binding(), "os");

        let dotted = Alias {
            name: "os.path".to_string(),
            asname: None,
        };
        assert_eq!(dotted.binding(), "os");

        let aliased = Alias {
            name: "numpy".to_string(),
            asname: Some("np".to_string()),
        };
        assert_eq!(aliased.binding(), "np");
    }
}
