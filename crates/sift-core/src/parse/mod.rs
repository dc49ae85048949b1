//! Source parsing.
//!
//! The pipeline here goes text -> logical lines -> classified top-level
//! statements. Expression parsing is best-effort: recognized constant
//! forms become structured [`Expr`] nodes, anything else is preserved
//! as [`Expr::Opaque`] so that only evaluation, not classification,
//! depends on the full expression grammar.

mod expr;
mod lines;
mod stmt;
mod types;

pub use expr::parse_expression;
pub use lines::{LogicalLine, split_logical_lines};
pub use stmt::parse_program;
pub use types::{
    Alias, BinOp, BoolOp, ClassDef, CmpOp, Expr, FunctionDef, Param, ParamKind, Program, Stmt,
    StmtKind, Target, UnaryOp,
};
