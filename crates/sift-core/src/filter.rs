//! Declaration filtering.
//!
//! Reduces a parsed program to its declarations: imports, function and
//! class definitions, and constant-style assignments. A constant
//! assignment has exactly one bare-name target whose identifier is
//! unchanged by uppercasing, so `X = 5` and `_1 = 2` survive while
//! `x = 5`, `a, b = 1, 2` and `obj.attr = 5` do not.

use crate::parse::{Program, Stmt, StmtKind, Target};

/// Drop every top-level statement that is not a declaration.
///
/// Statement order is preserved. The result is a fixed point: filtering
/// an already-filtered program changes nothing.
pub fn sanitize(mut program: Program) -> Program {
    program.body.retain(|stmt| {
        let keep = is_declaration(stmt);
        if !keep {
            tracing::debug!(line = stmt.line, "discarding non-declaration statement");
        }
        keep
    });
    program
}

fn is_declaration(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Import(_)
        | StmtKind::ImportFrom { .. }
        | StmtKind::FunctionDef(_)
        | StmtKind::ClassDef(_) => true,
        StmtKind::Assign { targets, value: _ } => match targets.as_slice() {
            [Target::Name(id)] => *id == id.to_uppercase(),
            _ => false,
        },
        StmtKind::Expr(_) | StmtKind::Other { .. } => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_program;

    fn sanitized(source: &str) -> Vec<StmtKind> {
        let program = sanitize(parse_program(source).expect("parse"));
        program.body.into_iter().map(|s| s.kind).collect()
    }

    #[test]
    fn declarations_survive() {
        let kept = sanitized(
            "import os\nfrom typing import Any\ndef f():\n    pass\nclass C:\n    pass\nX = 5\n",
        );
        assert_eq!(kept.len(), 5);
    }

    #[test]
    fn non_declarations_are_discarded() {
        assert!(sanitized("x = 5\n").is_empty());
        assert!(sanitized("print('hi')\n").is_empty());
        assert!(sanitized("a, b = 1, 2\n").is_empty());
        assert!(sanitized("if True:\n    pass\n").is_empty());
        assert!(sanitized("x += 1\n").is_empty());
        assert!(sanitized("X: int = 5\n").is_empty());
    }

    #[test]
    fn uppercase_rule_is_exact() {
        assert_eq!(sanitized("X = 5\n").len(), 1);
        assert_eq!(sanitized("MAX_VALUE = 10\n").len(), 1);
        assert!(sanitized("Max_Value = 10\n").is_empty());
        assert!(sanitized("value = 10\n").is_empty());
    }

    #[test]
    fn letterless_identifiers_are_constants() {
        // `_1`.upper() == `_1`, so it passes the constant test.
        assert_eq!(sanitized("_1 = 2\n").len(), 1);
        assert_eq!(sanitized("__ = 3\n").len(), 1);
    }

    #[test]
    fn chained_assignment_is_discarded() {
        assert!(sanitized("A = B = 1\n").is_empty());
    }

    #[test]
    fn uppercase_tuple_unpacking_is_discarded() {
        assert!(sanitized("A, B = 1, 2\n").is_empty());
    }

    #[test]
    fn order_is_preserved() {
        let kept = sanitized("X = 1\nx = 2\nimport os\ny = 3\ndef f():\n    pass\n");
        assert!(matches!(kept[0], StmtKind::Assign { .. }));
        assert!(matches!(kept[1], StmtKind::Import(_)));
        assert!(matches!(kept[2], StmtKind::FunctionDef(_)));
    }

    #[test]
    fn filtering_is_idempotent() {
        let once = sanitize(parse_program("X = 1\nx = 2\nimport os\n").expect("parse"));
        let twice = sanitize(once.clone());
        assert_eq!(once, twice);
    }
}
