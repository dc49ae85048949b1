//! Loading: executing a parsed program into a [`Namespace`].
//!
//! The executor walks top-level statements in order and binds the
//! names they declare. Function and class bodies are never executed;
//! parameter defaults are evaluated at definition time, as the source
//! language does.

mod eval;
mod namespace;
mod value;

pub use eval::Evaluator;
pub use namespace::Namespace;
pub use value::{Builtin, ClassValue, FunctionValue, Value};

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::filter::sanitize;
use crate::parse::{Program, Stmt, StmtKind, Target, parse_program};

/// How the executor treats statements it cannot execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Every statement must execute; anything unsupported is an error.
    /// Filtered programs satisfy this by construction.
    Strict,
    /// Unsupported statements are skipped with a warning. Used when
    /// loading unfiltered source, whose procedural statements are
    /// outside the executor's reach.
    Permissive,
}

/// Execute a program's top-level statements into a fresh namespace.
///
/// `name` is the display name the namespace is loaded under; it appears
/// in [`Error::Runtime`] when a statement fails.
pub fn execute(program: &Program, name: &str, mode: ExecMode) -> Result<Namespace> {
    let mut ns = Namespace::new(name);
    for stmt in &program.body {
        exec_stmt(stmt, &mut ns, mode).map_err(|cause| Error::runtime(name, cause))?;
    }
    tracing::debug!(name, bindings = ns.len(), "loaded namespace");
    Ok(ns)
}

/// Parse, filter to declarations, and load in one step.
///
/// This is the trusted path for untrusted source: only imports,
/// function and class definitions, and uppercase constant assignments
/// reach the executor.
pub fn sanitize_and_import_code(source: &str, name: &str) -> Result<Namespace> {
    let program = sanitize(parse_program(source)?);
    execute(&program, name, ExecMode::Strict)
}

fn exec_stmt(stmt: &Stmt, ns: &mut Namespace, mode: ExecMode) -> Result<()> {
    match &stmt.kind {
        StmtKind::Import(names) => {
            for alias in names {
                ns.set(alias.binding(), Value::Module(alias.name.clone()));
            }
            Ok(())
        }
        StmtKind::ImportFrom { module, names } => {
            for alias in names {
                if alias.name == "*" {
                    tracing::warn!(line = stmt.line, %module, "skipping wildcard import");
                    continue;
                }
                ns.set(
                    alias.binding(),
                    Value::Module(format!("{module}.{}", alias.name)),
                );
            }
            Ok(())
        }
        StmtKind::FunctionDef(def) => {
            let evaluator = Evaluator::new(ns);
            let mut params = Vec::with_capacity(def.params.len());
            for param in &def.params {
                let default = match &param.default {
                    Some(expr) => Some(evaluator.eval(expr)?),
                    None => None,
                };
                params.push((param.name.clone(), default));
            }
            let function = FunctionValue {
                name: def.name.clone(),
                params,
                decorators: def.decorators.clone(),
                body: def.body.clone(),
            };
            ns.set(def.name.clone(), Value::Function(Rc::new(function)));
            Ok(())
        }
        StmtKind::ClassDef(def) => {
            let class = ClassValue {
                name: def.name.clone(),
                bases: def.bases.clone(),
                decorators: def.decorators.clone(),
                body: def.body.clone(),
            };
            ns.set(def.name.clone(), Value::Class(Rc::new(class)));
            Ok(())
        }
        StmtKind::Assign { targets, value } => {
            let value = Evaluator::new(ns).eval(value)?;
            for target in targets {
                bind_target(target, &value, ns, mode, stmt.line)?;
            }
            Ok(())
        }
        StmtKind::Expr(expr) => {
            if mode == ExecMode::Permissive && matches!(expr, crate::parse::Expr::Opaque(_)) {
                tracing::warn!(line = stmt.line, "skipping unsupported expression statement");
                return Ok(());
            }
            Evaluator::new(ns).eval(expr)?;
            Ok(())
        }
        StmtKind::Other { summary } => match mode {
            ExecMode::Strict => Err(Error::Execution(format!(
                "unsupported statement: {summary}"
            ))),
            ExecMode::Permissive => {
                tracing::warn!(line = stmt.line, %summary, "skipping statement");
                Ok(())
            }
        },
    }
}

fn bind_target(
    target: &Target,
    value: &Value,
    ns: &mut Namespace,
    mode: ExecMode,
    line: usize,
) -> Result<()> {
    match target {
        Target::Name(name) => {
            ns.set(name.clone(), value.clone());
            Ok(())
        }
        Target::Tuple(items) => {
            let values = match value {
                Value::List(values) | Value::Tuple(values) => values.clone(),
                other => {
                    return Err(Error::Execution(format!(
                        "cannot unpack non-sequence {}",
                        other.type_name()
                    )));
                }
            };
            if values.len() != items.len() {
                return Err(Error::Execution(format!(
                    "cannot unpack {} values into {} targets",
                    values.len(),
                    items.len()
                )));
            }
            for (item, value) in items.iter().zip(&values) {
                bind_target(item, value, ns, mode, line)?;
            }
            Ok(())
        }
        Target::Attribute(text) | Target::Subscript(text) | Target::Starred(text)
        | Target::Opaque(text) => match mode {
            ExecMode::Strict => Err(Error::Execution(format!(
                "unsupported assignment target: {text}"
            ))),
            ExecMode::Permissive => {
                tracing::warn!(line, target = %text, "skipping assignment target");
                Ok(())
            }
        },
    }
}
