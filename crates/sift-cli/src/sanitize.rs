//! `sift sanitize` - list the declarations that survive filtering.

use std::path::Path;

use sift_core::{StmtKind, extract_code, parse_program, sanitize};

pub fn execute(path: &str) -> anyhow::Result<()> {
    let source = extract_code(Path::new(path))?;
    let program = sanitize(parse_program(&source)?);

    for stmt in &program.body {
        println!("{:>5}  {}", stmt.line, describe(&stmt.kind));
    }
    Ok(())
}

fn describe(kind: &StmtKind) -> String {
    match kind {
        StmtKind::Import(names) => {
            let bindings: Vec<&str> = names.iter().map(|a| a.binding()).collect();
            format!("import {}", bindings.join(", "))
        }
        StmtKind::ImportFrom { module, names } => {
            let bindings: Vec<&str> = names.iter().map(|a| a.binding()).collect();
            format!("from {module} import {}", bindings.join(", "))
        }
        StmtKind::FunctionDef(def) => format!("def {}", def.name),
        StmtKind::ClassDef(def) => format!("class {}", def.name),
        StmtKind::Assign { targets, .. } => match targets.as_slice() {
            [sift_core::parse::Target::Name(name)] => format!("constant {name}"),
            _ => "assignment".to_string(),
        },
        StmtKind::Expr(_) => "expression".to_string(),
        StmtKind::Other { summary } => summary.clone(),
    }
}
