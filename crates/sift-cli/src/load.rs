//! `sift load` - load a file and print the resulting bindings.

use std::path::Path;

use sift_core::{Loader, Namespace, extract_code, sanitize_and_import_code};

pub fn execute(path: &str, module_name: Option<&str>, unfiltered: bool) -> anyhow::Result<()> {
    let loader = Loader::new()?;
    let path = Path::new(path);

    let ns = match (unfiltered, module_name) {
        (true, _) => loader.import_path(path, module_name)?,
        (false, None) => loader.sanitize_and_import_path(path)?,
        (false, Some(name)) => sanitize_and_import_code(&extract_code(path)?, name)?,
    };

    print_namespace(&ns);
    Ok(())
}

fn print_namespace(ns: &Namespace) {
    println!("namespace {} ({} bindings)", ns.name(), ns.len());
    for (name, value) in ns.iter() {
        println!("  {name} = {}", value.repr());
    }
}
