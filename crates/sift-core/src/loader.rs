//! The high-level loading front end.
//!
//! [`Loader`] ties the stages together: extract flat source from a
//! file, optionally filter it to declarations, and execute it into a
//! named [`Namespace`]. Notebook loads persist the recovered source as
//! a `.py` artifact in a scratch directory so the flattened form can be
//! inspected while the loader is alive.

use std::path::Path;

use uuid::Uuid;

use crate::error::Result;
use crate::extract::extract_code;
use crate::load::{ExecMode, Namespace, execute, sanitize_and_import_code};
use crate::parse::parse_program;
use crate::scratch::ScratchDir;

/// Loads files into namespaces.
#[derive(Debug)]
pub struct Loader {
    scratch: ScratchDir,
}

impl Loader {
    pub fn new() -> Result<Self> {
        Ok(Self {
            scratch: ScratchDir::new()?,
        })
    }

    pub fn with_scratch(scratch: ScratchDir) -> Self {
        Self { scratch }
    }

    /// The scratch directory notebook artifacts are written to.
    pub fn scratch_path(&self) -> &Path {
        self.scratch.path()
    }

    /// Extract, filter to declarations, and load. The namespace is
    /// named after the file.
    pub fn sanitize_and_import_path(&self, path: &Path) -> Result<Namespace> {
        let source = extract_code(path)?;
        let name = display_name(path);
        tracing::debug!(%name, "loading filtered source");
        sanitize_and_import_code(&source, &name)
    }

    /// Extract and load without filtering.
    ///
    /// Statements the executor cannot run are skipped with a warning
    /// rather than failing the load. When `module_name` is `None` a
    /// fresh unique name is generated. Notebook input additionally
    /// persists the flattened source as a `.py` scratch artifact.
    pub fn import_path(&self, path: &Path, module_name: Option<&str>) -> Result<Namespace> {
        let source = extract_code(path)?;
        let name = match module_name {
            Some(name) => name.to_string(),
            None => fresh_identifier(),
        };

        if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("ipynb"))
        {
            let artifact = self.scratch.create("py", &source)?;
            tracing::debug!(artifact = %artifact.display(), "persisted flattened notebook");
        }

        let program = parse_program(&source)?;
        execute(&program, &name, ExecMode::Permissive)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// A unique module name for anonymous loads.
pub fn fresh_identifier() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_identifiers_are_unique() {
        assert_ne!(fresh_identifier(), fresh_identifier());
    }

    #[test]
    fn display_name_uses_the_file_name() {
        assert_eq!(display_name(Path::new("/tmp/work/hw01.py")), "hw01.py");
    }
}
