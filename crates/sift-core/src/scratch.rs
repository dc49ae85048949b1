//! Scratch storage for intermediate artifacts.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use uuid::Uuid;

use crate::error::Result;

/// A temporary directory for artifacts produced while loading, such as
/// the flattened source recovered from a notebook. Everything inside is
/// removed when the value drops.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        tracing::debug!(path = %dir.path().display(), "created scratch directory");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to a freshly named file with the given
    /// extension and return its path.
    pub fn create(&self, extension: &str, contents: &str) -> Result<PathBuf> {
        let file = self
            .dir
            .path()
            .join(format!("{}.{extension}", Uuid::new_v4().simple()));
        std::fs::write(&file, contents)?;
        tracing::debug!(path = %file.display(), "wrote scratch file");
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_files_hold_their_contents() {
        let scratch = ScratchDir::new().expect("scratch");
        let path = scratch.create("py", "x = 1\n").expect("create");
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("py"));
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "x = 1\n");
    }

    #[test]
    fn files_get_distinct_names() {
        let scratch = ScratchDir::new().expect("scratch");
        let a = scratch.create("py", "").expect("create");
        let b = scratch.create("py", "").expect("create");
        assert_ne!(a, b);
    }

    #[test]
    fn dropping_removes_the_directory() {
        let scratch = ScratchDir::new().expect("scratch");
        let path = scratch.create("py", "gone\n").expect("create");
        let dir = scratch.path().to_path_buf();
        drop(scratch);
        assert!(!path.exists());
        assert!(!dir.exists());
    }
}
