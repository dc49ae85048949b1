//! Source extraction from on-disk documents.

use std::path::Path;

use crate::error::{Error, Result};
use crate::notebook;

/// Extract flat source text from a file, dispatching on extension.
///
/// `.ipynb` files are normalized through the notebook pipeline; `.py`
/// files are read with trailing whitespace stripped per line. Anything
/// else is [`Error::UnsupportedFormat`].
pub fn extract_code(path: &Path) -> Result<String> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("ipynb") => {
            let text = std::fs::read_to_string(path)?;
            notebook::normalize(&text)
        }
        Some("py") => {
            let text = std::fs::read_to_string(path)?;
            Ok(flatten_script(&text))
        }
        _ => Err(Error::UnsupportedFormat(path.display().to_string())),
    }
}

/// Normalize a plain script: strip trailing whitespace (including any
/// `\r`) from each line and end with exactly one newline.
fn flatten_script(text: &str) -> String {
    let mut out = text
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).expect("create");
        file.write_all(contents.as_bytes()).expect("write");
        path
    }

    #[test]
    fn python_scripts_pass_through_trimmed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(dir.path(), "hw.py", "x = 1   \ny = 2\t\n");
        assert_eq!(extract_code(&path).expect("extract"), "x = 1\ny = 2\n");
    }

    #[test]
    fn crlf_line_endings_normalize() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(dir.path(), "hw.py", "x = 1\r\ny = 2\r\n");
        assert_eq!(extract_code(&path).expect("extract"), "x = 1\ny = 2\n");
    }

    #[test]
    fn notebooks_normalize_to_flat_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let notebook = r#"{"cells": [{"cell_type": "code", "source": ["z = 9\n"]}]}"#;
        let path = write_file(dir.path(), "hw.ipynb", notebook);

        let flat = extract_code(&path).expect("extract");
        let code: Vec<&str> = flat.lines().filter(|l| *l != "#").collect();
        assert_eq!(code, vec!["z = 9"]);
    }

    #[test]
    fn extension_dispatch_is_case_insensitive() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(dir.path(), "hw.PY", "x = 1\n");
        assert!(extract_code(&path).is_ok());
    }

    #[test]
    fn unknown_extensions_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(dir.path(), "hw.txt", "x = 1\n");
        let err = extract_code(&path).expect_err("should fail");
        match err {
            Error::UnsupportedFormat(what) => assert!(what.ends_with("hw.txt")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_files_surface_io_errors() {
        let err = extract_code(Path::new("/nonexistent/hw.py")).expect_err("should fail");
        assert!(matches!(err, Error::Io(_)));
    }
}
