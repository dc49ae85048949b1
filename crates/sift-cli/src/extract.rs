//! `sift extract` - print the flat source recovered from a file.

use std::path::Path;

use sift_core::extract_code;

pub fn execute(path: &str) -> anyhow::Result<()> {
    let source = extract_code(Path::new(path))?;
    print!("{source}");
    Ok(())
}
