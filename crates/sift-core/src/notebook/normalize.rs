//! Notebook normalization.
//!
//! Turns a cell-structured notebook document back into a single flat
//! source text: the concatenation of every code cell's lines, in cell
//! order, with structural JSON lines replaced by harmless `#` filler
//! so downstream line numbers stay stable.

use serde::Deserialize;
use serde_json::Value;

use super::escape::{escape, unescape};
use crate::error::Result;

/// No-op comment emitted for every printed line that is not a marked
/// code line. Dropping those lines instead would disturb the line
/// alignment that downstream consumers rely on.
const FILLER: &str = "#\n";

/// The synthetic one-field document assembled in the final step.
#[derive(Deserialize)]
struct FlatDocument {
    source: Vec<String>,
}

/// Normalize a notebook document to flat source text.
///
/// The input is the raw JSON text of the notebook. The output is the
/// concatenation of every code cell's source lines (each terminated
/// with `\n`), in cell order and line order, with `#` filler lines
/// interleaved for structural content and one trailing `#` line
/// appended.
///
/// # Errors
///
/// Returns [`Error::MalformedDocument`](crate::Error::MalformedDocument)
/// if the document is not valid JSON.
pub fn normalize(text: &str) -> Result<String> {
    let mut doc: Value = serde_json::from_str(text)?;

    let mut code_cells = 0usize;
    mark_code_cells(&mut doc, &mut code_cells);
    tracing::debug!(code_cells, "escaped notebook code cells");

    let printed = serde_json::to_string_pretty(&doc)?;

    let mut lines: Vec<String> = printed
        .lines()
        .map(|line| match unescape(line) {
            Some(code) => format!("{code}\n"),
            None => FILLER.to_string(),
        })
        .collect();
    lines.push(FILLER.to_string());

    // Reassemble a synthetic single-field document from the emitted
    // lines, parse it back, and concatenate the array in order.
    let synthetic = serde_json::to_string(&serde_json::json!({ "source": lines }))?;
    let flat: FlatDocument = serde_json::from_str(&synthetic)?;

    Ok(flat.source.concat())
}

/// Rewrite every code cell's source lines through [`escape`].
///
/// Explicit walk over the parsed tree: any object carrying
/// `"cell_type": "code"` and a `source` array of strings has its lines
/// marked, wherever it sits in the document. All other fields are left
/// structurally untouched.
fn mark_code_cells(value: &mut Value, code_cells: &mut usize) {
    match value {
        Value::Object(map) => {
            let is_code = map.get("cell_type").and_then(Value::as_str) == Some("code");
            if is_code {
                if let Some(Value::Array(source)) = map.get_mut("source") {
                    for line in source.iter_mut() {
                        if let Value::String(text) = line {
                            *text = escape(text);
                        }
                    }
                    *code_cells += 1;
                }
            }
            for (_, child) in map.iter_mut() {
                mark_code_cells(child, code_cells);
            }
        }
        Value::Array(items) => {
            for child in items.iter_mut() {
                mark_code_cells(child, code_cells);
            }
        }
        _ => {}
    }
}
