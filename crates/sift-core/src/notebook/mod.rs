//! Notebook document handling.
//!
//! A notebook is a JSON document with an ordered `cells` array; only
//! cells with `"cell_type": "code"` matter here. This module recovers
//! a single flat source text from the per-line JSON representation.

pub mod escape;
mod normalize;

pub use escape::{ESCAPE, escape, unescape};
pub use normalize::normalize;
