//! Core engine for extracting and loading declaration code.
//!
//! This crate provides:
//! - Source extraction from plain scripts and notebook documents
//! - Notebook normalization back to flat source text
//! - Top-level statement parsing and classification
//! - Declaration filtering (imports, defs, classes, constants)
//! - Loading of filtered source into a named namespace

pub mod error;
pub mod extract;
pub mod filter;
pub mod load;
pub mod loader;
pub mod notebook;
pub mod parse;
pub mod scratch;

pub use error::{Error, Result};
pub use extract::extract_code;
pub use filter::sanitize;
pub use load::{
    Builtin, ClassValue, Evaluator, ExecMode, FunctionValue, Namespace, Value, execute,
    sanitize_and_import_code,
};
pub use loader::{Loader, fresh_identifier};
pub use parse::{Program, Stmt, StmtKind, parse_program};
pub use scratch::ScratchDir;
