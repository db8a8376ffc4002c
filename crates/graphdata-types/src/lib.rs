//! Shared types for the graphdata script front end.
//!
//! This crate defines the AST node types, source spans, and structured
//! error types used by the lexer, parser, and evaluator.

mod error;
mod span;
pub mod ast;

pub use error::{ErrorCode, ErrorKind, ScriptError, ScriptErrors, MAX_ERRORS};
pub use span::{SourceFile, Span};

/// Deepest expression nesting the parser accepts.
///
/// Keeps recursive descent (and the evaluator that follows it) well inside
/// the default thread stack.
pub const MAX_NESTING_DEPTH: u32 = 128;
