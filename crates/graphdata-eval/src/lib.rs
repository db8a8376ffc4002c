//! graphdata evaluator: runs a data script in a fresh, isolated context.
//!
//! A script is lexed, parsed, and then executed by a gas-metered
//! tree-walker against an [`Environment`] that holds nothing but the
//! builtin globals. The host file system, clock, and process are not
//! reachable from script code; the only way out is the environment the
//! caller inspects afterwards.
//!
//! ```
//! use graphdata_eval::{evaluate, to_pretty_json, DEFAULT_GAS_LIMIT};
//! use graphdata_types::SourceFile;
//!
//! let source = SourceFile::new("data.js", "var graphData = [[new Date(2004,7,1), 0.02]];");
//! let env = evaluate(&source, DEFAULT_GAS_LIMIT).unwrap();
//! let data = env.extract("graphData").unwrap();
//! assert_eq!(
//!     to_pretty_json(data).unwrap(),
//!     "[\n    [\n        \"2004-08-01T00:00:00.000Z\",\n        0.02\n    ]\n]"
//! );
//! ```

pub mod date;
pub mod env;
pub mod error;
pub mod evaluator;
pub mod json;
pub mod number;
pub mod object;
pub mod shared;
pub mod value;

pub use date::DateValue;
pub use env::{Binding, BindingKind, Environment};
pub use error::{EvalError, EvalResult};
pub use evaluator::Evaluator;
pub use json::{to_json, to_pretty_json, JsonError, MAX_JSON_UNITS};
pub use object::ObjectMap;
pub use shared::Shared;
pub use value::{Builtin, ConversionError, Value};

use graphdata_lexer::Lexer;
use graphdata_parser::Parser;
use graphdata_types::SourceFile;

/// Evaluation steps allowed per script when the caller has no opinion.
pub const DEFAULT_GAS_LIMIT: u64 = 10_000_000;

/// Deepest array/object nesting that converts to a string or to JSON.
pub const MAX_VALUE_DEPTH: u32 = 256;

/// Lex, parse, and run `source_file` in a fresh context.
///
/// Returns the context's bindings after the last statement. Syntax errors
/// are reported before anything runs; a runtime error or gas exhaustion
/// aborts the script and discards its bindings.
pub fn evaluate(
    source_file: &SourceFile,
    gas_limit: u64,
) -> Result<Environment, EvalError> {
    let lexed = Lexer::new(source_file).lex();
    if lexed.errors.has_errors() {
        return Err(EvalError::Syntax(lexed.errors));
    }

    let parsed = Parser::new(lexed.tokens, source_file).parse();
    let Some(script) = parsed.script else {
        return Err(EvalError::Syntax(parsed.errors));
    };

    let mut evaluator = Evaluator::new(source_file, gas_limit);
    evaluator.run(&script)?;
    Ok(evaluator.into_env())
}
