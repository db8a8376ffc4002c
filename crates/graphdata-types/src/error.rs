use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of errors stored before the rest are only counted.
pub const MAX_ERRORS: usize = 20;

/// The class of failure, named after the JavaScript error constructors
/// a script author would recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    SyntaxError,
    ReferenceError,
    TypeError,
    RangeError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SyntaxError => "SyntaxError",
            Self::ReferenceError => "ReferenceError",
            Self::TypeError => "TypeError",
            Self::RangeError => "RangeError",
        };
        f.write_str(name)
    }
}

/// Numeric error code (E100–E499).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Syntax errors (E100–E199) ──
    pub const UNEXPECTED_TOKEN: Self = Self(100);
    pub const UNTERMINATED_STRING: Self = Self(101);
    pub const UNTERMINATED_COMMENT: Self = Self(102);
    pub const INVALID_NUMBER: Self = Self(103);
    pub const INVALID_ESCAPE: Self = Self(104);
    pub const UNSUPPORTED_SYNTAX: Self = Self(105);
    pub const MISSING_SEMICOLON: Self = Self(106);
    pub const NESTING_LIMIT_EXCEEDED: Self = Self(107);
    pub const INVALID_ASSIGNMENT_TARGET: Self = Self(108);
    pub const MISSING_INITIALIZER: Self = Self(109);
    pub const DUPLICATE_DECLARATION: Self = Self(110);

    // ── Reference errors (E200–E299) ──
    pub const UNDEFINED_VARIABLE: Self = Self(200);

    // ── Type errors (E300–E399) ──
    pub const NOT_A_FUNCTION: Self = Self(300);
    pub const NULLISH_PROPERTY_ACCESS: Self = Self(301);
    pub const CONST_ASSIGNMENT: Self = Self(302);
    pub const NOT_ITERABLE: Self = Self(303);
    pub const NOT_A_CONSTRUCTOR: Self = Self(304);
    pub const NONDETERMINISTIC_VALUE: Self = Self(305);

    // ── Range errors (E400–E499) ──
    pub const GAS_EXHAUSTED: Self = Self(400);
    pub const INVALID_ARRAY_LENGTH: Self = Self(401);
    pub const VALUE_TOO_DEEP: Self = Self(402);

    /// Get the error kind for this code.
    pub fn kind(self) -> ErrorKind {
        match self.0 {
            200..=299 => ErrorKind::ReferenceError,
            300..=399 => ErrorKind::TypeError,
            400..=499 => ErrorKind::RangeError,
            _ => ErrorKind::SyntaxError,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A structured error located in a script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptError {
    /// Name of the script the error was found in.
    pub file: String,
    pub code: ErrorCode,
    /// Derived from `code`.
    pub kind: ErrorKind,
    pub message: String,
    #[serde(flatten)]
    pub span: Span,
    /// The offending source line, for context.
    pub source_line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ScriptError {
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            kind: code.kind(),
            message: message.into(),
            span,
            source_line: source_line.into(),
            suggestion: None,
        }
    }

    /// Attach a fix suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// The error without its file name, for callers that already name the
    /// file: `SyntaxError: Unexpected token ']' (3:5) [E100]`.
    pub fn brief(&self) -> String {
        format!("{}: {} ({}) [{}]", self.kind, self.message, self.span, self.code)
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({}:{}) [{}]",
            self.kind, self.message, self.file, self.span, self.code
        )
    }
}

impl std::error::Error for ScriptError {}

/// Errors collected by one front-end stage.
///
/// Stores at most [`MAX_ERRORS`] errors but keeps counting past the cap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptErrors {
    pub errors: Vec<ScriptError>,
    pub total_errors: usize,
}

impl ScriptErrors {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Add an error, respecting the [`MAX_ERRORS`] limit.
    pub fn push(&mut self, error: ScriptError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    /// Move every error of `other` into `self`.
    pub fn extend(&mut self, other: ScriptErrors) {
        let uncounted = other.total_errors.saturating_sub(other.errors.len());
        for error in other.errors {
            self.push(error);
        }
        self.total_errors += uncounted;
    }

    pub fn first(&self) -> Option<&ScriptError> {
        self.errors.first()
    }
}

impl fmt::Display for ScriptErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first() {
            None => write!(f, "no errors"),
            Some(first) if self.total_errors == 1 => write!(f, "{first}"),
            Some(first) => write!(f, "{first} (and {} more)", self.total_errors - 1),
        }
    }
}

impl ScriptErrors {
    /// Like the `Display` output, without file names.
    pub fn brief(&self) -> String {
        match self.first() {
            None => "no errors".to_string(),
            Some(first) if self.total_errors == 1 => first.brief(),
            Some(first) => format!("{} (and {} more)", first.brief(), self.total_errors - 1),
        }
    }
}

impl std::error::Error for ScriptErrors {}
