//! Evaluation error types.

use graphdata_types::{ErrorCode, ErrorKind, ScriptError, ScriptErrors};
use thiserror::Error;

/// Why a script could not be evaluated.
#[derive(Debug, Clone, Error)]
pub enum EvalError {
    /// The script failed to lex or parse; nothing was executed.
    #[error("{0}")]
    Syntax(ScriptErrors),
    /// A statement threw.
    #[error("{0}")]
    Runtime(Box<ScriptError>),
    /// The script ran longer than its gas limit allows.
    #[error("RangeError: evaluation exceeded the gas limit of {limit} steps [E400]")]
    GasExhausted { limit: u64 },
}

impl EvalError {
    /// The error code of the (first) underlying error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Syntax(errors) => errors
                .first()
                .map_or(ErrorCode::UNEXPECTED_TOKEN, |e| e.code),
            Self::Runtime(error) => error.code,
            Self::GasExhausted { .. } => ErrorCode::GAS_EXHAUSTED,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.code().kind()
    }

    /// The message without the script's file name.
    pub fn brief(&self) -> String {
        match self {
            Self::Syntax(errors) => errors.brief(),
            Self::Runtime(error) => error.brief(),
            Self::GasExhausted { .. } => self.to_string(),
        }
    }
}

impl From<ScriptError> for EvalError {
    fn from(error: ScriptError) -> Self {
        Self::Runtime(Box::new(error))
    }
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;
