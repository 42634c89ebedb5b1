//! FILENAME: core/rule-engine/src/error.rs

use thiserror::Error;

/// Failures of the engine's own API (registration, configuration).
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Invalid function name: {0}")]
    InvalidFunctionName(String),

    #[error("Function name is reserved: {0}")]
    ReservedName(String),

    #[error("Invalid engine configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Failures raised while interpreting an otherwise valid rule.
/// They never escape `execute`; they become `success = false` results.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("timeout")]
    Timeout,

    #[error("{0} is not defined")]
    UnknownIdentifier(String),

    #[error("{0} is not a function")]
    UnknownFunction(String),

    #[error("{type_name}.{method} is not a function")]
    NotAFunction {
        type_name: &'static str,
        method: String,
    },

    #[error("Cannot read properties of null (reading '{0}')")]
    NullAccess(String),

    #[error("{function}: {message}")]
    InvalidArgument { function: String, message: String },

    #[error("Invalid regular expression: {0}")]
    InvalidPattern(String),

    #[error("{name} failed: {message}")]
    Function { name: String, message: String },
}

impl EvalError {
    pub fn invalid_argument(function: &str, message: impl Into<String>) -> Self {
        EvalError::InvalidArgument {
            function: function.to_string(),
            message: message.into(),
        }
    }

    /// Timeouts depend on wall-clock time, so their results are never cached.
    pub fn is_deterministic(&self) -> bool {
        !matches!(self, EvalError::Timeout)
    }
}
