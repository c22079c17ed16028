//! Structured error types shared by the parser and the interpreter.
//!
//! Both carry a stable machine-readable `code` next to the human-readable
//! `message`, so hosts can branch on failures without string matching.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Grammar violation raised while turning a query into an expression.
///
/// Parse errors are fatal: the whole parse aborts and nothing is recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub code: String,
    pub message: String,
    /// Offending key, when the violation is tied to one.
    pub key: Option<String>,
}

impl ParseError {
    pub const PARSE: &'static str = "MIRQ_E_PARSE";

    /// Create a parse error with no key context.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: Self::PARSE.into(),
            message: message.into(),
            key: None,
        }
    }

    /// Create a parse error tied to a specific query key.
    pub fn for_key(message: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::new(message)
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{} at key `{}`: {}", self.code, key, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

impl std::error::Error for ParseError {}

/// Runtime failure raised while walking an expression against a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeError {
    pub code: String,
    pub message: String,
    /// Source key under evaluation when the failure surfaced.
    pub key: Option<String>,
}

impl InvokeError {
    /// Descent through an undefined value without `?`.
    pub const UNDEFINED: &'static str = "MIRQ_E_UNDEFINED";
    /// `()` applied to a method that does not exist, without `?`.
    pub const NO_METHOD: &'static str = "MIRQ_E_NO_METHOD";
    /// The authorizer refused a read or a call.
    pub const DENIED: &'static str = "MIRQ_E_DENIED";
    /// An error propagated out of a host method.
    pub const USER: &'static str = "MIRQ_E_USER";

    fn with_code(code: &str, message: impl Into<String>, key: Option<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            key,
        }
    }

    pub fn undefined_descent(key: &str) -> Self {
        Self::with_code(
            Self::UNDEFINED,
            format!("cannot execute a query on `undefined` (key: `{key}`)"),
            Some(key.into()),
        )
    }

    pub fn method_not_found(key: &str) -> Self {
        Self::with_code(
            Self::NO_METHOD,
            format!("couldn't find a method matching the key `{key}`"),
            Some(key.into()),
        )
    }

    pub fn denied(key: &str, operation: &str) -> Self {
        Self::with_code(
            Self::DENIED,
            format!("authorization denied (key: `{key}`, operation: `{operation}`)"),
            Some(key.into()),
        )
    }

    pub fn user(message: impl Into<String>) -> Self {
        Self::with_code(Self::USER, message, None)
    }

    /// Denied authorization is a security boundary: it is never routed
    /// through the error recovery hook.
    pub fn is_denied(&self) -> bool {
        self.code == Self::DENIED
    }
}

impl fmt::Display for InvokeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for InvokeError {}
