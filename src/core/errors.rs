/*!
 * Error Types
 * Centralized guard error handling with thiserror, miette, and serde support
 */

use super::types::ContextId;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for guarded operations
pub type GuardResult<T> = Result<T, GuardError>;

/// Result type for native (unguarded) value operations
pub type NativeResult<T> = Result<T, NativeError>;

/// Errors raised by the underlying value operations
///
/// These reflect the shape of the data, not policy, and are never turned
/// into access denials.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum NativeError {
    #[error("KeyError: {0}")]
    #[diagnostic(
        code(native::key_error),
        help("The mapping has no such key. Pass a default to get() or pop().")
    )]
    Key(String),

    #[error("IndexError: {0}")]
    #[diagnostic(code(native::index_error))]
    Index(String),

    #[error("TypeError: {0}")]
    #[diagnostic(code(native::type_error))]
    Type(String),

    #[error("ValueError: {0}")]
    #[diagnostic(code(native::value_error))]
    Value(String),

    #[error("AttributeError: '{type_name}' object has no attribute '{name}'")]
    #[diagnostic(code(native::attribute_error))]
    Attribute { type_name: String, name: String },

    #[error("OverflowError: {0}")]
    #[diagnostic(code(native::overflow_error))]
    Overflow(String),

    #[error("NameError: name '{0}' is not defined")]
    #[diagnostic(
        code(native::name_error),
        help("Restricted code only sees the names of the safe namespace.")
    )]
    Name(String),
}

impl NativeError {
    pub fn type_error(msg: impl Into<String>) -> Self {
        NativeError::Type(msg.into())
    }

    pub fn value_error(msg: impl Into<String>) -> Self {
        NativeError::Value(msg.into())
    }

    pub fn attribute(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        NativeError::Attribute {
            type_name: type_name.into(),
            name: name.into(),
        }
    }
}

/// Unified guard error
///
/// Restricted code sees every variant as an ordinary `Err` it may match on.
/// The guard layer itself never swallows `Denied`.
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum GuardError {
    #[error("Access denied: {subject} ({reason})")]
    #[diagnostic(
        code(guard::access_denied),
        help("The bound security authority refused this operation.")
    )]
    Denied { subject: String, reason: String },

    #[error("No security authority bound for context {context}")]
    #[diagnostic(
        code(guard::authority_unavailable),
        help("Bind an authority for the unit of work before running restricted code.")
    )]
    Unavailable { context: ContextId },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Native(#[from] NativeError),
}

impl GuardError {
    pub fn denied(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        GuardError::Denied {
            subject: subject.into(),
            reason: reason.into(),
        }
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, GuardError::Denied { .. })
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, GuardError::Unavailable { .. })
    }

    pub fn is_native(&self) -> bool {
        matches!(self, GuardError::Native(_))
    }

    /// Native error carried by this guard error, if any
    pub fn native(&self) -> Option<&NativeError> {
        match self {
            GuardError::Native(err) => Some(err),
            _ => None,
        }
    }

    /// Status code the request-dispatch layer should surface
    pub fn http_status(&self) -> u16 {
        match self {
            GuardError::Denied { .. } => 401,
            GuardError::Unavailable { .. } => 500,
            GuardError::Native(_) => 400,
        }
    }
}

/// Serializable error representation for dispatch responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SerializableError {
    pub error_type: String,
    pub message: String,
    pub status: u16,
}

impl From<&GuardError> for SerializableError {
    fn from(err: &GuardError) -> Self {
        let error_type = match err {
            GuardError::Denied { .. } => "access_denied",
            GuardError::Unavailable { .. } => "authority_unavailable",
            GuardError::Native(_) => "native_error",
        };

        Self {
            error_type: error_type.to_string(),
            message: err.to_string(),
            status: err.http_status(),
        }
    }
}
