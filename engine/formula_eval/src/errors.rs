//! Evaluation error types.
//!
//! Factory functions are the public construction API; they populate both
//! the structured `kind` and the rendered `message`.

use std::fmt;
use thiserror::Error;

/// Result of strict evaluation.
pub type EvalResult = Result<Value, EvalError>;

use crate::value::Value;

/// Typed error category for structured matching.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EvalErrorKind {
    #[error("unknown binary operator `{op}`")]
    UndefinedBinaryOp { op: String },

    #[error("unknown unary operator `{op}`")]
    UndefinedUnaryOp { op: String },

    #[error("unknown function `{name}`")]
    UndefinedFunction { name: String },

    #[error("operator `{op}` cannot be applied to {left} and {right}")]
    BinaryTypeMismatch {
        op: String,
        left: &'static str,
        right: &'static str,
    },

    #[error("operator `{op}` cannot be applied to {operand}")]
    UnaryTypeMismatch {
        op: String,
        operand: &'static str,
    },

    #[error("no field `{field}` on {type_name}")]
    UndefinedField {
        field: String,
        type_name: &'static str,
    },

    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    #[error("index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("invalid array index {index}")]
    InvalidIndex { index: String },

    #[error("{type_name} cannot be indexed")]
    NotIndexable { type_name: &'static str },

    #[error("{type_name} is not callable")]
    NotCallable { type_name: &'static str },

    #[error("call target must be a function name")]
    InvalidCallTarget,

    #[error("{message}")]
    Custom { message: String },
}

/// An evaluation failure.
#[derive(Clone, Debug, PartialEq)]
pub struct EvalError {
    /// Structured category, for programmatic matching.
    pub kind: EvalErrorKind,
    /// Rendered message; equals `kind.to_string()` for factory errors.
    pub message: String,
}

impl EvalError {
    /// Create an uncategorized error from a message.
    #[cold]
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        EvalError {
            kind: EvalErrorKind::Custom {
                message: message.clone(),
            },
            message,
        }
    }

    #[cold]
    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        EvalError { kind, message }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EvalError {}

// ===== Factory functions =====

#[cold]
pub fn undefined_binary_op(op: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedBinaryOp { op: op.to_string() })
}

#[cold]
pub fn undefined_unary_op(op: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedUnaryOp { op: op.to_string() })
}

#[cold]
pub fn undefined_function(name: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedFunction {
        name: name.to_string(),
    })
}

#[cold]
pub fn binary_type_mismatch(op: &str, left: &Value, right: &Value) -> EvalError {
    EvalError::from_kind(EvalErrorKind::BinaryTypeMismatch {
        op: op.to_string(),
        left: left.type_name(),
        right: right.type_name(),
    })
}

#[cold]
pub fn unary_type_mismatch(op: &str, operand: &Value) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnaryTypeMismatch {
        op: op.to_string(),
        operand: operand.type_name(),
    })
}

#[cold]
pub fn undefined_field(field: &str, receiver: &Value) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UndefinedField {
        field: field.to_string(),
        type_name: receiver.type_name(),
    })
}

#[cold]
pub fn key_not_found(key: &str) -> EvalError {
    EvalError::from_kind(EvalErrorKind::KeyNotFound {
        key: key.to_string(),
    })
}

#[cold]
pub fn index_out_of_bounds(index: i64, len: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::IndexOutOfBounds { index, len })
}

#[cold]
pub fn invalid_index(index: f64) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidIndex {
        index: index.to_string(),
    })
}

#[cold]
pub fn not_indexable(receiver: &Value) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotIndexable {
        type_name: receiver.type_name(),
    })
}

#[cold]
pub fn not_callable(value: &Value) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotCallable {
        type_name: value.type_name(),
    })
}

#[cold]
pub fn invalid_call_target() -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidCallTarget)
}
