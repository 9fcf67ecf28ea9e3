//! Parse error types.
//!
//! Errors carry a structured kind plus the byte span of the offending
//! source. `Display` renders the classic `<message> at character <offset>`
//! form that embedding hosts surface directly.

use formula_ir::Span;
use std::fmt;
use thiserror::Error;

/// Structured parse error kinds.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("unexpected `{ch}`")]
    UnexpectedChar { ch: char },

    #[error("expected expression")]
    ExpectedExpression,

    #[error("expected `;` or `,` between expressions")]
    ExpectedSeparator,

    #[error("variable names cannot start with a number ({literal})")]
    DigitsBeforeIdentifier { literal: String },

    #[error("unexpected period")]
    UnexpectedPeriod,

    #[error("expected exponent ({literal})")]
    ExpectedExponent { literal: String },

    #[error("invalid number ({literal})")]
    InvalidNumber { literal: String },

    #[error("unclosed quote after \"{text}\"")]
    UnterminatedString { text: String },

    #[error("unclosed `(`")]
    UnclosedParen,

    #[error("unclosed `[`")]
    UnclosedBracket,

    #[error("expected `:` in conditional expression")]
    ExpectedColon,

    #[error("unexpected `,`")]
    UnexpectedComma,

    #[error("expected `,` between arguments")]
    ExpectedComma,

    #[error("expected expression after `{op}`")]
    MissingOperand { op: String },

    #[error("expression nesting exceeds the depth limit")]
    TooDeep,
}

/// A parse failure with its source location.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

impl ParseError {
    /// Create a new parse error.
    #[cold]
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        ParseError { kind, span }
    }

    /// Create an error at a single offset.
    #[cold]
    pub fn at(kind: ParseErrorKind, offset: u32) -> Self {
        ParseError {
            kind,
            span: Span::point(offset),
        }
    }

    /// Byte offset where the error starts.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.span.start
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at character {}", self.kind, self.offset())
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}
