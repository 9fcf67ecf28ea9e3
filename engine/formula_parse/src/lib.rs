//! Parser for the formula expression engine.
//!
//! The operator vocabulary lives in a runtime-mutable [`Grammar`] that each
//! engine instance owns. Scanning is character-level with greedy
//! longest-match against the registered operator tables; there is no fixed
//! token stream.

mod cursor;
mod error;
mod grammar;
mod parser;

pub use error::{ParseError, ParseErrorKind};
pub use grammar::{Grammar, CONTEXT_KEYWORD, NOT_AN_OPERATOR};
pub use parser::{parse, MAX_DEPTH};
