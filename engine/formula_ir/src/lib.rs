//! Core IR for the formula expression engine.
//!
//! Defines the flat, arena-backed AST shared by the parser and both
//! evaluators, plus compact byte-offset source spans.

mod arena;
mod ast;
mod span;

pub use arena::{ExprArena, ExprId, ExprRange};
pub use ast::{Expr, ExprKind, Literal, Program};
pub use span::Span;
