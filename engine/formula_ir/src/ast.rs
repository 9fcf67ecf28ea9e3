//! Expression nodes.
//!
//! Operator tokens are stored as strings rather than a closed enum: the
//! operator set is registered at runtime, so the parser cannot know the
//! full vocabulary ahead of time.

use crate::arena::{ExprArena, ExprId, ExprRange};
use crate::span::Span;

/// A literal constant appearing in source.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
}

/// Expression node kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// Literal constant: `42`, `"hi"`, `true`, `null`.
    Literal(Literal),

    /// Free identifier: `price`.
    Ident(String),

    /// The reserved context reference: `this`.
    This,

    /// Array literal: `[a, b, c]`.
    Array(ExprRange),

    /// Prefix unary application: `-x`, `!ok`.
    Unary { op: String, operand: ExprId },

    /// Binary application: `a + b`.
    Binary {
        op: String,
        left: ExprId,
        right: ExprId,
    },

    /// `&&` / `||`. Tagged separately from [`ExprKind::Binary`] so hosts
    /// can distinguish logical joins when walking the tree; evaluation
    /// treats both shapes identically.
    Logical {
        op: String,
        left: ExprId,
        right: ExprId,
    },

    /// Ternary conditional: `test ? consequent : alternate`.
    Conditional {
        test: ExprId,
        consequent: ExprId,
        alternate: ExprId,
    },

    /// Dot member access: `obj.field`.
    Field { receiver: ExprId, field: String },

    /// Bracket member access: `obj[index]`.
    Index { receiver: ExprId, index: ExprId },

    /// Function call: `f(a, b)`.
    Call { callee: ExprId, args: ExprRange },

    /// Two or more top-level expressions separated by `;` or `,`.
    Compound(ExprRange),
}

/// An expression with its source location.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    /// Create a new expression.
    #[inline]
    pub const fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

/// A parsed expression tree: the arena plus its root.
///
/// Immutable after parsing; evaluators only ever read it, so one program
/// can back any number of concurrent evaluations.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    pub arena: ExprArena,
    pub root: ExprId,
}

impl Program {
    /// The root expression node.
    #[inline]
    pub fn root_expr(&self) -> &Expr {
        self.arena.get(self.root)
    }
}
