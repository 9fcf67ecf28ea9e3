//! Arena allocation for the flat AST.
//!
//! All expressions for a parse live in one contiguous `Vec`; child references
//! are `ExprId` indices and sequences are `ExprRange` slices into a shared
//! list pool. The whole tree is dropped in one deallocation.

use crate::ast::Expr;
use std::fmt;

/// Index of an expression in an [`ExprArena`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExprId(u32);

impl ExprId {
    /// Create an ID from a raw index.
    #[inline]
    pub const fn new(index: u32) -> Self {
        ExprId(index)
    }

    /// Raw index for slice access.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Range into the arena's expression list pool.
///
/// `len` is as wide as `start`: a list can span the whole pool, so a parse
/// never mis-sizes a range no matter how many elements a list carries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct ExprRange {
    pub start: u32,
    pub len: u32,
}

impl ExprRange {
    /// Empty range.
    pub const EMPTY: ExprRange = ExprRange { start: 0, len: 0 };

    /// Create a new range.
    #[inline]
    pub const fn new(start: u32, len: u32) -> Self {
        ExprRange { start, len }
    }

    /// Number of elements in the range.
    #[inline]
    pub const fn len(self) -> usize {
        self.len as usize
    }

    /// Check if the range is empty.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// Contiguous storage for all expressions of one parse.
#[derive(Clone, Default, PartialEq)]
pub struct ExprArena {
    /// All expressions (indexed by `ExprId`).
    exprs: Vec<Expr>,

    /// Flattened expression lists (for Call args, Array elements, Compound).
    expr_lists: Vec<ExprId>,
}

impl ExprArena {
    /// Create a new empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with estimated capacity based on source size.
    /// Heuristic: ~1 expression per 8 bytes of formula source.
    pub fn with_capacity(source_len: usize) -> Self {
        let estimated = source_len / 8;
        ExprArena {
            exprs: Vec::with_capacity(estimated),
            expr_lists: Vec::with_capacity(estimated / 2),
        }
    }

    /// Allocate an expression, return its ID.
    #[inline]
    pub fn alloc(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(self.exprs.len() as u32);
        self.exprs.push(expr);
        id
    }

    /// Get an expression by ID.
    ///
    /// # Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    #[track_caller]
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    /// Number of allocated expressions.
    #[inline]
    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    /// Allocate an expression list, return its range.
    pub fn alloc_list(&mut self, exprs: impl IntoIterator<Item = ExprId>) -> ExprRange {
        let start = self.expr_lists.len() as u32;
        self.expr_lists.extend(exprs);
        let len = self.expr_lists.len() as u32 - start;
        ExprRange::new(start, len)
    }

    /// Get an expression list by range.
    #[inline]
    pub fn list(&self, range: ExprRange) -> &[ExprId] {
        let start = range.start as usize;
        &self.expr_lists[start..start + range.len()]
    }

    /// Check if arena is empty.
    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }
}

impl fmt::Debug for ExprArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExprArena {{ {} exprs, {} list slots }}",
            self.exprs.len(),
            self.expr_lists.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprKind, Literal};
    use crate::span::Span;

    fn number(n: f64, span: Span) -> Expr {
        Expr::new(ExprKind::Literal(Literal::Number(n)), span)
    }

    #[test]
    fn test_alloc() {
        let mut arena = ExprArena::new();

        let id1 = arena.alloc(number(1.0, Span::new(0, 1)));
        let id2 = arena.alloc(number(2.0, Span::new(2, 3)));

        assert_eq!(id1.index(), 0);
        assert_eq!(id2.index(), 1);
        assert_eq!(arena.expr_count(), 2);

        assert!(matches!(
            arena.get(id1).kind,
            ExprKind::Literal(Literal::Number(n)) if n == 1.0
        ));
    }

    #[test]
    fn test_alloc_list() {
        let mut arena = ExprArena::new();

        let id1 = arena.alloc(number(1.0, Span::new(0, 1)));
        let id2 = arena.alloc(number(2.0, Span::new(2, 3)));
        let id3 = arena.alloc(number(3.0, Span::new(4, 5)));

        let range = arena.alloc_list([id1, id2, id3]);

        assert_eq!(range.len(), 3);
        assert_eq!(arena.list(range), &[id1, id2, id3]);
    }

    #[test]
    fn test_list_longer_than_u16() {
        let mut arena = ExprArena::new();
        let id = arena.alloc(number(1.0, Span::new(0, 1)));

        let range = arena.alloc_list(std::iter::repeat(id).take(70_000));

        assert_eq!(range.len(), 70_000);
        assert_eq!(arena.list(range).len(), 70_000);
    }

    #[test]
    fn test_empty_list() {
        let mut arena = ExprArena::new();
        let range = arena.alloc_list([]);
        assert!(range.is_empty());
        assert_eq!(arena.list(range), &[]);
    }
}
