//! Recursive-descent parser with stack-based precedence climbing.
//!
//! Operator scanning consults the [`Grammar`] at parse time, so the same
//! parser handles any runtime-registered operator vocabulary. Binary
//! chains are parsed with an explicit operand/operator stack: operators
//! that do not bind tighter than the stack top trigger an eager reduce,
//! and whatever remains is folded at the end.

use crate::cursor::Cursor;
use crate::error::{ParseError, ParseErrorKind};
use crate::grammar::{Grammar, NOT_AN_OPERATOR};
use formula_ir::{Expr, ExprArena, ExprId, ExprKind, Program, Span};
use smallvec::SmallVec;
use tracing::trace;

mod postfix;
mod primary;

#[cfg(test)]
mod tests;

/// Maximum expression nesting depth before parsing fails.
///
/// Evaluation recursion is bounded by AST depth, so this one limit
/// protects both the parser and the evaluators from stack overflow.
pub const MAX_DEPTH: u32 = 256;

/// Parse `source` into a [`Program`] using the given grammar.
pub fn parse(grammar: &Grammar, source: &str) -> Result<Program, ParseError> {
    trace!(len = source.len(), "parsing formula source");
    Parser::new(grammar, source).parse_program()
}

/// A registered binary operator scanned from the source.
struct OpInfo {
    op: String,
    precedence: u8,
    span: Span,
}

/// Precedence-climbing stack entry: operands and operators interleave.
enum StackEntry {
    Operand(ExprId),
    Op(OpInfo),
}

pub(crate) struct Parser<'g, 'src> {
    grammar: &'g Grammar,
    cursor: Cursor<'src>,
    arena: ExprArena,
    depth: u32,
}

impl<'g, 'src> Parser<'g, 'src> {
    fn new(grammar: &'g Grammar, source: &'src str) -> Self {
        Parser {
            grammar,
            cursor: Cursor::new(source),
            arena: ExprArena::with_capacity(source.len()),
            depth: 0,
        }
    }

    /// Top level: one expression, or several separated by `;` / `,`.
    ///
    /// Separators are required between adjacent expressions. Leaving them
    /// out is an error rather than an inferred boundary, so source that
    /// stops parsing as one expression (say, after an operator was
    /// unregistered) fails loudly instead of silently becoming a compound.
    fn parse_program(mut self) -> Result<Program, ParseError> {
        let mut roots: SmallVec<[ExprId; 4]> = SmallVec::new();

        self.cursor.skip_whitespace();
        if self.cursor.is_eof() {
            return Err(ParseError::at(
                ParseErrorKind::ExpectedExpression,
                self.cursor.pos(),
            ));
        }

        loop {
            let id = self.parse_expression()?;
            roots.push(id);

            self.cursor.skip_whitespace();
            match self.cursor.peek() {
                None => break,
                Some(';' | ',') => {
                    while matches!(self.cursor.peek(), Some(';' | ',')) {
                        self.cursor.bump();
                        self.cursor.skip_whitespace();
                    }
                    if self.cursor.is_eof() {
                        break;
                    }
                }
                Some(_) => {
                    return Err(ParseError::at(
                        ParseErrorKind::ExpectedSeparator,
                        self.cursor.pos(),
                    ));
                }
            }
        }

        let root = if roots.len() == 1 {
            roots[0]
        } else {
            let span = self
                .span_of(roots[0])
                .merge(self.span_of(roots[roots.len() - 1]));
            let range = self.arena.alloc_list(roots.iter().copied());
            self.alloc(ExprKind::Compound(range), span)
        };

        Ok(Program {
            arena: self.arena,
            root,
        })
    }

    /// A full expression: binary chain plus optional `?:` conditional.
    pub(super) fn parse_expression(&mut self) -> Result<ExprId, ParseError> {
        self.enter()?;
        let test = self.parse_binary_expression()?;
        self.cursor.skip_whitespace();

        let node = if self.cursor.eat('?') {
            let consequent = self.parse_expression()?;
            self.cursor.skip_whitespace();
            if !self.cursor.eat(':') {
                return Err(ParseError::at(
                    ParseErrorKind::ExpectedColon,
                    self.cursor.pos(),
                ));
            }
            let alternate = self.parse_expression()?;
            let span = self.span_of(test).merge(self.span_of(alternate));
            self.alloc(
                ExprKind::Conditional {
                    test,
                    consequent,
                    alternate,
                },
                span,
            )
        } else {
            test
        };

        self.exit();
        Ok(node)
    }

    fn parse_binary_expression(&mut self) -> Result<ExprId, ParseError> {
        let left = self.parse_token()?;
        let Some(first_op) = self.scan_binary_op() else {
            return Ok(left);
        };
        let right = self.operand_after(&first_op)?;

        let mut stack: Vec<StackEntry> = vec![
            StackEntry::Operand(left),
            StackEntry::Op(first_op),
            StackEntry::Operand(right),
        ];

        while let Some(op) = self.scan_binary_op() {
            // Reduce while the incoming operator does not bind tighter
            // than the operator below the top operand (left associativity
            // for equal precedence).
            while stack.len() > 2 {
                let tighter = match stack.get(stack.len() - 2) {
                    Some(StackEntry::Op(top)) => op.precedence > top.precedence,
                    _ => true,
                };
                if tighter {
                    break;
                }
                let right = match stack.pop() {
                    Some(StackEntry::Operand(id)) => id,
                    _ => break,
                };
                let top_op = match stack.pop() {
                    Some(StackEntry::Op(info)) => info,
                    _ => break,
                };
                let left = match stack.pop() {
                    Some(StackEntry::Operand(id)) => id,
                    _ => break,
                };
                let reduced = self.alloc_binary(&top_op, left, right);
                stack.push(StackEntry::Operand(reduced));
            }

            let operand = self.operand_after(&op)?;
            stack.push(StackEntry::Op(op));
            stack.push(StackEntry::Operand(operand));
        }

        // Fold the remainder right to left.
        let mut node = match stack.pop() {
            Some(StackEntry::Operand(id)) => id,
            _ => {
                return Err(ParseError::at(
                    ParseErrorKind::ExpectedExpression,
                    self.cursor.pos(),
                ))
            }
        };
        while !stack.is_empty() {
            let op = match stack.pop() {
                Some(StackEntry::Op(info)) => info,
                _ => break,
            };
            let left = match stack.pop() {
                Some(StackEntry::Operand(id)) => id,
                _ => break,
            };
            node = self.alloc_binary(&op, left, node);
        }
        Ok(node)
    }

    /// Greedy longest-match scan for a registered binary operator.
    ///
    /// Consumes the operator when one matches; leaves the cursor alone
    /// otherwise, which is how a binary chain ends.
    fn scan_binary_op(&mut self) -> Option<OpInfo> {
        self.cursor.skip_whitespace();
        let start = self.cursor.pos();
        let mut len = self.grammar.max_binary_len();
        while len > 0 {
            let tok = self.cursor.peek_chars(len);
            if tok.chars().count() == len {
                let precedence = self.grammar.binary_precedence(tok);
                if precedence != NOT_AN_OPERATOR && self.on_token_boundary(tok) {
                    let op = tok.to_string();
                    self.cursor.advance_str(tok);
                    trace!(op = %op, precedence, "binary operator");
                    return Some(OpInfo {
                        op,
                        precedence,
                        span: Span::new(start, self.cursor.pos()),
                    });
                }
            }
            len -= 1;
        }
        None
    }

    /// Word-like operators must end at an identifier boundary, so `in`
    /// never matches inside `index`.
    pub(super) fn on_token_boundary(&self, tok: &str) -> bool {
        let word_like = tok
            .chars()
            .next()
            .is_some_and(|c| self.grammar.is_identifier_start(c));
        if !word_like {
            return true;
        }
        match self.cursor.peek_at(tok.len()) {
            Some(next) => !self.grammar.is_identifier_part(next),
            None => true,
        }
    }

    fn operand_after(&mut self, op: &OpInfo) -> Result<ExprId, ParseError> {
        self.parse_token().map_err(|err| match err.kind {
            ParseErrorKind::ExpectedExpression => ParseError::new(
                ParseErrorKind::MissingOperand { op: op.op.clone() },
                op.span,
            ),
            _ => err,
        })
    }

    fn alloc_binary(&mut self, op: &OpInfo, left: ExprId, right: ExprId) -> ExprId {
        let span = self.span_of(left).merge(self.span_of(right));
        let kind = if op.op == "&&" || op.op == "||" {
            ExprKind::Logical {
                op: op.op.clone(),
                left,
                right,
            }
        } else {
            ExprKind::Binary {
                op: op.op.clone(),
                left,
                right,
            }
        };
        self.alloc(kind, span)
    }

    pub(super) fn alloc(&mut self, kind: ExprKind, span: Span) -> ExprId {
        self.arena.alloc(Expr::new(kind, span))
    }

    pub(super) fn span_of(&self, id: ExprId) -> Span {
        self.arena.get(id).span
    }

    pub(super) fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::at(ParseErrorKind::TooDeep, self.cursor.pos()));
        }
        Ok(())
    }

    pub(super) fn exit(&mut self) {
        self.depth -= 1;
    }
}
