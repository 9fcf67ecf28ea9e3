//! Postfix chains: `.field`, `[index]`, `(args)`.

use super::Parser;
use crate::error::{ParseError, ParseErrorKind};
use formula_ir::{ExprId, ExprKind, ExprRange, Span};
use smallvec::SmallVec;

impl Parser<'_, '_> {
    /// An identifier or parenthesized group followed by any number of
    /// member accesses and calls, left to right.
    pub(super) fn parse_postfix_chain(&mut self) -> Result<ExprId, ParseError> {
        let start = self.cursor.pos();
        let mut node = if self.cursor.peek() == Some('(') {
            self.parse_group()?
        } else {
            self.parse_identifier_expr()?
        };

        loop {
            self.cursor.skip_whitespace();
            match self.cursor.peek() {
                Some('.') => {
                    self.cursor.bump();
                    self.cursor.skip_whitespace();
                    let field = self.parse_identifier_name()?.to_string();
                    node = self.alloc(
                        ExprKind::Field {
                            receiver: node,
                            field,
                        },
                        Span::new(start, self.cursor.pos()),
                    );
                }
                Some('[') => {
                    self.cursor.bump();
                    let index = self.parse_expression()?;
                    self.cursor.skip_whitespace();
                    if !self.cursor.eat(']') {
                        return Err(ParseError::at(
                            ParseErrorKind::UnclosedBracket,
                            self.cursor.pos(),
                        ));
                    }
                    node = self.alloc(
                        ExprKind::Index {
                            receiver: node,
                            index,
                        },
                        Span::new(start, self.cursor.pos()),
                    );
                }
                Some('(') => {
                    self.cursor.bump();
                    let args = self.parse_list(')', ParseErrorKind::UnclosedParen)?;
                    node = self.alloc(
                        ExprKind::Call { callee: node, args },
                        Span::new(start, self.cursor.pos()),
                    );
                }
                _ => break,
            }
        }
        Ok(node)
    }

    /// Parenthesized group. Returns the inner expression unchanged; the
    /// AST keeps no grouping node.
    fn parse_group(&mut self) -> Result<ExprId, ParseError> {
        self.cursor.bump();
        let node = self.parse_expression()?;
        self.cursor.skip_whitespace();
        if !self.cursor.eat(')') {
            return Err(ParseError::at(
                ParseErrorKind::UnclosedParen,
                self.cursor.pos(),
            ));
        }
        Ok(node)
    }

    /// Comma-separated expression list up to `terminator`. Shared by call
    /// arguments and array literals.
    pub(super) fn parse_list(
        &mut self,
        terminator: char,
        unclosed: ParseErrorKind,
    ) -> Result<ExprRange, ParseError> {
        let mut items: SmallVec<[ExprId; 4]> = SmallVec::new();
        let mut separators = 0usize;
        let mut closed = false;

        while !self.cursor.is_eof() {
            self.cursor.skip_whitespace();
            if self.cursor.eat(terminator) {
                closed = true;
                break;
            }
            if self.cursor.eat(',') {
                separators += 1;
                if separators != items.len() {
                    return Err(ParseError::at(
                        ParseErrorKind::UnexpectedComma,
                        self.cursor.pos() - 1,
                    ));
                }
            } else {
                if items.len() != separators {
                    return Err(ParseError::at(
                        ParseErrorKind::ExpectedComma,
                        self.cursor.pos(),
                    ));
                }
                let item = self.parse_expression()?;
                items.push(item);
            }
        }

        if !closed {
            return Err(ParseError::at(unclosed, self.cursor.pos()));
        }
        Ok(self.arena.alloc_list(items))
    }
}
