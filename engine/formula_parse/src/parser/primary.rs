//! Primary tokens: literals, identifiers, unary applications, arrays.

use super::Parser;
use crate::error::{ParseError, ParseErrorKind};
use crate::grammar::CONTEXT_KEYWORD;
use formula_ir::{ExprId, ExprKind, Literal, Span};

impl Parser<'_, '_> {
    /// One operand of a binary chain: a literal, an array, a unary
    /// application, or an identifier/group with its postfix chain.
    pub(super) fn parse_token(&mut self) -> Result<ExprId, ParseError> {
        self.enter()?;
        self.cursor.skip_whitespace();
        let result = self.parse_token_inner();
        self.exit();
        result
    }

    fn parse_token_inner(&mut self) -> Result<ExprId, ParseError> {
        let Some(ch) = self.cursor.peek() else {
            return Err(ParseError::at(
                ParseErrorKind::ExpectedExpression,
                self.cursor.pos(),
            ));
        };

        if ch.is_ascii_digit() || ch == '.' {
            return self.parse_number();
        }
        if ch == '\'' || ch == '"' {
            return self.parse_string();
        }
        if ch == '[' {
            return self.parse_array();
        }

        if let Some((op, op_span)) = self.scan_unary_op() {
            let operand = self.parse_token().map_err(|err| match err.kind {
                ParseErrorKind::ExpectedExpression => {
                    ParseError::new(ParseErrorKind::MissingOperand { op: op.clone() }, op_span)
                }
                _ => err,
            })?;
            let span = Span::new(op_span.start, self.span_of(operand).end);
            return Ok(self.alloc(ExprKind::Unary { op, operand }, span));
        }

        if self.grammar.is_identifier_start(ch) || ch == '(' {
            return self.parse_postfix_chain();
        }

        Err(ParseError::at(
            ParseErrorKind::UnexpectedChar { ch },
            self.cursor.pos(),
        ))
    }

    fn scan_unary_op(&mut self) -> Option<(String, Span)> {
        let start = self.cursor.pos();
        let mut len = self.grammar.max_unary_len();
        while len > 0 {
            let tok = self.cursor.peek_chars(len);
            if tok.chars().count() == len
                && self.grammar.is_unary(tok)
                && self.on_token_boundary(tok)
            {
                let op = tok.to_string();
                self.cursor.advance_str(tok);
                return Some((op, Span::new(start, self.cursor.pos())));
            }
            len -= 1;
        }
        None
    }

    /// Numeric literal: digits, optional fraction, optional signed exponent.
    fn parse_number(&mut self) -> Result<ExprId, ParseError> {
        let start = self.cursor.pos();

        while self.cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.cursor.bump();
        }
        if self.cursor.peek() == Some('.') {
            self.cursor.bump();
            while self.cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.cursor.bump();
            }
        }
        if matches!(self.cursor.peek(), Some('e' | 'E')) {
            self.cursor.bump();
            if matches!(self.cursor.peek(), Some('+' | '-')) {
                self.cursor.bump();
            }
            if !self.cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
                let literal = self.cursor.slice(start, self.cursor.pos()).to_string();
                return Err(ParseError::new(
                    ParseErrorKind::ExpectedExponent { literal },
                    Span::new(start, self.cursor.pos()),
                ));
            }
            while self.cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.cursor.bump();
            }
        }

        let end = self.cursor.pos();
        let text = self.cursor.slice(start, end);

        // A literal running straight into identifier material or a second
        // dot is an error carrying the partial literal.
        if let Some(ch) = self.cursor.peek() {
            if self.grammar.is_identifier_start(ch) {
                return Err(ParseError::new(
                    ParseErrorKind::DigitsBeforeIdentifier {
                        literal: format!("{text}{ch}"),
                    },
                    Span::new(start, end + ch.len_utf8() as u32),
                ));
            }
            if ch == '.' {
                return Err(ParseError::at(
                    ParseErrorKind::UnexpectedPeriod,
                    self.cursor.pos(),
                ));
            }
        }
        if text == "." {
            return Err(ParseError::at(ParseErrorKind::UnexpectedPeriod, start));
        }

        let value: f64 = text.parse().map_err(|_| {
            ParseError::new(
                ParseErrorKind::InvalidNumber {
                    literal: text.to_string(),
                },
                Span::new(start, end),
            )
        })?;
        Ok(self.alloc(
            ExprKind::Literal(Literal::Number(value)),
            Span::new(start, end),
        ))
    }

    /// String literal, single or double quoted, with the usual escapes.
    fn parse_string(&mut self) -> Result<ExprId, ParseError> {
        let start = self.cursor.pos();
        let Some(quote) = self.cursor.bump() else {
            return Err(ParseError::at(
                ParseErrorKind::ExpectedExpression,
                self.cursor.pos(),
            ));
        };

        let mut value = String::new();
        let mut closed = false;
        while let Some(ch) = self.cursor.bump() {
            if ch == quote {
                closed = true;
                break;
            }
            if ch == '\\' {
                // Unrecognized escapes pass the char through verbatim.
                match self.cursor.bump() {
                    Some('n') => value.push('\n'),
                    Some('r') => value.push('\r'),
                    Some('t') => value.push('\t'),
                    Some('b') => value.push('\u{0008}'),
                    Some('f') => value.push('\u{000C}'),
                    Some('v') => value.push('\u{000B}'),
                    Some(other) => value.push(other),
                    None => break,
                }
            } else {
                value.push(ch);
            }
        }

        if !closed {
            return Err(ParseError::new(
                ParseErrorKind::UnterminatedString { text: value },
                Span::new(start, self.cursor.pos()),
            ));
        }
        Ok(self.alloc(
            ExprKind::Literal(Literal::Str(value)),
            Span::new(start, self.cursor.pos()),
        ))
    }

    /// Array literal: `[a, b, c]`.
    fn parse_array(&mut self) -> Result<ExprId, ParseError> {
        let start = self.cursor.pos();
        self.cursor.bump();
        let elements = self.parse_list(']', ParseErrorKind::UnclosedBracket)?;
        Ok(self.alloc(
            ExprKind::Array(elements),
            Span::new(start, self.cursor.pos()),
        ))
    }

    /// Raw identifier text; the cursor must sit on an identifier start.
    pub(super) fn parse_identifier_name(&mut self) -> Result<&'_ str, ParseError> {
        let start = self.cursor.pos();
        match self.cursor.peek() {
            Some(ch) if self.grammar.is_identifier_start(ch) => {
                self.cursor.bump();
            }
            Some(ch) => {
                return Err(ParseError::at(
                    ParseErrorKind::UnexpectedChar { ch },
                    self.cursor.pos(),
                ))
            }
            None => {
                return Err(ParseError::at(
                    ParseErrorKind::ExpectedExpression,
                    self.cursor.pos(),
                ))
            }
        }
        while let Some(ch) = self.cursor.peek() {
            if self.grammar.is_identifier_part(ch) {
                self.cursor.bump();
            } else {
                break;
            }
        }
        Ok(self.cursor.slice(start, self.cursor.pos()))
    }

    /// Identifier position: literal keyword, `this`, or a free identifier.
    pub(super) fn parse_identifier_expr(&mut self) -> Result<ExprId, ParseError> {
        let start = self.cursor.pos();
        let name = self.parse_identifier_name()?.to_string();
        let span = Span::new(start, self.cursor.pos());

        let kind = if let Some(value) = self.grammar.literal(&name).cloned() {
            ExprKind::Literal(value)
        } else if name == CONTEXT_KEYWORD {
            ExprKind::This
        } else {
            ExprKind::Ident(name)
        };
        Ok(self.alloc(kind, span))
    }
}
