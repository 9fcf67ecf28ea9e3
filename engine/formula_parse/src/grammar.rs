//! The runtime operator grammar.
//!
//! A [`Grammar`] is the mutable registry that drives scanning and parsing:
//! binary operators with their precedence, prefix unary operators, and
//! literal keywords. Each parser/engine owns its own instance, so two hosts
//! with different operator vocabularies never interfere.

use formula_ir::Literal;
use rustc_hash::{FxHashMap, FxHashSet};
use std::num::NonZeroU8;

/// The reserved context keyword, always recognized by the parser.
pub const CONTEXT_KEYWORD: &str = "this";

/// Precedence returned for tokens that are not registered operators.
pub const NOT_AN_OPERATOR: u8 = 0;

/// Operator and literal registry for one parser instance.
///
/// Precedence is a `NonZeroU8` at the registration boundary: 0 is the
/// internal "not an operator" sentinel returned by [`Grammar::binary_precedence`],
/// so it can never be registered.
#[derive(Clone, Debug)]
pub struct Grammar {
    binary: FxHashMap<String, u8>,
    unary: FxHashSet<String>,
    literals: FxHashMap<String, Literal>,

    /// Longest registered binary operator, in chars. Grows monotonically on
    /// insert; rescanned only when a longest key is removed.
    max_binary_len: usize,
    max_unary_len: usize,
}

impl Default for Grammar {
    fn default() -> Self {
        let mut binary = FxHashMap::default();
        for (op, precedence) in [
            ("->", 1),
            ("||", 2),
            ("&&", 3),
            ("|", 4),
            ("^", 5),
            ("&", 6),
            ("==", 7),
            ("!=", 7),
            ("===", 7),
            ("!==", 7),
            ("<", 8),
            (">", 8),
            ("<=", 8),
            (">=", 8),
            ("<<", 9),
            (">>", 9),
            (">>>", 9),
            ("+", 10),
            ("-", 10),
            ("*", 11),
            ("/", 11),
            ("%", 11),
        ] {
            binary.insert(op.to_string(), precedence);
        }

        let unary: FxHashSet<String> =
            ["-", "!", "~", "+"].iter().map(|s| (*s).to_string()).collect();

        let mut literals = FxHashMap::default();
        literals.insert("true".to_string(), Literal::Bool(true));
        literals.insert("false".to_string(), Literal::Bool(false));
        literals.insert("null".to_string(), Literal::Null);

        let max_binary_len = longest_key(binary.keys());
        let max_unary_len = longest_key(unary.iter());

        Grammar {
            binary,
            unary,
            literals,
            max_binary_len,
            max_unary_len,
        }
    }
}

impl Grammar {
    /// Grammar with the default operator and literal set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grammar with no operators or literals at all.
    pub fn empty() -> Self {
        Grammar {
            binary: FxHashMap::default(),
            unary: FxHashSet::default(),
            literals: FxHashMap::default(),
            max_binary_len: 0,
            max_unary_len: 0,
        }
    }

    // ===== Lookup =====

    /// Precedence of a binary operator token, or [`NOT_AN_OPERATOR`].
    #[inline]
    pub fn binary_precedence(&self, op: &str) -> u8 {
        self.binary.get(op).copied().unwrap_or(NOT_AN_OPERATOR)
    }

    /// Check whether a token is a registered prefix unary operator.
    #[inline]
    pub fn is_unary(&self, op: &str) -> bool {
        self.unary.contains(op)
    }

    /// Literal value for a keyword, if registered.
    #[inline]
    pub fn literal(&self, keyword: &str) -> Option<&Literal> {
        self.literals.get(keyword)
    }

    /// Longest binary operator length in chars.
    #[inline]
    pub fn max_binary_len(&self) -> usize {
        self.max_binary_len
    }

    /// Longest unary operator length in chars.
    #[inline]
    pub fn max_unary_len(&self) -> usize {
        self.max_unary_len
    }

    // ===== Scanner character classes =====

    /// Check whether `ch` can start an identifier.
    ///
    /// Chars at or above U+0080 count as identifier material unless their
    /// single-char token is a registered binary operator, which lets hosts
    /// register symbolic operators like `×` without breaking identifiers.
    pub fn is_identifier_start(&self, ch: char) -> bool {
        ch == '$'
            || ch == '_'
            || ch.is_ascii_alphabetic()
            || (ch as u32 >= 0x80 && !self.is_binary_char(ch))
    }

    /// Check whether `ch` can continue an identifier.
    pub fn is_identifier_part(&self, ch: char) -> bool {
        ch.is_ascii_digit() || self.is_identifier_start(ch)
    }

    fn is_binary_char(&self, ch: char) -> bool {
        let mut buf = [0u8; 4];
        self.binary.contains_key(ch.encode_utf8(&mut buf) as &str)
    }

    // ===== Registration =====

    /// Register (or re-register) a binary operator.
    pub fn register_binary(&mut self, op: impl Into<String>, precedence: NonZeroU8) {
        let op = op.into();
        self.max_binary_len = self.max_binary_len.max(op.chars().count());
        self.binary.insert(op, precedence.get());
    }

    /// Register a prefix unary operator.
    pub fn register_unary(&mut self, op: impl Into<String>) {
        let op = op.into();
        self.max_unary_len = self.max_unary_len.max(op.chars().count());
        self.unary.insert(op);
    }

    /// Register a literal keyword.
    pub fn register_literal(&mut self, keyword: impl Into<String>, value: Literal) {
        self.literals.insert(keyword.into(), value);
    }

    /// Remove a binary operator. Returns whether it was registered.
    pub fn remove_binary(&mut self, op: &str) -> bool {
        let removed = self.binary.remove(op).is_some();
        if removed && op.chars().count() == self.max_binary_len {
            self.max_binary_len = longest_key(self.binary.keys());
        }
        removed
    }

    /// Remove a unary operator. Returns whether it was registered.
    pub fn remove_unary(&mut self, op: &str) -> bool {
        let removed = self.unary.remove(op);
        if removed && op.chars().count() == self.max_unary_len {
            self.max_unary_len = longest_key(self.unary.iter());
        }
        removed
    }

    /// Remove a literal keyword. Returns whether it was registered.
    pub fn remove_literal(&mut self, keyword: &str) -> bool {
        self.literals.remove(keyword).is_some()
    }

    // ===== Builder style =====

    /// Builder form of [`Grammar::register_binary`].
    #[must_use]
    pub fn with_binary(mut self, op: impl Into<String>, precedence: NonZeroU8) -> Self {
        self.register_binary(op, precedence);
        self
    }

    /// Builder form of [`Grammar::register_unary`].
    #[must_use]
    pub fn with_unary(mut self, op: impl Into<String>) -> Self {
        self.register_unary(op);
        self
    }

    /// Builder form of [`Grammar::register_literal`].
    #[must_use]
    pub fn with_literal(mut self, keyword: impl Into<String>, value: Literal) -> Self {
        self.register_literal(keyword, value);
        self
    }
}

fn longest_key<'a>(keys: impl Iterator<Item = &'a String>) -> usize {
    keys.map(|k| k.chars().count()).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prec(n: u8) -> NonZeroU8 {
        match NonZeroU8::new(n) {
            Some(p) => p,
            None => panic!("precedence must be non-zero"),
        }
    }

    #[test]
    fn default_precedences_ordered() {
        let g = Grammar::default();
        assert!(g.binary_precedence("*") > g.binary_precedence("+"));
        assert!(g.binary_precedence("+") > g.binary_precedence("=="));
        assert!(g.binary_precedence("==") > g.binary_precedence("&&"));
        assert!(g.binary_precedence("&&") > g.binary_precedence("||"));
        assert!(g.binary_precedence("||") > g.binary_precedence("->"));
        assert_eq!(g.binary_precedence("@@"), NOT_AN_OPERATOR);
    }

    #[test]
    fn max_len_tracks_longest_key() {
        let mut g = Grammar::default();
        assert_eq!(g.max_binary_len(), 3); // >>> and ===

        g.register_binary("almost", prec(9));
        assert_eq!(g.max_binary_len(), 6);

        g.remove_binary("almost");
        assert_eq!(g.max_binary_len(), 3);
    }

    #[test]
    fn remove_reports_membership() {
        let mut g = Grammar::default();
        assert!(g.remove_binary("+"));
        assert!(!g.remove_binary("+"));
        assert_eq!(g.binary_precedence("+"), NOT_AN_OPERATOR);
    }

    #[test]
    fn high_codepoint_identifier_unless_operator() {
        let mut g = Grammar::default();
        assert!(g.is_identifier_start('λ'));
        g.register_binary("λ", prec(11));
        assert!(!g.is_identifier_start('λ'));
    }

    #[test]
    fn independent_instances() {
        let mut a = Grammar::default();
        let b = Grammar::default();
        a.remove_binary("+");
        assert_eq!(a.binary_precedence("+"), NOT_AN_OPERATOR);
        assert_eq!(b.binary_precedence("+"), 10);
    }

    #[test]
    fn literal_registration() {
        let g = Grammar::default().with_literal("pi", Literal::Number(std::f64::consts::PI));
        assert_eq!(g.literal("pi"), Some(&Literal::Number(std::f64::consts::PI)));
        assert_eq!(g.literal("true"), Some(&Literal::Bool(true)));
        assert_eq!(g.literal("maybe"), None);
    }
}
