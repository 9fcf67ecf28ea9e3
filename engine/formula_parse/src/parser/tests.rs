#![allow(clippy::unwrap_used)]

use super::*;
use crate::error::ParseErrorKind;
use formula_ir::Literal;
use std::num::NonZeroU8;

fn parse_default(src: &str) -> Result<Program, ParseError> {
    parse(&Grammar::default(), src)
}

fn root(src: &str) -> (Program, ExprKind) {
    let program = parse_default(src).unwrap();
    let kind = program.root_expr().kind.clone();
    (program, kind)
}

fn number_kind(kind: &ExprKind) -> Option<f64> {
    match kind {
        ExprKind::Literal(Literal::Number(n)) => Some(*n),
        _ => None,
    }
}

fn prec(n: u8) -> NonZeroU8 {
    NonZeroU8::new(n).unwrap()
}

// ===== Literals =====

#[test]
fn numeric_literals() {
    for (src, expected) in [
        ("42", 42.0),
        ("3.5", 3.5),
        (".5", 0.5),
        ("12.", 12.0),
        ("1e3", 1000.0),
        ("1e-2", 0.01),
        ("6.02E+23", 6.02e23),
    ] {
        let (_, kind) = root(src);
        assert_eq!(number_kind(&kind), Some(expected), "source: {src}");
    }
}

#[test]
fn number_into_identifier_is_error() {
    let err = parse_default("123abc").unwrap_err();
    assert!(matches!(
        err.kind,
        ParseErrorKind::DigitsBeforeIdentifier { ref literal } if literal == "123a"
    ));
}

#[test]
fn double_period_is_error() {
    let err = parse_default("1.2.3").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnexpectedPeriod);
}

#[test]
fn lone_period_is_error() {
    let err = parse_default(".").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnexpectedPeriod);
}

#[test]
fn exponent_without_digits_is_error() {
    let err = parse_default("1e").unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::ExpectedExponent { .. }));
    let err = parse_default("1e+").unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::ExpectedExponent { .. }));
}

#[test]
fn string_literals_and_escapes() {
    let (_, kind) = root(r#""a\tb\nc""#);
    assert_eq!(
        kind,
        ExprKind::Literal(Literal::Str("a\tb\nc".to_string()))
    );

    let (_, kind) = root(r"'pass\qthrough'");
    assert_eq!(
        kind,
        ExprKind::Literal(Literal::Str("passqthrough".to_string()))
    );
}

#[test]
fn unterminated_string_is_error() {
    let err = parse_default("'abc").unwrap_err();
    assert!(matches!(
        err.kind,
        ParseErrorKind::UnterminatedString { ref text } if text == "abc"
    ));
}

#[test]
fn keyword_literals_and_this() {
    let (_, kind) = root("true");
    assert_eq!(kind, ExprKind::Literal(Literal::Bool(true)));
    let (_, kind) = root("null");
    assert_eq!(kind, ExprKind::Literal(Literal::Null));
    let (_, kind) = root("this");
    assert_eq!(kind, ExprKind::This);
    let (_, kind) = root("truthy");
    assert_eq!(kind, ExprKind::Ident("truthy".to_string()));
}

// ===== Precedence and associativity =====

#[test]
fn multiplication_binds_tighter_than_addition() {
    let (program, kind) = root("2+2*2");
    let ExprKind::Binary { op, left, right } = kind else {
        panic!("expected binary root");
    };
    assert_eq!(op, "+");
    assert_eq!(number_kind(&program.arena.get(left).kind), Some(2.0));
    assert!(matches!(
        program.arena.get(right).kind,
        ExprKind::Binary { ref op, .. } if op == "*"
    ));
}

#[test]
fn equal_precedence_is_left_associative() {
    // (8 - 4) - 2
    let (program, kind) = root("8-4-2");
    let ExprKind::Binary { op, left, right } = kind else {
        panic!("expected binary root");
    };
    assert_eq!(op, "-");
    assert!(matches!(
        program.arena.get(left).kind,
        ExprKind::Binary { ref op, .. } if op == "-"
    ));
    assert_eq!(number_kind(&program.arena.get(right).kind), Some(2.0));
}

#[test]
fn grouping_overrides_precedence() {
    let (program, kind) = root("(2+2)*2");
    let ExprKind::Binary { op, left, .. } = kind else {
        panic!("expected binary root");
    };
    assert_eq!(op, "*");
    assert!(matches!(
        program.arena.get(left).kind,
        ExprKind::Binary { ref op, .. } if op == "+"
    ));
}

#[test]
fn logical_operators_get_their_own_tag() {
    let (_, kind) = root("a && b");
    assert!(matches!(kind, ExprKind::Logical { ref op, .. } if op == "&&"));
    let (_, kind) = root("a || b");
    assert!(matches!(kind, ExprKind::Logical { ref op, .. } if op == "||"));
}

#[test]
fn longest_operator_wins() {
    let (_, kind) = root("a >>> b");
    assert!(matches!(kind, ExprKind::Binary { ref op, .. } if op == ">>>"));
    let (_, kind) = root("a >> b");
    assert!(matches!(kind, ExprKind::Binary { ref op, .. } if op == ">>"));
}

#[test]
fn pipe_arrow_binds_loosest() {
    let (program, kind) = root("a + b -> f(1)");
    let ExprKind::Binary { op, left, .. } = kind else {
        panic!("expected binary root");
    };
    assert_eq!(op, "->");
    assert!(matches!(
        program.arena.get(left).kind,
        ExprKind::Binary { ref op, .. } if op == "+"
    ));
}

#[test]
fn trailing_operator_is_error() {
    let err = parse_default("1 +").unwrap_err();
    assert!(matches!(
        err.kind,
        ParseErrorKind::MissingOperand { ref op } if op == "+"
    ));
}

// ===== Unary =====

#[test]
fn unary_operators_nest() {
    let (program, kind) = root("!!x");
    let ExprKind::Unary { op, operand } = kind else {
        panic!("expected unary root");
    };
    assert_eq!(op, "!");
    assert!(matches!(
        program.arena.get(operand).kind,
        ExprKind::Unary { ref op, .. } if op == "!"
    ));
}

#[test]
fn unary_minus_before_number() {
    let (program, kind) = root("-3");
    let ExprKind::Unary { op, operand } = kind else {
        panic!("expected unary root");
    };
    assert_eq!(op, "-");
    assert_eq!(number_kind(&program.arena.get(operand).kind), Some(3.0));
}

// ===== Conditionals =====

#[test]
fn conditional_expression() {
    let (_, kind) = root("a ? 1 : 2");
    assert!(matches!(kind, ExprKind::Conditional { .. }));
}

#[test]
fn conditional_missing_colon_is_error() {
    let err = parse_default("a ? 1").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::ExpectedColon);
}

// ===== Members and calls =====

#[test]
fn field_chain() {
    let (program, kind) = root("foo.bar.baz");
    let ExprKind::Field { receiver, field } = kind else {
        panic!("expected field root");
    };
    assert_eq!(field, "baz");
    assert!(matches!(
        program.arena.get(receiver).kind,
        ExprKind::Field { ref field, .. } if field == "bar"
    ));
}

#[test]
fn index_and_field_mix() {
    // foo[x.y].bar
    let (program, kind) = root("foo[x.y].bar");
    let ExprKind::Field { receiver, field } = kind else {
        panic!("expected field root");
    };
    assert_eq!(field, "bar");
    let ExprKind::Index { index, .. } = &program.arena.get(receiver).kind else {
        panic!("expected index receiver");
    };
    assert!(matches!(
        program.arena.get(*index).kind,
        ExprKind::Field { .. }
    ));
}

#[test]
fn call_with_arguments() {
    let (program, kind) = root("f(1, 2)");
    let ExprKind::Call { args, .. } = kind else {
        panic!("expected call root");
    };
    assert_eq!(program.arena.list(args).len(), 2);
}

#[test]
fn call_with_no_arguments() {
    let (program, kind) = root("f()");
    let ExprKind::Call { args, .. } = kind else {
        panic!("expected call root");
    };
    assert!(program.arena.list(args).is_empty());
}

#[test]
fn method_call_on_field() {
    let (program, kind) = root("obj.fmt(1)");
    let ExprKind::Call { callee, .. } = kind else {
        panic!("expected call root");
    };
    assert!(matches!(
        program.arena.get(callee).kind,
        ExprKind::Field { ref field, .. } if field == "fmt"
    ));
}

#[test]
fn argument_list_errors() {
    let err = parse_default("f(a b)").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::ExpectedComma);

    let err = parse_default("f(,1)").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnexpectedComma);

    let err = parse_default("f(1").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnclosedParen);

    let err = parse_default("a[1").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnclosedBracket);
}

#[test]
fn array_literal() {
    let (program, kind) = root("[1, 2, 3]");
    let ExprKind::Array(elements) = kind else {
        panic!("expected array root");
    };
    assert_eq!(program.arena.list(elements).len(), 3);
}

// ===== Compounds and separators =====

#[test]
fn compound_keeps_order() {
    let (program, kind) = root("a; b, c");
    let ExprKind::Compound(range) = kind else {
        panic!("expected compound root");
    };
    assert_eq!(program.arena.list(range).len(), 3);
}

#[test]
fn trailing_separator_is_not_a_compound() {
    let (_, kind) = root("a;");
    assert_eq!(kind, ExprKind::Ident("a".to_string()));
}

#[test]
fn adjacent_expressions_require_separator() {
    let err = parse_default("1 2").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::ExpectedSeparator);
}

#[test]
fn empty_source_is_error() {
    for src in ["", "   ", "\t\n"] {
        let err = parse_default(src).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::ExpectedExpression, "source: {src:?}");
    }
}

// ===== Registry-driven parsing =====

#[test]
fn removed_operator_fails_to_parse() {
    let mut grammar = Grammar::default();
    assert!(parse(&grammar, "1+1").is_ok());

    grammar.remove_binary("+");
    let err = parse(&grammar, "1+1").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::ExpectedSeparator);
}

#[test]
fn registered_operator_parses() {
    let grammar = Grammar::default().with_binary("**", prec(12));
    let program = parse(&grammar, "2**3 + 1").unwrap();
    // ** binds tighter than +
    assert!(matches!(
        program.root_expr().kind,
        ExprKind::Binary { ref op, .. } if op == "+"
    ));
}

#[test]
fn word_operator_respects_identifier_boundary() {
    let grammar = Grammar::default().with_binary("and", prec(3));
    let program = parse(&grammar, "a and b").unwrap();
    assert!(matches!(
        program.root_expr().kind,
        ExprKind::Binary { ref op, .. } if op == "and"
    ));

    // `andy` stays one identifier
    let program = parse(&grammar, "andy").unwrap();
    assert_eq!(program.root_expr().kind, ExprKind::Ident("andy".to_string()));
}

#[test]
fn custom_unary_operator() {
    let grammar = Grammar::default().with_unary("not");
    let program = parse(&grammar, "not ok").unwrap();
    assert!(matches!(
        program.root_expr().kind,
        ExprKind::Unary { ref op, .. } if op == "not"
    ));
}

#[test]
fn offsets_are_reported() {
    let err = parse_default("1 + ").unwrap_err();
    assert_eq!(err.offset(), 2);
    assert!(err.to_string().contains("at character 2"));
}

#[test]
fn spans_cover_the_expression() {
    let (program, _) = root("1 + 2");
    let span = program.root_expr().span;
    assert_eq!(span.start, 0);
    assert_eq!(span.end, 5);
}

// ===== Depth bound =====

#[test]
fn deep_nesting_is_rejected() {
    let depth = (MAX_DEPTH + 10) as usize;
    let src = format!("{}x{}", "(".repeat(depth), ")".repeat(depth));
    let err = parse_default(&src).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::TooDeep);
}

#[test]
fn shallow_nesting_is_fine() {
    let src = format!("{}x{}", "(".repeat(100), ")".repeat(100));
    assert!(parse_default(&src).is_ok());
}
