//! Unit tests for the filter expression parser

use mlmd_filter_query::ast::{AstNode, ComparisonOperator, FieldRef, Literal};
use mlmd_filter_query::parser::Parser;
use mlmd_filter_query::{parse, ParseError};

fn field(segments: &[&str]) -> FieldRef {
    FieldRef::new(segments.iter().map(|s| s.to_string()).collect(), 0)
}

fn cmp(segments: &[&str], operator: ComparisonOperator, literal: Literal) -> AstNode {
    AstNode::Comparison {
        field: field(segments),
        operator,
        literal,
    }
}

fn eq_int(name: &str, value: i64) -> AstNode {
    cmp(&[name], ComparisonOperator::Equal, Literal::Integer(value))
}

fn parse_err(input: &str) -> ParseError {
    match parse(input) {
        Ok(ast) => panic!("expected {:?} to fail, got {:?}", input, ast),
        Err(e) => e,
    }
}

#[test]
fn test_parse_comparison() {
    assert_eq!(parse("type_id = 1").unwrap(), eq_int("type_id", 1));
    assert_eq!(
        parse("name LIKE 'foo%'").unwrap(),
        cmp(
            &["name"],
            ComparisonOperator::Like,
            Literal::String("foo%".into())
        )
    );
    assert_eq!(
        parse("properties.p1.double_value >= -0.5").unwrap(),
        cmp(
            &["properties", "p1", "double_value"],
            ComparisonOperator::GreaterThanOrEqual,
            Literal::Float(-0.5)
        )
    );
}

#[test]
fn test_parse_operators() {
    let cases = [
        ("a = 1", ComparisonOperator::Equal),
        ("a != 1", ComparisonOperator::NotEqual),
        ("a <> 1", ComparisonOperator::NotEqual),
        ("a < 1", ComparisonOperator::LessThan),
        ("a <= 1", ComparisonOperator::LessThanOrEqual),
        ("a > 1", ComparisonOperator::GreaterThan),
        ("a >= 1", ComparisonOperator::GreaterThanOrEqual),
        ("a like 1", ComparisonOperator::Like),
    ];
    for (input, operator) in cases {
        assert_eq!(
            parse(input).unwrap(),
            cmp(&["a"], operator, Literal::Integer(1)),
            "{}",
            input
        );
    }
}

#[test]
fn test_and_binds_tighter_than_or() {
    assert_eq!(
        parse("a = 1 OR b = 2 AND c = 3").unwrap(),
        AstNode::Or(vec![
            eq_int("a", 1),
            AstNode::And(vec![eq_int("b", 2), eq_int("c", 3)]),
        ])
    );
}

#[test]
fn test_chains_are_flattened() {
    assert_eq!(
        parse("a = 1 AND b = 2 AND c = 3").unwrap(),
        AstNode::And(vec![eq_int("a", 1), eq_int("b", 2), eq_int("c", 3)])
    );
    assert_eq!(
        parse("a = 1 or b = 2 Or c = 3").unwrap(),
        AstNode::Or(vec![eq_int("a", 1), eq_int("b", 2), eq_int("c", 3)])
    );
}

#[test]
fn test_groups_stay_nested() {
    assert_eq!(
        parse("(a = 1 AND b = 2) AND c = 3").unwrap(),
        AstNode::And(vec![
            AstNode::And(vec![eq_int("a", 1), eq_int("b", 2)]),
            eq_int("c", 3),
        ])
    );
    // A redundant group around a single comparison adds nothing.
    assert_eq!(parse("((a = 1))").unwrap(), eq_int("a", 1));
}

#[test]
fn test_not() {
    assert_eq!(
        parse("NOT(type_id = 1)").unwrap(),
        AstNode::Not(Box::new(eq_int("type_id", 1)))
    );
    assert_eq!(
        parse("not not a = 1").unwrap(),
        AstNode::Not(Box::new(AstNode::Not(Box::new(eq_int("a", 1)))))
    );
    assert_eq!(
        parse("NOT a = 1 AND b = 2").unwrap(),
        AstNode::And(vec![AstNode::Not(Box::new(eq_int("a", 1))), eq_int("b", 2)])
    );
}

#[test]
fn test_backquoted_segments() {
    assert_eq!(
        parse("properties.`0:b`.int_value = 1").unwrap(),
        cmp(
            &["properties", "0:b", "int_value"],
            ComparisonOperator::Equal,
            Literal::Integer(1)
        )
    );
    // Backquotes do not change identity
    assert_eq!(
        parse("properties.`p0`.int_value = 1").unwrap(),
        parse("properties.p0.int_value = 1").unwrap()
    );
    // Keywords are plain segments after a dot
    assert_eq!(
        parse("properties.and.int_value = 1").unwrap(),
        cmp(
            &["properties", "and", "int_value"],
            ComparisonOperator::Equal,
            Literal::Integer(1)
        )
    );
}

#[test]
fn test_string_quotes() {
    assert_eq!(
        parse("name = \"it's\"").unwrap(),
        cmp(
            &["name"],
            ComparisonOperator::Equal,
            Literal::String("it's".into())
        )
    );
    assert_eq!(
        parse("name = ''").unwrap(),
        cmp(&["name"], ComparisonOperator::Equal, Literal::String(String::new()))
    );
}

#[test]
fn test_field_position() {
    match parse("  a = 1").unwrap() {
        AstNode::Comparison { field, .. } => assert_eq!(field.position, 2),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_syntax_errors() {
    for input in [
        "",
        "a",
        "a =",
        "= 1",
        "a = 1 AND",
        "a = 1 b = 2",
        "a == 1",
        "1 = a",
        "a = b",
        "a.= 1",
        "a = 1.",
        "a = .5",
        "AND a = 1",
        "a = 1 OR OR b = 2",
    ] {
        parse_err(input);
    }
}

#[test]
fn test_unbalanced_parentheses() {
    let err = parse_err("(a = 1");
    assert_eq!(err.position, 0);
    assert!(err.message.contains("missing ')'"), "{}", err);

    let err = parse_err("a = 1)");
    assert_eq!(err.position, 5);
    assert!(err.message.contains("unexpected ')'"), "{}", err);
}

#[test]
fn test_error_reports_position_and_fragment() {
    let err = parse_err("type_id = 1 AND name ~ 'x'");
    assert_eq!(err.position, 21);
    assert!(err.fragment.starts_with("~ 'x'"), "{}", err);
    assert!(err.to_string().starts_with("Parse error at position 21"));
}

#[test]
fn test_lexical_errors_are_reported() {
    let err = parse_err("properties.`p0.int_value = 1");
    assert_eq!(err.position, 11);

    let err = parse_err("name = 'open");
    assert_eq!(err.position, 7);
}

#[test]
fn test_integer_out_of_range() {
    assert!(parse("a = 9223372036854775807").is_ok());
    assert!(parse("a = -9223372036854775808").is_ok());
    let err = parse_err("a = 9223372036854775808");
    assert!(err.message.contains("out of range"), "{}", err);
}

#[test]
fn test_depth_limit() {
    let nested = format!("{}a = 1{}", "(".repeat(10), ")".repeat(10));
    assert!(Parser::new(&nested).with_max_depth(20).parse().is_ok());
    assert!(Parser::new(&nested).with_max_depth(5).parse().is_err());

    let nots = format!("{}a = 1", "NOT ".repeat(300));
    let err = parse_err(&nots);
    assert!(err.message.contains("too deeply nested"), "{}", err);
}
