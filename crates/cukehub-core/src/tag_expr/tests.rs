//! Parsing and evaluation coverage for tag expressions.

use rstest::rstest;

use super::TagExpression;
use super::parser::{MAX_NESTING, MAX_OPERATORS};

fn parse_expression(input: &str) -> TagExpression {
    TagExpression::parse(input).unwrap_or_else(|err| panic!("parse expression `{input}`: {err}"))
}

fn parse_error_message(input: &str) -> String {
    match TagExpression::parse(input) {
        Ok(expr) => panic!("expected parse error for `{input}`, got {expr:?}"),
        Err(err) => err.to_string(),
    }
}

#[rstest]
#[case("@fast", &["@fast"], true)]
#[case("@fast", &["@slow"], false)]
#[case("@smoke-tests", &["@smoke-tests"], true)]
#[case("@jira:ABC-1", &["@jira:ABC-1"], true)]
#[case("@a or @b and @c", &["@a"], true)]
#[case("@a or @b and @c", &["@b", "@c"], true)]
#[case("@a or @b and @c", &["@b"], false)]
#[case("not (@a or @b)", &["@c"], true)]
#[case("not (@a or @b)", &["@b"], false)]
#[case("@a Or nOt @b", &["@c"], true)]
#[case("@a and not not @b", &["@a", "@b"], true)]
fn evaluates_against_tag_sets(#[case] input: &str, #[case] tags: &[&str], #[case] expected: bool) {
    let expr = parse_expression(input);
    assert_eq!(expr.evaluate(tags.iter().copied()), expected);
}

#[test]
fn keeps_trimmed_source_text() {
    let expr = parse_expression("  @a and not @b ");
    assert_eq!(expr.as_str(), "@a and not @b");
    assert_eq!(expr.to_string(), "@a and not @b");
}

#[test]
fn lists_each_referenced_tag_once() {
    let expr = parse_expression("(@a or @b) and not @a");
    assert_eq!(expr.tags(), ["@a", "@b"]);
}

#[rstest]
#[case("@a and", "expected tag or '(' after 'and'")]
#[case("@a && @b", "unexpected character '&'")]
#[case("", "expected tag or '('")]
#[case("(@a or @b", "missing ')'")]
#[case("@a @b", "unexpected token @b")]
#[case("@", "expected tag name after '@'")]
#[case("@a xor @b", "unexpected identifier 'xor'")]
fn reports_parse_errors(#[case] input: &str, #[case] expected: &str) {
    let err = parse_error_message(input);
    assert!(err.contains(expected), "unexpected error message: {err}");
}

#[test]
fn errors_report_byte_offsets() {
    let Err(err) = TagExpression::parse("@a and )") else {
        panic!("expected an error");
    };
    assert_eq!(err.offset(), 7);
}

#[rstest]
#[case(MAX_NESTING)]
#[case(MAX_NESTING + 1)]
#[case(200_000)]
fn parenthesis_nesting_is_bounded(#[case] depth: usize) {
    let input = format!("{}@a{}", "(".repeat(depth), ")".repeat(depth));
    let result = TagExpression::parse(&input);
    if depth <= MAX_NESTING {
        assert!(result.is_ok_and(|expr| expr.evaluate(["@a"])));
    } else {
        let err = parse_error_message(&input);
        assert!(err.contains("nests deeper than"), "unexpected error message: {err}");
    }
}

#[test]
fn long_not_chains_are_rejected() {
    let input = format!("{}@a", "not ".repeat(100_000));
    let err = parse_error_message(&input);
    assert!(err.contains("nests deeper than"), "unexpected error message: {err}");
}

#[test]
fn operator_count_is_bounded() {
    let within = vec!["@a"; MAX_OPERATORS + 1].join(" or ");
    assert!(TagExpression::parse(&within).is_ok());

    let beyond = vec!["@a"; MAX_OPERATORS + 2].join(" or ");
    let err = parse_error_message(&beyond);
    assert!(err.contains("more than"), "unexpected error message: {err}");
}
