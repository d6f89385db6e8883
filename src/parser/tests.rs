use super::*;
use pretty_assertions::assert_eq;

fn parse(code: &str) -> Expression {
    Parser::new(code)
        .parse()
        .unwrap_or_else(|e| panic!("failed to parse {code:?}: {e}"))
}

#[test]
fn test_precedence_layers() {
    assert_eq!(parse("a || b && c").to_string(), "(|| a (&& b c))");
    assert_eq!(parse("a && b || c").to_string(), "(|| (&& a b) c)");
    assert_eq!(parse("a == b && c != d").to_string(), "(&& (== a b) (!= c d))");
    assert_eq!(parse("a + b * c == d").to_string(), "(== (+ a (* b c)) d)");
    assert_eq!(parse("a < b + c").to_string(), "(< a (+ b c))");
}

#[test]
fn test_additive_and_multiplicative_are_left_associative() {
    assert_eq!(parse("a + b + c").to_string(), "(+ (+ a b) c)");
    assert_eq!(parse("a / b * c").to_string(), "(* (/ a b) c)");
    assert_eq!(parse("a - b - c").to_string(), "(- (- a b) c)");
}

#[test]
fn test_comparisons_do_not_chain() {
    assert!(Parser::new("a == b == c").parse().is_err());
    assert!(Parser::new("a < b < c").parse().is_err());
    // a relational result may still be compared for equality once
    assert_eq!(parse("a < b == c").to_string(), "(== (< a b) c)");
}

#[test]
fn test_member_chain_binds_tighter_than_operators() {
    assert_eq!(
        parse("Location.Lat == 1.0").to_string(),
        "(== (. Location Lat) 1.0)"
    );
    assert_eq!(parse("a.b.c").to_string(), "(. (. a b) c)");
    assert_eq!(parse("(a && b).c").to_string(), "(. (&& a b) c)");
}

#[test]
fn test_literals() {
    assert_eq!(
        parse("true").inner,
        ExpressionInner::Constant(Constant::Bool(true))
    );
    assert_eq!(
        parse("false").inner,
        ExpressionInner::Constant(Constant::Bool(false))
    );
    assert_eq!(parse("42").inner, ExpressionInner::Constant(Constant::Int(42)));
    assert_eq!(parse("-7").inner, ExpressionInner::Constant(Constant::Int(-7)));
    assert_eq!(
        parse("1.5").inner,
        ExpressionInner::Constant(Constant::Float(1.5))
    );
    assert_eq!(
        parse("2f").inner,
        ExpressionInner::Constant(Constant::Float(2.0))
    );
    assert_eq!(
        parse("1e-3").inner,
        ExpressionInner::Constant(Constant::Float(0.001))
    );
    assert_eq!(
        parse(r#"'it\'s'"#).inner,
        ExpressionInner::Constant(Constant::String("it's".to_string()))
    );
}

#[test]
fn test_object_literal() {
    let expr = parse(r#"{ FirstName: "Frank", LastName:"Krueger" }"#);
    let assignments = expr.as_object_literal().expect("object literal");
    assert_eq!(assignments.len(), 2);
    assert_eq!(assignments[0].name, "FirstName");
    assert_eq!(
        assignments[0].value.inner,
        ExpressionInner::Constant(Constant::String("Frank".to_string()))
    );
    assert_eq!(assignments[1].name, "LastName");

    let expr = parse("{Lat=1,Lon=2}");
    assert_eq!(expr.to_string(), "{ Lat: 1, Lon: 2 }");

    let expr = parse(r#"{ "Lat": 1 Lon = 2.5 }"#);
    assert_eq!(expr.to_string(), "{ Lat: 1, Lon: 2.5 }");

    assert_eq!(parse("{}").to_string(), "{ }");
}

#[test]
fn test_nested_object_literal() {
    let expr = parse("{ Location: { Lat: 1, Lon: 2 } }");
    let assignments = expr.as_object_literal().expect("object literal");
    assert!(assignments[0].value.as_object_literal().is_some());
}

#[test]
fn test_malformed_input() {
    for code in [
        "",
        "(a == b",
        "a ==",
        "{ Lat: 1",
        "{ 1: 2 }",
        "{ Lat 1 }",
        "a.",
        "a.1",
        "== b",
        "1e",
        "a b",
    ] {
        assert!(
            Parser::new(code).parse().is_err(),
            "expected {code:?} to be rejected"
        );
    }
}

#[test]
fn test_lex_error_surfaces_through_parser() {
    let err = Parser::new("a == #").parse().unwrap_err();
    assert!(err.to_string().starts_with("LexError"), "{err}");
}

#[test]
fn test_parse_is_deterministic() {
    let code = r#"FullName == "Frank Krueger" && Location.Lat == 1.0"#;
    assert_eq!(parse(code), parse(code));
}

#[test]
fn test_spans_cover_source() {
    let code = "Location.Lat == 1.0";
    let expr = parse(code);
    assert_eq!(expr.range, (0, code.len()));
}
