//! Concrete scenario tests for the grammar-description-language meta-parser
//! and the underlying combinator runtime. One test per numbered scenario.

use pegc_core::model::GrammarElement;
use pegc_core::parser::{Parser, ParserConfig, RuleBody};
use pegc_core::semantics::NoSemantics;
use pegc_core::{parse_grammar_source, Node};

#[test]
fn scenario_1_minimal_grammar_with_title() {
    let grammar = parse_grammar_source("GRAKO start = 'a' ; ").unwrap();
    assert_eq!(grammar.title.as_deref(), Some("GRAKO"));
    assert_eq!(grammar.rules.len(), 1);
    assert_eq!(grammar.rules[0].name, "start");
    assert_eq!(*grammar.rules[0].exp, GrammarElement::Token(grammar.rules[0].exp.pos(), "a".to_string()));
}

#[test]
fn scenario_2_whitespace_directive_and_one_rule() {
    let grammar = parse_grammar_source("@@whitespace :: /[ \\t]+/ x = 'a' ;").unwrap();
    assert_eq!(grammar.directives.len(), 1);
    assert_eq!(grammar.directives[0].name, "whitespace");
    assert_eq!(grammar.directives[0].value, "[ \\t]+");
    assert_eq!(grammar.rules.len(), 1);
    assert_eq!(grammar.rules[0].name, "x");
}

/// Not the meta-parser: a hand-written `expr`/`term` pair over the runtime
/// primitives directly, matching spec.md scenario 3's grammar
/// `expr = expr '+' term | term ; term = /\d+/ ;`.
#[test]
fn scenario_3_left_recursive_expr_combines_three_terms() {
    fn term(p: &mut Parser<'_>) -> pegc_core::parser::PResult<Node> {
        p.call("term", &|p| p.pattern(r"\d+"))
    }
    fn expr(p: &mut Parser<'_>) -> pegc_core::parser::PResult<Node> {
        let body: &RuleBody<'_> = &|p: &mut Parser<'_>| {
            p.choice::<Node>(&[
                &|p: &mut Parser<'_>| {
                    let lhs = p.call("expr", &|p| expr_inner(p))?;
                    p.token("+")?;
                    let rhs = term(p)?;
                    Ok(Node::Repeated(vec![lhs, rhs]))
                },
                &|p: &mut Parser<'_>| term(p),
            ])
        };
        p.call("expr", body)
    }
    fn expr_inner(p: &mut Parser<'_>) -> pegc_core::parser::PResult<Node> {
        expr(p)
    }

    let mut p = Parser::new("1+2+3", ParserConfig::default(), &NoSemantics);
    let result = expr(&mut p).unwrap();
    assert!(p.buffer().at_end());
    // The fixpoint grows left-to-right: the final seed nests the prior
    // (shorter) match as its left operand, so three flat terms end up
    // combined by the two successive `+` matches rather than flattened.
    match result {
        Node::Repeated(items) => assert_eq!(items.len(), 2),
        other => panic!("expected a combined expr, got {other:?}"),
    }
}

#[test]
fn scenario_4_cut_inside_first_alternative_suppresses_fallback() {
    fn r(p: &mut Parser<'_>) -> pegc_core::parser::PResult<Node> {
        p.call("r", &|p: &mut Parser<'_>| {
            p.choice::<Node>(&[
                &|p: &mut Parser<'_>| {
                    let t = p.token("a")?;
                    p.cut();
                    p.token("b")?;
                    Ok(t)
                },
                &|p: &mut Parser<'_>| {
                    p.token("a")?;
                    p.token("c")
                },
            ])
        })
    }
    let mut p = Parser::new("ac", ParserConfig::default(), &NoSemantics);
    let err = r(&mut p).unwrap_err();
    match err.into_rule_failure() {
        pegc_core::ParseError::Token { expected, .. } => assert_eq!(expected, "b"),
        other => panic!("expected a Token failure expecting \"b\", got {other:?}"),
    }
}

#[test]
fn scenario_5_nameguard_on_literal_if() {
    let mut p = Parser::new("iffy", ParserConfig::default(), &NoSemantics);
    assert!(p.token("if").is_err());
    assert_eq!(p.pos().offset, 0);

    let mut p = Parser::new("if x", ParserConfig::default(), &NoSemantics);
    assert_eq!(p.token("if").unwrap(), Node::Token("if".into()));
    assert_eq!(p.pos().offset, 2);
}

#[test]
fn scenario_6_negative_lookahead_over_end_keyword() {
    fn r(p: &mut Parser<'_>) -> pegc_core::parser::PResult<Node> {
        p.call("r", &|p: &mut Parser<'_>| {
            p.negative_lookahead(|p: &mut Parser<'_>| p.token("end"))?;
            p.pattern(r"\w+")
        })
    }
    let mut p = Parser::new("end", ParserConfig::default(), &NoSemantics);
    assert!(r(&mut p).is_err());

    let mut p = Parser::new("stop", ParserConfig::default(), &NoSemantics);
    assert_eq!(r(&mut p).unwrap(), Node::Token("stop".into()));
}

#[test]
fn scenario_7_round_trip_through_emit_is_structurally_equal_modulo_position() {
    let source = r#"
        GRAKO

        @@whitespace :: /[ \t\n]+/
        @@keyword :: if else

        start = { statement } $ ;
        statement = if_stmt | assignment ;
        if_stmt = 'if' '(' cond ')' then:statement ['else' else_:statement] ;
        assignment = name:/[a-z]+/ '=' value:expr ;
        cond = expr ;
        expr = term {('+' | '-') term} ;
        term = /\d+/ | name ;
        name = !keyword /[a-z]+/ ;
        keyword = 'if' | 'else' ;
    "#;

    let grammar = parse_grammar_source(source).unwrap();
    assert_eq!(grammar.title.as_deref(), Some("GRAKO"));
    assert_eq!(grammar.keywords, vec!["if".to_string(), "else".to_string()]);
    assert_eq!(grammar.rules.len(), 9);
    assert_eq!(grammar.rules[0].name, "start");

    let emitted = pegc_emit::emit(&grammar);
    let reparsed = parse_grammar_source(&emitted).unwrap();

    assert_eq!(strip_positions(&grammar), strip_positions(&reparsed));
}

/// Serialize a [`pegc_core::model::Grammar`] to JSON and null out every
/// `pos` field, so two trees that differ only in source offsets/line/column
/// compare equal.
fn strip_positions(grammar: &pegc_core::model::Grammar) -> serde_json::Value {
    let mut value = serde_json::to_value(grammar).unwrap();
    scrub(&mut value);
    value
}

fn scrub(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            map.remove("pos");
            for v in map.values_mut() {
                scrub(v);
            }
        }
        serde_json::Value::Array(items) => {
            for v in items {
                scrub(v);
            }
        }
        _ => {}
    }
}
