//! `atom ::= cut | token | constant | rule_ref | pattern | eof`
//!
//! The leaf grammar elements. None of these rules register a semantic
//! handler: each builds its [`GrammarElement`] directly and returns it as
//! the rule's bare result, which `call()` passes through unchanged since no
//! named AST slot is ever populated here.

use crate::ast::Node;
use crate::model::GrammarElement;
use crate::parser::{PResult, Parser};

use super::literal::{regex, string};

pub(crate) fn atom(p: &mut Parser<'_>) -> PResult<Node> {
    p.call("atom", &|p: &mut Parser<'_>| {
        p.choice::<Node>(&[
            &cut,
            &token,
            &constant,
            &rule_ref,
            &pattern,
            &eof,
        ])
    })
}

fn cut(p: &mut Parser<'_>) -> PResult<Node> {
    let pos = p.pos();
    p.choice::<Node>(&[&|p: &mut Parser<'_>| p.token("~"), &|p: &mut Parser<'_>| p.token(">>")])?;
    p.cut();
    Ok(Node::Element(Box::new(GrammarElement::Cut(pos))))
}

fn token(p: &mut Parser<'_>) -> PResult<Node> {
    let pos = p.pos();
    let literal = string(p)?;
    let text = literal.as_token().unwrap_or_default().to_string();
    Ok(Node::Element(Box::new(GrammarElement::Token(pos, text))))
}

/// `` `literal` ``: a backtick-delimited literal that is inserted into the
/// matched value without being present in (or validated against) the input
/// a generated rule actually consumes.
fn constant(p: &mut Parser<'_>) -> PResult<Node> {
    let pos = p.pos();
    let raw = p.pattern(r"`(?:\\.|[^`\\\n])*`")?;
    let text = raw.as_token().unwrap_or_default();
    let inner = &text[1..text.len() - 1];
    Ok(Node::Element(Box::new(GrammarElement::Constant(pos, inner.to_string()))))
}

fn pattern(p: &mut Parser<'_>) -> PResult<Node> {
    let pos = p.pos();
    let source = regex(p)?;
    let source = source.as_token().unwrap_or_default().to_string();
    Ok(Node::Element(Box::new(GrammarElement::Pattern(pos, source))))
}

fn eof(p: &mut Parser<'_>) -> PResult<Node> {
    let pos = p.pos();
    p.token("$")?;
    Ok(Node::Element(Box::new(GrammarElement::Eof(pos))))
}

/// A bare word naming another rule. This is the last alternative tried:
/// every other atom form has a distinguishing leading symbol.
fn rule_ref(p: &mut Parser<'_>) -> PResult<Node> {
    let pos = p.pos();
    let name = super::literal::word(p)?;
    let name = name.as_token().unwrap_or_default().to_string();
    Ok(Node::Element(Box::new(GrammarElement::RuleRef(pos, name))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::term::unwrap_element;
    use crate::parser::ParserConfig;
    use crate::semantics::NoSemantics;

    fn parse(text: &str) -> GrammarElement {
        let mut p = Parser::new(text, ParserConfig::default(), &NoSemantics);
        unwrap_element(atom(&mut p).unwrap())
    }

    #[test]
    fn cut_accepts_tilde_form() {
        assert!(matches!(parse("~"), GrammarElement::Cut(_)));
    }

    #[test]
    fn cut_accepts_deprecated_arrow_form() {
        assert!(matches!(parse(">>"), GrammarElement::Cut(_)));
    }

    #[test]
    fn constant_strips_backticks() {
        match parse("`true`") {
            GrammarElement::Constant(_, text) => assert_eq!(text, "true"),
            other => panic!("expected Constant, got {other:?}"),
        }
    }

    #[test]
    fn eof_matches_dollar_sign() {
        assert!(matches!(parse("$"), GrammarElement::Eof(_)));
    }

    #[test]
    fn rule_ref_captures_bare_word() {
        match parse("expression") {
            GrammarElement::RuleRef(_, name) => assert_eq!(name, "expression"),
            other => panic!("expected RuleRef, got {other:?}"),
        }
    }

    #[test]
    fn token_captures_quoted_string() {
        match parse("'foo'") {
            GrammarElement::Token(_, text) => assert_eq!(text, "foo"),
            other => panic!("expected Token, got {other:?}"),
        }
    }

    #[test]
    fn pattern_captures_regex_source() {
        match parse("/[a-z]+/") {
            GrammarElement::Pattern(_, source) => assert_eq!(source, "[a-z]+"),
            other => panic!("expected Pattern, got {other:?}"),
        }
    }
}
