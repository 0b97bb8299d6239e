//! `term`: void, join, group, closures, optional, special, lookahead,
//! negative lookahead, and atom, tried in that order so that the more
//! specific forms are preferred over a bare atom.

use crate::ast::Node;
use crate::model::GrammarElement;
use crate::parser::{PResult, Parser};

use super::atom::atom;
use super::expression::expression;

pub(crate) fn term(p: &mut Parser<'_>) -> PResult<Node> {
    p.call("term", &|p: &mut Parser<'_>| {
        p.choice::<Node>(&[
            &void,
            &join,
            &group,
            &closure,
            &optional,
            &special,
            &lookahead,
            &negative_lookahead,
            &|p: &mut Parser<'_>| atom(p),
        ])
    })
}

fn void(p: &mut Parser<'_>) -> PResult<Node> {
    let pos = p.pos();
    p.token("(")?;
    p.token(")")?;
    Ok(Node::Element(Box::new(GrammarElement::EmptyClosure(pos))))
}

/// `sep.{exp}` / `sep.{exp}+`.
fn join(p: &mut Parser<'_>) -> PResult<Node> {
    let pos = p.pos();
    let sep = atom(p)?;
    p.token(".")?;
    p.token("{")?;
    let exp = expression(p)?;
    p.token("}")?;
    let positive = p.optional(|p: &mut Parser<'_>| p.token("+"))?.is_some();
    let sep = unwrap_element(sep);
    let exp = unwrap_element(exp);
    Ok(Node::Element(Box::new(GrammarElement::Join {
        pos,
        sep: Box::new(sep),
        exp: Box::new(exp),
        positive,
    })))
}

fn group(p: &mut Parser<'_>) -> PResult<Node> {
    let pos = p.pos();
    p.token("(")?;
    let exp = expression(p)?;
    p.token(")")?;
    Ok(Node::Element(Box::new(GrammarElement::Group(pos, Box::new(unwrap_element(exp))))))
}

/// `{exp}` (closure), `{exp}+` (positive closure), `{exp}-`/`{exp}*`
/// (closure; `-`/`*` are accepted as the same zero-or-more form as bare
/// `{exp}`, matching the source grammar's tolerance of either suffix).
fn closure(p: &mut Parser<'_>) -> PResult<Node> {
    let pos = p.pos();
    p.token("{")?;
    let exp = expression(p)?;
    p.token("}")?;
    let suffix = p.optional(|p: &mut Parser<'_>| {
        p.choice::<Node>(&[
            &|p: &mut Parser<'_>| p.token("+"),
            &|p: &mut Parser<'_>| p.token("-"),
            &|p: &mut Parser<'_>| p.token("*"),
        ])
    })?;
    let exp = Box::new(unwrap_element(exp));
    let element = match suffix.as_ref().and_then(Node::as_token) {
        Some("+") => GrammarElement::PositiveClosure(pos, exp),
        _ => GrammarElement::Closure(pos, exp),
    };
    Ok(Node::Element(Box::new(element)))
}

fn optional(p: &mut Parser<'_>) -> PResult<Node> {
    let pos = p.pos();
    p.token("[")?;
    let exp = expression(p)?;
    p.token("]")?;
    Ok(Node::Element(Box::new(GrammarElement::Optional(pos, Box::new(unwrap_element(exp))))))
}

/// `?(...)?`: an opaque directive to the code generator, carried verbatim.
fn special(p: &mut Parser<'_>) -> PResult<Node> {
    let pos = p.pos();
    let raw = p.pattern(r"\?\(.*?\)\?")?;
    let text = raw.as_token().unwrap_or_default();
    let inner = &text[2..text.len() - 2];
    Ok(Node::Element(Box::new(GrammarElement::Special(pos, inner.to_string()))))
}

fn lookahead(p: &mut Parser<'_>) -> PResult<Node> {
    let pos = p.pos();
    p.token("&")?;
    let exp = term(p)?;
    Ok(Node::Element(Box::new(GrammarElement::Lookahead(pos, Box::new(unwrap_element(exp))))))
}

fn negative_lookahead(p: &mut Parser<'_>) -> PResult<Node> {
    let pos = p.pos();
    p.token("!")?;
    let exp = term(p)?;
    Ok(Node::Element(Box::new(GrammarElement::NegativeLookahead(pos, Box::new(unwrap_element(exp))))))
}

/// Every production in this module returns `Node::Element` on success; this
/// just removes the wrapper.
pub(crate) fn unwrap_element(node: Node) -> GrammarElement {
    match node {
        Node::Element(boxed) => *boxed,
        other => unreachable!("expression productions always yield Node::Element, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParserConfig;
    use crate::semantics::NoSemantics;

    fn parse(text: &str) -> GrammarElement {
        let mut p = Parser::new(text, ParserConfig::default(), &NoSemantics);
        unwrap_element(term(&mut p).unwrap())
    }

    #[test]
    fn void_matches_empty_parens() {
        assert!(matches!(parse("()"), GrammarElement::EmptyClosure(_)));
    }

    #[test]
    fn join_with_plus_is_positive() {
        match parse("','.{ 'a' }+") {
            GrammarElement::Join { positive, .. } => assert!(positive),
            other => panic!("expected Join, got {other:?}"),
        }
    }

    #[test]
    fn join_without_plus_is_not_positive() {
        match parse("','.{ 'a' }") {
            GrammarElement::Join { positive, .. } => assert!(!positive),
            other => panic!("expected Join, got {other:?}"),
        }
    }

    #[test]
    fn closure_suffixes_all_mean_zero_or_more_except_plus() {
        for suffix in ["", "-", "*"] {
            match parse(&format!("{{'a'}}{suffix}")) {
                GrammarElement::Closure(_, _) => {}
                other => panic!("suffix {suffix:?}: expected Closure, got {other:?}"),
            }
        }
        assert!(matches!(parse("{'a'}+"), GrammarElement::PositiveClosure(_, _)));
    }

    #[test]
    fn optional_wraps_its_expression() {
        assert!(matches!(parse("['a']"), GrammarElement::Optional(_, _)));
    }

    #[test]
    fn group_unwraps_to_a_choice_inside() {
        match parse("('a' | 'b')") {
            GrammarElement::Group(_, inner) => assert!(matches!(*inner, GrammarElement::Choice(_))),
            other => panic!("expected Group, got {other:?}"),
        }
    }

    #[test]
    fn special_strips_its_delimiters() {
        match parse("?(some directive)?") {
            GrammarElement::Special(_, text) => assert_eq!(text, "some directive"),
            other => panic!("expected Special, got {other:?}"),
        }
    }

    #[test]
    fn lookahead_and_negative_lookahead_wrap_a_term() {
        assert!(matches!(parse("&'a'"), GrammarElement::Lookahead(_, _)));
        assert!(matches!(parse("!'a'"), GrammarElement::NegativeLookahead(_, _)));
    }
}
