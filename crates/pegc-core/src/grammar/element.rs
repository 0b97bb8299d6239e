//! `element ::= rule_include | named | override | term`.

use crate::ast::Node;
use crate::model::GrammarElement;
use crate::parser::{PResult, Parser};

use super::literal::word;
use super::term::{term, unwrap_element};

pub(crate) fn element(p: &mut Parser<'_>) -> PResult<Node> {
    p.call("element", &|p: &mut Parser<'_>| {
        p.choice::<Node>(&[&rule_include, &named, &override_, &|p: &mut Parser<'_>| term(p)])
    })
}

/// `> name`
fn rule_include(p: &mut Parser<'_>) -> PResult<Node> {
    let pos = p.pos();
    p.token(">")?;
    let name = word(p)?;
    let name = name.as_token().unwrap_or_default().to_string();
    Ok(Node::Element(Box::new(GrammarElement::RuleInclude(pos, name))))
}

/// `name:term` (set semantics) or `name+:term` (append semantics).
fn named(p: &mut Parser<'_>) -> PResult<Node> {
    let pos = p.pos();
    let name = word(p)?;
    let name = name.as_token().unwrap_or_default().to_string();
    let is_list = p.choice::<Node>(&[
        &|p: &mut Parser<'_>| {
            p.token("+:")?;
            Ok(Node::Token("list".into()))
        },
        &|p: &mut Parser<'_>| {
            p.token(":")?;
            Ok(Node::Token("scalar".into()))
        },
    ])?;
    let exp = term(p)?;
    let exp = Box::new(unwrap_element(exp));
    let element = if is_list.as_token() == Some("list") {
        GrammarElement::NamedList(pos, name, exp)
    } else {
        GrammarElement::Named(pos, name, exp)
    };
    Ok(Node::Element(Box::new(element)))
}

/// `@:term` (override, set semantics), `@+:term` (override, append
/// semantics), or the deprecated bare `@term` (equivalent to `@:term`).
fn override_(p: &mut Parser<'_>) -> PResult<Node> {
    let pos = p.pos();
    p.token("@")?;
    let is_list = p
        .optional(|p: &mut Parser<'_>| {
            p.choice::<Node>(&[
                &|p: &mut Parser<'_>| {
                    p.token("+:")?;
                    Ok(Node::Token("list".into()))
                },
                &|p: &mut Parser<'_>| {
                    p.token(":")?;
                    Ok(Node::Token("scalar".into()))
                },
            ])
        })?
        .and_then(|n| n.as_token().map(|s| s == "list"))
        .unwrap_or(false);
    let exp = term(p)?;
    let exp = Box::new(unwrap_element(exp));
    let element = if is_list {
        GrammarElement::OverrideList(pos, exp)
    } else {
        GrammarElement::Override(pos, exp)
    };
    Ok(Node::Element(Box::new(element)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParserConfig;
    use crate::semantics::NoSemantics;

    fn parse(text: &str) -> GrammarElement {
        let mut p = Parser::new(text, ParserConfig::default(), &NoSemantics);
        unwrap_element(element(&mut p).unwrap())
    }

    #[test]
    fn rule_include_captures_the_included_rule_name() {
        match parse("> other_rule") {
            GrammarElement::RuleInclude(_, name) => assert_eq!(name, "other_rule"),
            other => panic!("expected RuleInclude, got {other:?}"),
        }
    }

    #[test]
    fn named_scalar_form_uses_plain_colon() {
        match parse("value:'x'") {
            GrammarElement::Named(_, name, _) => assert_eq!(name, "value"),
            other => panic!("expected Named, got {other:?}"),
        }
    }

    #[test]
    fn named_list_form_uses_plus_colon() {
        match parse("items+:'x'") {
            GrammarElement::NamedList(_, name, _) => assert_eq!(name, "items"),
            other => panic!("expected NamedList, got {other:?}"),
        }
    }

    #[test]
    fn override_scalar_form_uses_colon() {
        assert!(matches!(parse("@:'x'"), GrammarElement::Override(_, _)));
    }

    #[test]
    fn override_list_form_uses_plus_colon() {
        assert!(matches!(parse("@+:'x'"), GrammarElement::OverrideList(_, _)));
    }

    #[test]
    fn override_deprecated_bare_form_is_equivalent_to_scalar() {
        assert!(matches!(parse("@'x'"), GrammarElement::Override(_, _)));
    }
}
