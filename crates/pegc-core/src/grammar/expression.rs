//! `expression ::= sequence ('|' sequence)*` and `sequence ::= element+`.
//! Both accumulate into named AST slots (`options`, `elements`) that
//! [`crate::semantics::GrammarModelSemantics`] collapses into a single
//! element or a `Choice`/`Sequence`, matching the invariant that a `Choice`
//! always has at least two options and a lone-element sequence is
//! transparent.

use crate::ast::Node;
use crate::parser::{PResult, Parser};

use super::element::element;

pub(crate) fn expression(p: &mut Parser<'_>) -> PResult<Node> {
    p.call("expression", &|p: &mut Parser<'_>| {
        let first = sequence(p)?;
        p.ast_append("options", first);
        p.closure(|p: &mut Parser<'_>| -> PResult<Node> {
            p.token("|")?;
            let alt = sequence(p)?;
            p.ast_append("options", alt);
            Ok(Node::None)
        })?;
        Ok(Node::None)
    })
}

pub(crate) fn sequence(p: &mut Parser<'_>) -> PResult<Node> {
    p.call("sequence", &|p: &mut Parser<'_>| {
        let first = element(p)?;
        p.ast_append("elements", first);
        p.closure(|p: &mut Parser<'_>| -> PResult<Node> {
            let next = element(p)?;
            p.ast_append("elements", next);
            Ok(Node::None)
        })?;
        Ok(Node::None)
    })
}
