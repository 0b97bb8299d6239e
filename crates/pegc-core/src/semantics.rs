//! Semantic dispatch glue: rewriting a rule's raw AST into a typed value.
//!
//! The source pattern this generalizes is "look up a method named after a
//! rule on a supplied object and call it if present"
//! (`original_source/grako/parsing.py::_find_semantic_rule`, using
//! `getattr`). Re-expressed as a capability table: a [`Semantics`]
//! implementation exposes a pure, cheap `lookup` from rule name to handler;
//! absence of a handler is not an error, and a handler is invoked exactly
//! once per successful rule match, after the rule body returns and before
//! memoization stores the result.

use crate::ast::{AstNode, Node};
use crate::model::{Choice, GrammarElement, Grammar, Rule, Sequence};

/// A handler rewrites a rule's freshly-popped AST into a replacement value.
/// Handlers never see the buffer and must not consume input.
pub type Handler = fn(AstNode) -> Node;

pub trait Semantics {
    fn lookup(&self, rule: &str) -> Option<Handler>;
}

/// No handlers registered for any rule; every rule's result is its raw
/// [`AstNode`], wrapped in [`Node::Ast`].
pub struct NoSemantics;

impl Semantics for NoSemantics {
    fn lookup(&self, _rule: &str) -> Option<Handler> {
        None
    }
}

fn string_slot(ast: &AstNode, name: &str) -> String {
    ast.get(name)
        .and_then(|v| v.as_single())
        .and_then(Node::as_token)
        .unwrap_or_default()
        .to_string()
}

fn element_slot(ast: &AstNode, name: &str) -> Option<GrammarElement> {
    ast.get(name)
        .and_then(|v| v.as_single())
        .and_then(Node::as_element)
        .cloned()
}

fn element_list(ast: &AstNode, name: &str) -> Vec<GrammarElement> {
    match ast.get(name) {
        None => Vec::new(),
        Some(v) => v
            .as_list()
            .into_iter()
            .filter_map(Node::as_element)
            .cloned()
            .collect(),
    }
}

fn string_list(ast: &AstNode, name: &str) -> Vec<String> {
    match ast.get(name) {
        None => Vec::new(),
        Some(v) => v.as_list().into_iter().filter_map(Node::as_token).map(str::to_string).collect(),
    }
}

/// The handler table the grammar meta-parser registers by default: it
/// rewrites every production's [`AstNode`] into the matching
/// [`GrammarElement`] variant. This is the direct analog of
/// `original_source/grako/codegen/objectmodel.py`, which builds Python model
/// classes out of the same shaped ASTs; here the "classes" are enum variants
/// and the "constructor lookup" is a Rust `match` over the rule name.
pub struct GrammarModelSemantics;

impl Semantics for GrammarModelSemantics {
    fn lookup(&self, rule: &str) -> Option<Handler> {
        match rule {
            "grammar" => Some(grammar as Handler),
            "rule" => Some(rule_def as Handler),
            "expression" => Some(expression as Handler),
            "sequence" => Some(sequence as Handler),
            _ => None,
        }
    }
}

fn grammar(ast: AstNode) -> Node {
    let pos = ast.pos();
    let title = ast
        .get("title")
        .and_then(|v| v.as_single())
        .and_then(Node::as_token)
        .map(str::to_string);
    let directive_nodes: Vec<crate::model::Directive> = ast
        .get("directives")
        .map(|v| {
            v.as_list()
                .into_iter()
                .filter_map(|n| match n {
                    Node::Ast(inner) => Some(crate::model::Directive {
                        pos: inner.pos(),
                        name: string_slot(inner, "name"),
                        value: string_slot(inner, "value"),
                    }),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    let keywords = string_list(&ast, "keywords");
    let rules = element_list(&ast, "rules")
        .into_iter()
        .filter_map(|e| match e {
            GrammarElement::Rule(r) => Some(r),
            _ => None,
        })
        .collect();
    Node::Element(Box::new(GrammarElement::Grammar(Grammar {
        pos,
        title,
        directives: directive_nodes,
        keywords,
        rules,
    })))
}

fn rule_def(ast: AstNode) -> Node {
    let pos = ast.pos();
    let name = string_slot(&ast, "name");
    let decorators = string_list(&ast, "decorators");
    let params = string_list(&ast, "params");
    let kwparams = match ast.get("kwparams") {
        None => Vec::new(),
        Some(v) => v
            .as_list()
            .into_iter()
            .filter_map(|n| match n {
                Node::Ast(pair) => Some((string_slot(pair, "name"), string_slot(pair, "value"))),
                _ => None,
            })
            .collect(),
    };
    let base = ast
        .get("base")
        .and_then(|v| v.as_single())
        .and_then(Node::as_token)
        .map(str::to_string);
    let exp = element_slot(&ast, "exp").unwrap_or(GrammarElement::Void(pos));
    Node::Element(Box::new(GrammarElement::Rule(Rule {
        pos,
        decorators,
        name,
        params,
        kwparams,
        base,
        exp: Box::new(exp),
    })))
}

fn expression(ast: AstNode) -> Node {
    let pos = ast.pos();
    let options = element_list(&ast, "options");
    if options.len() == 1 {
        Node::Element(Box::new(options.into_iter().next().unwrap()))
    } else {
        Node::Element(Box::new(GrammarElement::Choice(Choice { pos, options })))
    }
}

fn sequence(ast: AstNode) -> Node {
    let pos = ast.pos();
    let elements = element_list(&ast, "elements");
    if elements.len() == 1 {
        Node::Element(Box::new(elements.into_iter().next().unwrap()))
    } else {
        Node::Element(Box::new(GrammarElement::Sequence(Sequence { pos, elements })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Pos;

    fn pos() -> Pos {
        Pos { offset: 0, line: 1, column: 1 }
    }

    #[test]
    fn rule_def_extracts_kwparams() {
        let mut kw = AstNode::new_at(pos());
        kw.set("name", Node::Token("sep".into()));
        kw.set("value", Node::Token(",".into()));
        let mut ast = AstNode::new_at(pos());
        ast.set("name", Node::Token("r".into()));
        ast.append("kwparams", Node::Ast(kw));
        ast.set("exp", Node::Element(Box::new(GrammarElement::Eof(pos()))));
        let node = rule_def(ast);
        let Node::Element(el) = node else { panic!("expected element") };
        let GrammarElement::Rule(rule) = *el else { panic!("expected rule") };
        assert_eq!(rule.kwparams, vec![("sep".to_string(), ",".to_string())]);
    }

    #[test]
    fn expression_with_one_option_is_transparent() {
        let mut ast = AstNode::new_at(pos());
        ast.append("options", Node::Element(Box::new(GrammarElement::Eof(pos()))));
        let node = expression(ast);
        assert!(matches!(node, Node::Element(boxed) if matches!(*boxed, GrammarElement::Eof(_))));
    }

    #[test]
    fn expression_with_two_options_builds_choice() {
        let mut ast = AstNode::new_at(pos());
        ast.append("options", Node::Element(Box::new(GrammarElement::Eof(pos()))));
        ast.append("options", Node::Element(Box::new(GrammarElement::Void(pos()))));
        let node = expression(ast);
        assert!(matches!(node, Node::Element(boxed) if matches!(*boxed, GrammarElement::Choice(_))));
    }
}
