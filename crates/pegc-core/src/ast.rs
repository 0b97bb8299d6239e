//! The per-rule key→value slot accumulator ("AST node").
//!
//! An [`AstNode`] is pushed when a rule begins, populated by `set`/`append`
//! calls made from the rule body, and popped when the rule ends; the popped
//! node becomes the rule's result unless a semantic handler replaces it. The
//! anonymous slot `@` is the default accumulator used by bare (unnamed) rule
//! results and by `@:`/`@+:` overrides.

use serde::Serialize;

use crate::buffer::Pos;
use crate::model::GrammarElement;

/// Name of the anonymous default slot.
pub const DEFAULT_SLOT: &str = "@";

/// A single value produced by a combinator: raw matched text, a nested rule
/// result that hasn't been rewritten by a semantic handler, a rule result
/// that *has* been rewritten into a grammar-model element, or a marker
/// wrapping the items produced by a repetition (closure/positive-closure/
/// join) so that `append` can decide whether to flatten it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Node {
    /// No value; the result of `AstNode::define` defaulting an absent slot.
    None,
    /// Raw text consumed by a `token`/`pattern`/`constant` primitive.
    Token(String),
    /// An unrewritten rule result (no semantic handler registered for it).
    Ast(AstNode),
    /// A rule result after semantic rewriting into the grammar object model.
    Element(Box<GrammarElement>),
    /// The items collected by one repetition combinator.
    Repeated(Vec<Node>),
}

impl Node {
    pub fn as_token(&self) -> Option<&str> {
        match self {
            Node::Token(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&GrammarElement> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }
}

/// Either a single item or an ordered sequence of items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Single(Node),
    List(Vec<Node>),
}

impl Value {
    pub fn as_single(&self) -> Option<&Node> {
        match self {
            Value::Single(n) => Some(n),
            Value::List(items) => items.first(),
        }
    }

    pub fn as_list(&self) -> Vec<&Node> {
        match self {
            Value::Single(n) => vec![n],
            Value::List(items) => items.iter().collect(),
        }
    }
}

/// Mapping from name to [`Value`], with insertion order preserved the way a
/// Python `dict` (which the original `grako` AST relies on) would.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AstNode {
    /// Position at which the owning rule began, for semantic handlers that
    /// need to stamp a [`GrammarElement`] with a source location.
    pos: Pos,
    slots: Vec<(String, Value)>,
}

impl Default for AstNode {
    fn default() -> Self {
        AstNode::new_at(Pos { offset: 0, line: 1, column: 1 })
    }
}

impl AstNode {
    pub fn new() -> Self {
        AstNode::default()
    }

    pub fn new_at(pos: Pos) -> Self {
        AstNode { pos, slots: Vec::new() }
    }

    pub fn pos(&self) -> Pos {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.slots.iter_mut().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Overwrite semantics: a first `set` stores a single value; a second
    /// `set` on the same name promotes the slot to a list holding the prior
    /// value followed by the new one; further `set`s keep extending that
    /// list.
    pub fn set(&mut self, name: &str, value: Node) {
        match self.slot_mut(name) {
            None => self.slots.push((name.to_string(), Value::Single(value))),
            Some(slot) => Self::promote_and_push(slot, value),
        }
    }

    /// Append semantics: always grows an ordered list under `name`. When the
    /// newly produced value is itself a [`Node::Repeated`] marker (i.e. the
    /// result of a closure/positive-closure/join), its items are flattened
    /// into the list; any other value is nested as a single element. This
    /// resolves the flatten-vs-nest ambiguity in how a repetition's result
    /// should compose with an enclosing list slot.
    pub fn append(&mut self, name: &str, value: Node) {
        let items: Vec<Node> = match value {
            Node::Repeated(items) => items,
            other => vec![other],
        };
        match self.slot_mut(name) {
            None => self.slots.push((name.to_string(), Value::List(items))),
            Some(Value::List(existing)) => existing.extend(items),
            Some(slot @ Value::Single(_)) => {
                let Value::Single(prior) = std::mem::replace(slot, Value::List(Vec::new())) else {
                    unreachable!()
                };
                let mut merged = vec![prior];
                merged.extend(items);
                *slot = Value::List(merged);
            }
        }
    }

    fn promote_and_push(slot: &mut Value, value: Node) {
        match slot {
            Value::List(items) => items.push(value),
            Value::Single(_) => {
                let Value::Single(prior) = std::mem::replace(slot, Value::List(Vec::new())) else {
                    unreachable!()
                };
                *slot = Value::List(vec![prior, value]);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.slots.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Ensure every listed name exists, defaulting absent ones to
    /// [`Node::None`], so that downstream consumers see a stable shape
    /// regardless of which alternative fired.
    pub fn define(&mut self, required: &[&str], optional: &[&str]) {
        for name in required.iter().chain(optional.iter()) {
            if self.get(name).is_none() {
                self.set(name, Node::None);
            }
        }
    }

    /// The contents of the default slot (`@`), used when a rule returns a
    /// single unnamed result.
    pub fn result(&self) -> Option<&Value> {
        self.get(DEFAULT_SLOT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_set_promotes_to_list() {
        let mut ast = AstNode::new();
        ast.set("x", Node::Token("a".into()));
        ast.set("x", Node::Token("b".into()));
        assert_eq!(
            ast.get("x"),
            Some(&Value::List(vec![Node::Token("a".into()), Node::Token("b".into())]))
        );
    }

    #[test]
    fn append_always_grows_a_list() {
        let mut ast = AstNode::new();
        ast.append("xs", Node::Token("a".into()));
        ast.append("xs", Node::Token("b".into()));
        assert_eq!(
            ast.get("xs"),
            Some(&Value::List(vec![Node::Token("a".into()), Node::Token("b".into())]))
        );
    }

    #[test]
    fn append_flattens_repeated_marker() {
        let mut ast = AstNode::new();
        ast.append(
            "xs",
            Node::Repeated(vec![Node::Token("a".into()), Node::Token("b".into())]),
        );
        assert_eq!(
            ast.get("xs"),
            Some(&Value::List(vec![Node::Token("a".into()), Node::Token("b".into())]))
        );
    }

    #[test]
    fn append_nests_non_repeated_single_values() {
        let mut ast = AstNode::new();
        ast.append("xs", Node::Token("a".into()));
        assert_eq!(ast.get("xs"), Some(&Value::List(vec![Node::Token("a".into())])));
    }

    #[test]
    fn define_defaults_absent_names() {
        let mut ast = AstNode::new();
        ast.set("present", Node::Token("v".into()));
        ast.define(&["present", "missing"], &["also_missing"]);
        assert_eq!(ast.get("present"), Some(&Value::Single(Node::Token("v".into()))));
        assert_eq!(ast.get("missing"), Some(&Value::Single(Node::None)));
        assert_eq!(ast.get("also_missing"), Some(&Value::Single(Node::None)));
    }
}
