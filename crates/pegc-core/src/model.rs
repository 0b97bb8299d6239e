//! The grammar object model: tagged variants for every grammar element the
//! meta-parser can produce.
//!
//! Rules reference each other by name (`RuleRef`/`RuleInclude`) rather than by
//! pointer, so that the cyclic rule graph lives in a flat, name-indexed table
//! ([`Grammar::rule`]) instead of requiring `Rc`/`Weak` ownership knots.

use serde::Serialize;

use crate::buffer::Pos;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Directive {
    pub pos: Pos,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub pos: Pos,
    pub decorators: Vec<String>,
    pub name: String,
    pub params: Vec<String>,
    pub kwparams: Vec<(String, String)>,
    pub base: Option<String>,
    pub exp: Box<GrammarElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grammar {
    pub pos: Pos,
    pub title: Option<String>,
    pub directives: Vec<Directive>,
    pub keywords: Vec<String>,
    pub rules: Vec<Rule>,
}

impl Grammar {
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// All `RuleRef`/`RuleInclude` names reachable from this grammar, with
    /// their positions, for reference-resolution validation (implemented
    /// downstream in `pegc-compiler`).
    pub fn referenced_rule_names(&self) -> Vec<(&str, Pos)> {
        let mut out = Vec::new();
        for rule in &self.rules {
            rule.exp.walk(&mut |el| match el {
                GrammarElement::RuleRef(pos, name) | GrammarElement::RuleInclude(pos, name) => {
                    out.push((name.as_str(), *pos));
                }
                _ => {}
            });
        }
        out
    }
}

/// Ordered choice of alternatives; always has at least two options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choice {
    pub pos: Pos,
    pub options: Vec<GrammarElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sequence {
    pub pos: Pos,
    pub elements: Vec<GrammarElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GrammarElement {
    Grammar(Grammar),
    Rule(Rule),
    Choice(Choice),
    Sequence(Sequence),
    Closure(Pos, Box<GrammarElement>),
    PositiveClosure(Pos, Box<GrammarElement>),
    EmptyClosure(Pos),
    Optional(Pos, Box<GrammarElement>),
    Group(Pos, Box<GrammarElement>),
    /// `sep.{exp}` / `sep.{exp}+`; `positive` mirrors `PositiveClosure` vs `Closure`.
    Join {
        pos: Pos,
        sep: Box<GrammarElement>,
        exp: Box<GrammarElement>,
        positive: bool,
    },
    Lookahead(Pos, Box<GrammarElement>),
    NegativeLookahead(Pos, Box<GrammarElement>),
    Token(Pos, String),
    Pattern(Pos, String),
    Constant(Pos, String),
    RuleRef(Pos, String),
    RuleInclude(Pos, String),
    Named(Pos, String, Box<GrammarElement>),
    NamedList(Pos, String, Box<GrammarElement>),
    Override(Pos, Box<GrammarElement>),
    OverrideList(Pos, Box<GrammarElement>),
    Cut(Pos),
    Void(Pos),
    Special(Pos, String),
    Eof(Pos),
}

impl GrammarElement {
    pub fn pos(&self) -> Pos {
        match self {
            GrammarElement::Grammar(g) => g.pos,
            GrammarElement::Rule(r) => r.pos,
            GrammarElement::Choice(c) => c.pos,
            GrammarElement::Sequence(s) => s.pos,
            GrammarElement::Closure(p, _)
            | GrammarElement::PositiveClosure(p, _)
            | GrammarElement::EmptyClosure(p)
            | GrammarElement::Optional(p, _)
            | GrammarElement::Group(p, _)
            | GrammarElement::Join { pos: p, .. }
            | GrammarElement::Lookahead(p, _)
            | GrammarElement::NegativeLookahead(p, _)
            | GrammarElement::Token(p, _)
            | GrammarElement::Pattern(p, _)
            | GrammarElement::Constant(p, _)
            | GrammarElement::RuleRef(p, _)
            | GrammarElement::RuleInclude(p, _)
            | GrammarElement::Named(p, _, _)
            | GrammarElement::NamedList(p, _, _)
            | GrammarElement::Override(p, _)
            | GrammarElement::OverrideList(p, _)
            | GrammarElement::Cut(p)
            | GrammarElement::Void(p)
            | GrammarElement::Special(p, _)
            | GrammarElement::Eof(p) => *p,
        }
    }

    /// Visit this element and every element reachable from it (pre-order).
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a GrammarElement)) {
        visit(self);
        match self {
            GrammarElement::Grammar(g) => {
                for rule in &g.rules {
                    rule.exp.walk(visit);
                }
            }
            GrammarElement::Rule(r) => r.exp.walk(visit),
            GrammarElement::Choice(c) => {
                for opt in &c.options {
                    opt.walk(visit);
                }
            }
            GrammarElement::Sequence(s) => {
                for el in &s.elements {
                    el.walk(visit);
                }
            }
            GrammarElement::Closure(_, e)
            | GrammarElement::PositiveClosure(_, e)
            | GrammarElement::Optional(_, e)
            | GrammarElement::Group(_, e)
            | GrammarElement::Lookahead(_, e)
            | GrammarElement::NegativeLookahead(_, e)
            | GrammarElement::Named(_, _, e)
            | GrammarElement::NamedList(_, _, e)
            | GrammarElement::Override(_, e)
            | GrammarElement::OverrideList(_, e) => e.walk(visit),
            GrammarElement::Join { sep, exp, .. } => {
                sep.walk(visit);
                exp.walk(visit);
            }
            GrammarElement::EmptyClosure(_)
            | GrammarElement::Token(_, _)
            | GrammarElement::Pattern(_, _)
            | GrammarElement::Constant(_, _)
            | GrammarElement::RuleRef(_, _)
            | GrammarElement::RuleInclude(_, _)
            | GrammarElement::Cut(_)
            | GrammarElement::Void(_)
            | GrammarElement::Special(_, _)
            | GrammarElement::Eof(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p() -> Pos {
        Pos { offset: 0, line: 1, column: 1 }
    }

    #[test]
    fn referenced_rule_names_collects_refs_and_includes() {
        let grammar = Grammar {
            pos: p(),
            title: None,
            directives: vec![],
            keywords: vec![],
            rules: vec![Rule {
                pos: p(),
                decorators: vec![],
                name: "start".into(),
                params: vec![],
                kwparams: vec![],
                base: None,
                exp: Box::new(GrammarElement::Sequence(Sequence {
                    pos: p(),
                    elements: vec![
                        GrammarElement::RuleRef(p(), "expr".into()),
                        GrammarElement::RuleInclude(p(), "common".into()),
                    ],
                })),
            }],
        };
        let refs: Vec<&str> = grammar
            .referenced_rule_names()
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(refs, vec!["expr", "common"]);
    }
}
