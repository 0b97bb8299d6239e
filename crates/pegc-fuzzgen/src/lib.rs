//! Generates arbitrary, well-formed [`pegc_core::model::Grammar`] trees
//! driven by an [`arbitrary::Unstructured`] byte source.
//!
//! [`GrammarBuilder`] is an `Unstructured`-driven builder that accumulates a
//! pool of declared rule names up front so that every generated
//! `RuleRef`/`RuleInclude` always resolves, then recursively builds the
//! rest of the tree choosing among alternatives with
//! `u.int_in_range`/`u.ratio`.
//!
//! Two invariants the generator must maintain for the output to be useful to
//! `pegc-emit`'s round-trip fuzz target: a [`Choice`] always has at least
//! two options and a [`Sequence`] always has at least two elements, matching
//! the collapse the grammar meta-parser's own `expression`/`sequence`
//! semantics perform (`pegc_core::semantics`) — a generated tree that
//! violated this could never itself be produced by parsing the text
//! `pegc-emit` renders for it, breaking the round trip.

use arbitrary::{Result, Unstructured};

use pegc_core::model::{Choice, Directive, Grammar, GrammarElement, Rule, Sequence};
use pegc_core::Pos;

const CHARSET_LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_";
const CHARSET_ALNUM: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_";

/// A small whitelist of regex sources, rather than arbitrary regex syntax:
/// building a random string that is both a valid `regex` crate pattern and
/// free of an unescaped delimiter is its own fuzzing problem, orthogonal to
/// the one this crate exists for.
const PATTERNS: &[&str] = &["[a-z]+", "[0-9]+", r"\w+", "[A-Za-z_][A-Za-z0-9_]*", r"\s+"];

const DIRECTIVE_REGEX_NAMES: &[&str] = &["whitespace", "comments", "eol_comments"];
const DIRECTIVE_BOOL_NAMES: &[&str] = &["nameguard", "ignorecase", "left_recursion"];

fn zero_pos() -> Pos {
    Pos { offset: 0, line: 1, column: 1 }
}

/// Builds one arbitrary [`Grammar`], maintaining a fixed pool of rule names
/// so every generated `RuleRef`/`RuleInclude` resolves.
pub struct GrammarBuilder<'a> {
    u: &'a mut Unstructured<'a>,
    rule_names: Vec<String>,
}

impl<'a> GrammarBuilder<'a> {
    /// Pre-generates between 1 and 4 distinct rule names.
    pub fn new(u: &'a mut Unstructured<'a>) -> Result<Self> {
        let mut builder = GrammarBuilder { u, rule_names: Vec::new() };
        let count = 1 + builder.u.int_in_range(0..=3)?;
        while builder.rule_names.len() < count {
            let name = builder.identifier()?;
            if !builder.rule_names.contains(&name) {
                builder.rule_names.push(name);
            }
        }
        Ok(builder)
    }

    pub fn finish(mut self, max_depth: usize) -> Result<Grammar> {
        let title = if self.u.ratio(1u8, 2u8)? { Some(self.identifier()?) } else { None };
        let directives = self.arbitrary_directives()?;
        let keywords = self.arbitrary_keywords()?;
        let names = self.rule_names.clone();
        let mut rules = Vec::with_capacity(names.len());
        for name in names {
            let exp = self.arbitrary_expr(max_depth)?;
            rules.push(Rule {
                pos: zero_pos(),
                decorators: Vec::new(),
                name,
                params: Vec::new(),
                kwparams: Vec::new(),
                base: None,
                exp: Box::new(exp),
            });
        }
        Ok(Grammar { pos: zero_pos(), title, directives, keywords, rules })
    }

    fn arbitrary_directives(&mut self) -> Result<Vec<Directive>> {
        let count = self.u.int_in_range(0..=2)?;
        let mut directives = Vec::with_capacity(count);
        for _ in 0..count {
            let regex = self.u.ratio(1u8, 2u8)?;
            let name = if regex {
                DIRECTIVE_REGEX_NAMES[self.u.choose_index(DIRECTIVE_REGEX_NAMES.len())?]
            } else {
                DIRECTIVE_BOOL_NAMES[self.u.choose_index(DIRECTIVE_BOOL_NAMES.len())?]
            };
            let value = if regex {
                PATTERNS[self.u.choose_index(PATTERNS.len())?].to_string()
            } else if self.u.arbitrary::<bool>()? {
                "true".to_string()
            } else {
                "false".to_string()
            };
            directives.push(Directive { pos: zero_pos(), name: name.to_string(), value });
        }
        Ok(directives)
    }

    fn arbitrary_keywords(&mut self) -> Result<Vec<String>> {
        let count = self.u.int_in_range(0..=2)?;
        let mut keywords = Vec::with_capacity(count);
        for _ in 0..count {
            keywords.push(self.identifier()?);
        }
        Ok(keywords)
    }

    /// An `expression`-position tree: either a single sequence-position
    /// result, or a choice of at least two of them.
    fn arbitrary_expr(&mut self, depth: usize) -> Result<GrammarElement> {
        if depth == 0 || self.u.ratio(2u8, 3u8)? {
            return self.arbitrary_sequence_item(depth);
        }
        let count = 2 + self.u.int_in_range(0..=1)?;
        let mut options = Vec::with_capacity(count);
        for _ in 0..count {
            options.push(self.arbitrary_sequence_item(depth.saturating_sub(1))?);
        }
        Ok(GrammarElement::Choice(Choice { pos: zero_pos(), options }))
    }

    /// A `sequence`-position tree: either a single element, or a sequence of
    /// at least two of them.
    fn arbitrary_sequence_item(&mut self, depth: usize) -> Result<GrammarElement> {
        if depth == 0 || self.u.ratio(2u8, 3u8)? {
            return self.arbitrary_element(depth);
        }
        let count = 2 + self.u.int_in_range(0..=1)?;
        let mut elements = Vec::with_capacity(count);
        for _ in 0..count {
            elements.push(self.arbitrary_element(depth.saturating_sub(1))?);
        }
        Ok(GrammarElement::Sequence(Sequence { pos: zero_pos(), elements }))
    }

    /// An `element`-position tree: `rule_include | named | override | term`.
    fn arbitrary_element(&mut self, depth: usize) -> Result<GrammarElement> {
        match self.u.int_in_range(0..=4u8)? {
            0 => Ok(GrammarElement::RuleInclude(zero_pos(), self.existing_rule_name()?)),
            1 => {
                let name = self.identifier()?;
                let exp = Box::new(self.arbitrary_term(depth)?);
                if self.u.arbitrary::<bool>()? {
                    Ok(GrammarElement::NamedList(zero_pos(), name, exp))
                } else {
                    Ok(GrammarElement::Named(zero_pos(), name, exp))
                }
            }
            2 => {
                let exp = Box::new(self.arbitrary_term(depth)?);
                if self.u.arbitrary::<bool>()? {
                    Ok(GrammarElement::OverrideList(zero_pos(), exp))
                } else {
                    Ok(GrammarElement::Override(zero_pos(), exp))
                }
            }
            _ => self.arbitrary_term(depth),
        }
    }

    /// A `term`-position tree: everything `element` admits except
    /// `rule_include`/`named`/`override`, since those are not valid operands
    /// of `&`/`!`/`sep.{...}`.
    fn arbitrary_term(&mut self, depth: usize) -> Result<GrammarElement> {
        if depth == 0 {
            return self.arbitrary_atom();
        }
        match self.u.int_in_range(0..=7u8)? {
            0 => Ok(GrammarElement::EmptyClosure(zero_pos())),
            1 => {
                let exp = Box::new(self.arbitrary_expr(depth.saturating_sub(1))?);
                Ok(GrammarElement::Group(zero_pos(), exp))
            }
            2 => {
                let exp = Box::new(self.arbitrary_expr(depth.saturating_sub(1))?);
                if self.u.arbitrary::<bool>()? {
                    Ok(GrammarElement::PositiveClosure(zero_pos(), exp))
                } else {
                    Ok(GrammarElement::Closure(zero_pos(), exp))
                }
            }
            3 => {
                let exp = Box::new(self.arbitrary_expr(depth.saturating_sub(1))?);
                Ok(GrammarElement::Optional(zero_pos(), exp))
            }
            4 => Ok(GrammarElement::Special(zero_pos(), self.identifier()?)),
            5 => {
                let exp = Box::new(self.arbitrary_term(depth.saturating_sub(1))?);
                Ok(GrammarElement::Lookahead(zero_pos(), exp))
            }
            6 => {
                let exp = Box::new(self.arbitrary_term(depth.saturating_sub(1))?);
                Ok(GrammarElement::NegativeLookahead(zero_pos(), exp))
            }
            7 => {
                let sep = Box::new(self.arbitrary_atom()?);
                let exp = Box::new(self.arbitrary_expr(depth.saturating_sub(1))?);
                let positive = self.u.arbitrary::<bool>()?;
                Ok(GrammarElement::Join { pos: zero_pos(), sep, exp, positive })
            }
            _ => self.arbitrary_atom(),
        }
    }

    /// `cut | token | constant | rule_ref | pattern | eof`: the leaves of
    /// the tree, and the only forms valid as a `join`'s separator.
    fn arbitrary_atom(&mut self) -> Result<GrammarElement> {
        match self.u.int_in_range(0..=5u8)? {
            0 => Ok(GrammarElement::Cut(zero_pos())),
            1 => Ok(GrammarElement::Token(zero_pos(), self.literal_text()?)),
            2 => Ok(GrammarElement::Constant(zero_pos(), self.literal_text()?)),
            3 => Ok(GrammarElement::RuleRef(zero_pos(), self.existing_rule_name()?)),
            4 => {
                let pattern = PATTERNS[self.u.choose_index(PATTERNS.len())?];
                Ok(GrammarElement::Pattern(zero_pos(), pattern.to_string()))
            }
            _ => Ok(GrammarElement::Eof(zero_pos())),
        }
    }

    fn existing_rule_name(&mut self) -> Result<String> {
        let idx = self.u.choose_index(self.rule_names.len())?;
        Ok(self.rule_names[idx].clone())
    }

    /// `[A-Za-z_][A-Za-z0-9_]*`, 1-8 characters.
    fn identifier(&mut self) -> Result<String> {
        let len = 1 + self.u.int_in_range(0..=7)?;
        let mut name = String::with_capacity(len);
        name.push(*self.u.choose(CHARSET_LETTERS)? as char);
        for _ in 1..len {
            name.push(*self.u.choose(CHARSET_ALNUM)? as char);
        }
        Ok(name)
    }

    /// Plain alphanumeric text for a token/constant literal: no quote,
    /// backslash, or backtick, so it never needs escaping to round-trip.
    fn literal_text(&mut self) -> Result<String> {
        let len = 1 + self.u.int_in_range(0..=5)?;
        let mut text = String::with_capacity(len);
        for _ in 0..len {
            text.push(*self.u.choose(CHARSET_ALNUM)? as char);
        }
        Ok(text)
    }
}

/// Build one arbitrary grammar from `u`, recursing at most `4` levels deep
/// into any single rule's expression tree.
pub fn arbitrary_grammar(u: &mut Unstructured<'_>) -> Result<Grammar> {
    const MAX_DEPTH: usize = 4;
    GrammarBuilder::new(u)?.finish(MAX_DEPTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbitrary::Unstructured;

    #[test]
    fn generates_a_grammar_with_at_least_one_rule() {
        let data = vec![7u8; 4096];
        let mut u = Unstructured::new(&data);
        let grammar = arbitrary_grammar(&mut u).unwrap();
        assert!(!grammar.rules.is_empty());
    }

    #[test]
    fn generated_grammars_round_trip_through_emit() {
        let data: Vec<u8> = (0..4096).map(|i| (i * 37 % 251) as u8).collect();
        let mut u = Unstructured::new(&data);
        for _ in 0..8 {
            let grammar = match arbitrary_grammar(&mut u) {
                Ok(g) => g,
                Err(_) => break,
            };
            let text = pegc_emit::emit(&grammar);
            pegc_core::parse_grammar_source(&text)
                .unwrap_or_else(|e| panic!("generated grammar did not reparse: {e}\n{text}"));
        }
    }
}
