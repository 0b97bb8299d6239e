//! Renders a [`pegc_core::model::Grammar`] back to grammar-description-
//! language text.
//!
//! This is the inverse of `pegc_core::grammar::grammar`: given a `Grammar`
//! tree, produce source text that, re-parsed, yields a structurally
//! equivalent tree (modulo source positions). It exists to support a
//! round-trip testable property and the fuzzing harness in
//! `pegc-fuzzgen`/`fuzz/fuzz_targets/roundtrip.rs`; it is explicitly not a
//! code generator for target-language object-model classes.
//!
//! One recursive `fmt::Display` impl over [`GrammarElement`] does the
//! rendering, since the grammar-description language's concrete syntax does
//! not vary enough per node kind to warrant one file each.

use std::fmt;

use pegc_core::model::{Directive, Grammar, GrammarElement, Rule};

/// Render `grammar` back to grammar-description-language source text.
pub fn emit(grammar: &Grammar) -> String {
    format!("{}", GrammarPrinter(grammar))
}

struct GrammarPrinter<'a>(&'a Grammar);

impl fmt::Display for GrammarPrinter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grammar = self.0;
        if let Some(title) = &grammar.title {
            writeln!(f, "{title}")?;
        }
        for directive in &grammar.directives {
            writeln!(f, "{}", DirectivePrinter(directive))?;
        }
        if !grammar.keywords.is_empty() {
            writeln!(f, "@@keyword :: {}", grammar.keywords.join(" "))?;
        }
        for rule in &grammar.rules {
            writeln!(f, "{}", RulePrinter(rule))?;
        }
        Ok(())
    }
}

struct DirectivePrinter<'a>(&'a Directive);

impl fmt::Display for DirectivePrinter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Directive { name, value, .. } = self.0;
        match name.as_str() {
            "comments" | "eol_comments" | "whitespace" => {
                write!(f, "@@{name} :: {}", delimited_regex(value))
            }
            _ => write!(f, "@@{name} :: {value}"),
        }
    }
}

struct RulePrinter<'a>(&'a Rule);

impl fmt::Display for RulePrinter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = self.0;
        for decorator in &rule.decorators {
            writeln!(f, "@{decorator}")?;
        }
        write!(f, "{}", rule.name)?;
        if !rule.params.is_empty() || !rule.kwparams.is_empty() {
            let positional = rule.params.iter().map(|p| literal_like(p));
            let keyword = rule
                .kwparams
                .iter()
                .map(|(name, value)| format!("{name}={}", literal_like(value)));
            let args: Vec<String> = positional.chain(keyword).collect();
            write!(f, "({})", args.join(", "))?;
        }
        if let Some(base) = &rule.base {
            write!(f, " < {base}")?;
        }
        write!(f, " = {} ;", ExprPrinter(&rule.exp))
    }
}

/// An expression-position operand: may be a bare `Choice`/`Sequence`,
/// rendered with `|`/juxtaposition respectively and no extra parens (the
/// grammar production this came from — `rule`, `group`, `optional`,
/// `closure` — always surrounds its operand with its own delimiters).
struct ExprPrinter<'a>(&'a GrammarElement);

impl fmt::Display for ExprPrinter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            GrammarElement::Choice(choice) => {
                let rendered: Vec<String> =
                    choice.options.iter().map(|o| format!("{}", ExprPrinter(o))).collect();
                write!(f, "{}", rendered.join(" | "))
            }
            GrammarElement::Sequence(seq) => {
                let rendered: Vec<String> =
                    seq.elements.iter().map(|e| format!("{}", TermPrinter(e))).collect();
                write!(f, "{}", rendered.join(" "))
            }
            other => write!(f, "{}", TermPrinter(other)),
        }
    }
}

/// A term-position operand (the argument of `&`/`!`): a bare `Choice` or
/// `Sequence` here would not round-trip (the grammar's `term` production
/// does not admit them directly), so it is wrapped in `( ... )`, which is
/// exactly what [`GrammarElement::Group`] already renders as.
struct TermPrinter<'a>(&'a GrammarElement);

impl fmt::Display for TermPrinter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            GrammarElement::Choice(_) | GrammarElement::Sequence(_) => {
                write!(f, "({})", ExprPrinter(self.0))
            }
            other => write!(f, "{}", ElementPrinter(other)),
        }
    }
}

struct ElementPrinter<'a>(&'a GrammarElement);

impl fmt::Display for ElementPrinter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            GrammarElement::Grammar(g) => write!(f, "{}", GrammarPrinter(g)),
            GrammarElement::Rule(r) => write!(f, "{}", RulePrinter(r)),
            GrammarElement::Choice(_) | GrammarElement::Sequence(_) => {
                write!(f, "({})", ExprPrinter(self.0))
            }
            GrammarElement::Closure(_, exp) => write!(f, "{{{}}}", ExprPrinter(exp)),
            GrammarElement::PositiveClosure(_, exp) => write!(f, "{{{}}}+", ExprPrinter(exp)),
            GrammarElement::EmptyClosure(_) => write!(f, "()"),
            GrammarElement::Optional(_, exp) => write!(f, "[{}]", ExprPrinter(exp)),
            GrammarElement::Group(_, exp) => write!(f, "({})", ExprPrinter(exp)),
            GrammarElement::Join { sep, exp, positive, .. } => {
                write!(f, "{}.{{{}}}", TermPrinter(sep), ExprPrinter(exp))?;
                if *positive {
                    write!(f, "+")?;
                }
                Ok(())
            }
            GrammarElement::Lookahead(_, exp) => write!(f, "&{}", TermPrinter(exp)),
            GrammarElement::NegativeLookahead(_, exp) => write!(f, "!{}", TermPrinter(exp)),
            GrammarElement::Token(_, text) => write!(f, "{}", quoted(text, '"')),
            GrammarElement::Pattern(_, source) => write!(f, "{}", delimited_regex(source)),
            GrammarElement::Constant(_, text) => write!(f, "`{}`", escape(text, '`')),
            GrammarElement::RuleRef(_, name) => write!(f, "{name}"),
            GrammarElement::RuleInclude(_, name) => write!(f, "> {name}"),
            GrammarElement::Named(_, name, exp) => write!(f, "{name}:{}", TermPrinter(exp)),
            GrammarElement::NamedList(_, name, exp) => write!(f, "{name}+:{}", TermPrinter(exp)),
            GrammarElement::Override(_, exp) => write!(f, "@:{}", TermPrinter(exp)),
            GrammarElement::OverrideList(_, exp) => write!(f, "@+:{}", TermPrinter(exp)),
            GrammarElement::Cut(_) => write!(f, "~"),
            GrammarElement::Void(_) => write!(f, "()"),
            GrammarElement::Special(_, text) => write!(f, "?({text})?"),
            GrammarElement::Eof(_) => write!(f, "$"),
        }
    }
}

fn quoted(text: &str, delim: char) -> String {
    format!("{delim}{}{delim}", escape(text, delim))
}

fn escape(text: &str, delim: char) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == delim || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `/source/`, or the balanced `?/source/?` form when `source` itself
/// contains an unescaped `/` that the plain delimiter can't carry.
fn delimited_regex(source: &str) -> String {
    if source.contains('/') {
        format!("?/{source}/?")
    } else {
        format!("/{source}/")
    }
}

/// Render a rule-parameter value as whichever `literal` alternative
/// (string/hex/float/word/int) reproduces it verbatim, preferring the
/// unquoted forms so a plain identifier or number round-trips without
/// gaining quotes it never had.
fn literal_like(value: &str) -> String {
    let is_word = !value.is_empty()
        && value.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    let is_int = !value.is_empty() && value.chars().all(|c| c.is_ascii_digit());
    let is_hex = value.len() > 2
        && value.starts_with("0x")
        && value[2..].chars().all(|c| c.is_ascii_hexdigit());
    let is_float = value.parse::<f64>().is_ok() && value.contains('.');
    if is_word || is_int || is_hex || is_float {
        value.to_string()
    } else {
        quoted(value, '"')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_minimal_grammar() {
        let grammar = pegc_core::parse_grammar_source("GRAKO start = 'a' ; ").unwrap();
        let text = emit(&grammar);
        let reparsed = pegc_core::parse_grammar_source(&text).unwrap();
        assert_eq!(reparsed.title, grammar.title);
        assert_eq!(reparsed.rules.len(), grammar.rules.len());
        assert_eq!(reparsed.rules[0].name, grammar.rules[0].name);
    }

    #[test]
    fn round_trips_choice_and_closure() {
        let source = "r = {'a'}+ | [/b+/] ;";
        let grammar = pegc_core::parse_grammar_source(source).unwrap();
        let text = emit(&grammar);
        let reparsed = pegc_core::parse_grammar_source(&text).unwrap();
        assert_eq!(reparsed.rules[0].name, "r");
        assert!(matches!(*reparsed.rules[0].exp, pegc_core::model::GrammarElement::Choice(_)));
    }

    #[test]
    fn round_trips_lookahead_over_a_sequence() {
        let source = "r = &('a' 'b') 'c' ;";
        let grammar = pegc_core::parse_grammar_source(source).unwrap();
        let text = emit(&grammar);
        let reparsed = pegc_core::parse_grammar_source(&text).unwrap();
        assert_eq!(reparsed.rules[0].name, "r");
    }

    #[test]
    fn escapes_quotes_inside_tokens() {
        let mut el = GrammarElement::Token(
            pegc_core::Pos { offset: 0, line: 1, column: 1 },
            "a\"b".to_string(),
        );
        assert_eq!(format!("{}", ElementPrinter(&el)), r#""a\"b""#);
        el = GrammarElement::Pattern(
            pegc_core::Pos { offset: 0, line: 1, column: 1 },
            "a/b".to_string(),
        );
        assert_eq!(format!("{}", ElementPrinter(&el)), "?/a/b/?");
    }
}
