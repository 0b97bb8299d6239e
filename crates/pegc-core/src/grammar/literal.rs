//! `literal ::= string | word | hex | float | int`.
//!
//! These productions return their raw matched text as a bare [`Node::Token`]
//! rather than a [`crate::model::GrammarElement`] — they are building blocks
//! other productions (directive values, rule params, the text inside a
//! quoted token) compose, not grammar elements in their own right.

use crate::ast::Node;
use crate::parser::{PResult, Parser};

/// `"..."` or `'...'`, escapes allowed, no embedded newline. Returns the
/// text between the delimiters, with `\"`/`\\`/`\'` unescaped.
pub(crate) fn string(p: &mut Parser<'_>) -> PResult<Node> {
    p.call("string", &|p: &mut Parser<'_>| {
        let raw = p.choice::<Node>(&[
            &|p: &mut Parser<'_>| p.pattern(r#""(?:\\.|[^"\\\n])*""#),
            &|p: &mut Parser<'_>| p.pattern(r"'(?:\\.|[^'\\\n])*'"),
        ])?;
        let text = raw.as_token().unwrap_or_default();
        let inner = &text[1..text.len() - 1];
        Ok(Node::Token(unescape(inner)))
    })
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// A bare identifier: `[A-Za-z_][A-Za-z0-9_]*`.
pub(crate) fn word(p: &mut Parser<'_>) -> PResult<Node> {
    p.call("word", &|p: &mut Parser<'_>| p.pattern(r"[A-Za-z_][A-Za-z0-9_]*"))
}

pub(crate) fn hex(p: &mut Parser<'_>) -> PResult<Node> {
    p.call("hex", &|p: &mut Parser<'_>| p.pattern(r"0[xX][0-9a-fA-F]+"))
}

pub(crate) fn float(p: &mut Parser<'_>) -> PResult<Node> {
    p.call("float", &|p: &mut Parser<'_>| p.pattern(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?"))
}

pub(crate) fn int(p: &mut Parser<'_>) -> PResult<Node> {
    p.call("int", &|p: &mut Parser<'_>| p.pattern(r"[0-9]+"))
}

/// `/regex/` with a terminating `/`, or the balanced `?/regex/?` form used
/// when the pattern itself needs to contain an unescaped `/`. Returns the
/// regex source with delimiters stripped.
pub(crate) fn regex(p: &mut Parser<'_>) -> PResult<Node> {
    p.call("regex", &|p: &mut Parser<'_>| {
        let raw = p.choice::<Node>(&[
            &|p: &mut Parser<'_>| p.pattern(r"\?/.*?/\?"),
            &|p: &mut Parser<'_>| p.pattern(r"/(?:\\.|[^/\\\n])*/"),
        ])?;
        let text = raw.as_token().unwrap_or_default();
        let inner = if let Some(stripped) = text.strip_prefix("?/") {
            stripped.strip_suffix("/?").unwrap_or(stripped)
        } else {
            &text[1..text.len() - 1]
        };
        Ok(Node::Token(inner.to_string()))
    })
}

/// `string | word | hex | float | int`, tried in that order so that the
/// more specific numeric forms are not shadowed by a plain `int` match.
pub(crate) fn literal(p: &mut Parser<'_>) -> PResult<Node> {
    p.call("literal", &|p: &mut Parser<'_>| {
        p.choice::<Node>(&[
            &|p: &mut Parser<'_>| string(p),
            &|p: &mut Parser<'_>| hex(p),
            &|p: &mut Parser<'_>| float(p),
            &|p: &mut Parser<'_>| word(p),
            &|p: &mut Parser<'_>| int(p),
        ])
    })
}
