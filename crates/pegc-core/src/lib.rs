//! A packrat PEG parsing runtime and grammar-description-language
//! meta-parser.
//!
//! [`parser`] is the generic combinator runtime any hand-written or
//! generated rule method is built from: token/pattern matching, ordered
//! choice, closures, cut, packrat memoization, and a bounded
//! left-recursion fixpoint. [`grammar`] is one concrete client of that
//! runtime — a meta-parser, built entirely out of [`parser::Parser`]
//! primitives, that recognizes the toolkit's own grammar description
//! language and yields a [`model::Grammar`] tree.

pub mod ast;
pub mod buffer;
pub mod error;
pub mod grammar;
pub mod model;
pub mod parser;
pub mod semantics;

pub use ast::{AstNode, Node};
pub use buffer::{Buffer, BufferConfig, Pos};
pub use error::ParseError;
pub use model::Grammar;
pub use parser::{Parser, ParserConfig};
pub use semantics::{GrammarModelSemantics, NoSemantics, Semantics};

/// Parse `text` as a grammar-description-language source and return the
/// resulting [`model::Grammar`] tree. This is the single convenience entry
/// point analogous to `apollo_parser::Parser::new(input).parse()`: it wires
/// the meta-parser up to [`GrammarModelSemantics`], runs the `grammar` rule
/// to [`buffer::Buffer::at_end`], and unwraps the result into the object
/// model rather than the bare [`ast::Node`] the runtime itself returns.
pub fn parse_grammar_source(text: &str) -> Result<model::Grammar, ParseError> {
    let semantics = GrammarModelSemantics;
    let mut config = ParserConfig::default();
    config.buffer.comments_re = Some(r"\(\*(.|\n)*?\*\)".to_string());
    config.buffer.eol_comments_re = Some(r"#([^\n]*?)$".to_string());
    let mut parser = Parser::new(text, config, &semantics);
    let node = grammar::grammar(&mut parser)?;
    match node {
        Node::Element(boxed) => match *boxed {
            model::GrammarElement::Grammar(g) => Ok(g),
            other => Err(ParseError::Semantic {
                message: format!("grammar rule produced a non-Grammar element: {other:?}"),
                pos: parser.pos(),
                rule_stack: Vec::new(),
            }),
        },
        other => Err(ParseError::Semantic {
            message: format!("grammar rule produced a non-element node: {other:?}"),
            pos: parser.pos(),
            rule_stack: Vec::new(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_grammar() {
        let grammar = parse_grammar_source("GRAKO start = 'a' ; ").unwrap();
        assert_eq!(grammar.title.as_deref(), Some("GRAKO"));
        assert_eq!(grammar.rules.len(), 1);
        assert_eq!(grammar.rules[0].name, "start");
    }
}
