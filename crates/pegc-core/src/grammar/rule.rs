//! `directive`, `rule`, and the top-level `grammar` production:
//!
//! ```text
//! grammar    ::= title? directive* keyword_decl* rule+ $
//! directive  ::= '@@' name '::' value
//! keyword_decl ::= '@@' 'keyword' '::' word+
//! rule       ::= decorator* name params? ('<' base)? '=' expression ';'
//! ```
//!
//! `keyword_decl`'s concrete syntax is modeled here as its own
//! `@@keyword :: word+` directive-shaped form, matching the grammar
//! description language's own self-hosted parser; the decision is recorded
//! in the project's design notes.

use crate::ast::{AstNode, Node};
use crate::parser::{PResult, Parser};

use super::expression::expression;
use super::literal::{regex, word};

pub fn grammar(p: &mut Parser<'_>) -> PResult<Node> {
    p.call("grammar", &|p: &mut Parser<'_>| {
        if let Some(title) = title(p)? {
            p.ast_set("title", Node::Token(title));
        }
        p.closure(|p: &mut Parser<'_>| -> PResult<Node> {
            let d = directive(p)?;
            p.ast_append("directives", d);
            Ok(Node::None)
        })?;
        p.closure(|p: &mut Parser<'_>| -> PResult<Node> {
            let kd = keyword_decl(p)?;
            flatten_into(p, "keywords", &kd);
            Ok(Node::None)
        })?;
        let first_rule = rule(p)?;
        p.ast_append("rules", first_rule);
        p.closure(|p: &mut Parser<'_>| -> PResult<Node> {
            let r = rule(p)?;
            p.ast_append("rules", r);
            Ok(Node::None)
        })?;
        p.eof()?;
        Ok(Node::None)
    })
}

/// An optional leading bare word, distinguished from the first rule's name
/// by a following `=`: `GRAKO start = 'a';` has title `GRAKO`, while
/// `start = 'a';` alone has none.
fn title(p: &mut Parser<'_>) -> PResult<Option<String>> {
    p.optional(|p: &mut Parser<'_>| {
        let w = word(p)?;
        p.negative_lookahead(|p: &mut Parser<'_>| p.token("="))?;
        Ok(w.as_token().unwrap_or_default().to_string())
    })
}

fn directive(p: &mut Parser<'_>) -> PResult<Node> {
    p.call("directive", &|p: &mut Parser<'_>| {
        p.token("@@")?;
        // `@@keyword :: word+` is its own production below, not a directive
        // with a single-word value; without this exclusion the generic
        // fallback branch below would swallow just the first word of a
        // keyword_decl and leave the rest dangling in the input.
        p.negative_lookahead(|p: &mut Parser<'_>| p.token("keyword"))?;
        let name = word(p)?;
        let name = name.as_token().unwrap_or_default().to_string();
        p.token("::")?;
        let value = match name.as_str() {
            "comments" | "eol_comments" | "whitespace" => {
                regex(p)?.as_token().unwrap_or_default().to_string()
            }
            "nameguard" | "ignorecase" | "left_recursion" => {
                match p.optional(|p: &mut Parser<'_>| word(p))? {
                    Some(w) => w.as_token().unwrap_or("true").to_string(),
                    None => "true".to_string(),
                }
            }
            _ => word(p)?.as_token().unwrap_or_default().to_string(),
        };
        p.ast_set("name", Node::Token(name));
        p.ast_set("value", Node::Token(value));
        Ok(Node::None)
    })
}

fn keyword_decl(p: &mut Parser<'_>) -> PResult<Node> {
    p.call("keyword_decl", &|p: &mut Parser<'_>| {
        p.token("@@")?;
        p.token("keyword")?;
        p.token("::")?;
        let first = word(p)?;
        p.ast_append("keywords", first);
        p.closure(|p: &mut Parser<'_>| -> PResult<Node> {
            let w = word(p)?;
            p.ast_append("keywords", w);
            Ok(Node::None)
        })?;
        Ok(Node::None)
    })
}

/// Copy every item out of `slot` on a plain (handler-less) `Node::Ast`
/// result into the enclosing rule's own slot of the same name.
fn flatten_into(p: &mut Parser<'_>, slot: &str, node: &Node) {
    if let Node::Ast(ast) = node {
        if let Some(value) = ast.get(slot) {
            for item in value.as_list() {
                p.ast_append(slot, item.clone());
            }
        }
    }
}

fn decorator(p: &mut Parser<'_>) -> PResult<Node> {
    p.token("@")?;
    p.choice::<Node>(&[&|p: &mut Parser<'_>| p.token("override"), &|p: &mut Parser<'_>| p.token("name")])
}

/// `:: literal (',' literal)*` or `(arg (',' arg)*)`, `arg ::= (word '=' literal) | literal`.
fn params(p: &mut Parser<'_>) -> PResult<()> {
    p.choice::<()>(&[
        &|p: &mut Parser<'_>| {
            p.token("::")?;
            positional_list(p)
        },
        &|p: &mut Parser<'_>| {
            p.token("(")?;
            arg(p)?;
            p.closure(|p: &mut Parser<'_>| -> PResult<Node> {
                p.token(",")?;
                arg(p)?;
                Ok(Node::None)
            })?;
            p.token(")")?;
            Ok(())
        },
    ])
}

fn positional_list(p: &mut Parser<'_>) -> PResult<()> {
    let first = super::literal::literal(p)?;
    p.ast_append("params", first);
    p.closure(|p: &mut Parser<'_>| -> PResult<Node> {
        p.token(",")?;
        let next = super::literal::literal(p)?;
        p.ast_append("params", next);
        Ok(Node::None)
    })?;
    Ok(())
}

fn arg(p: &mut Parser<'_>) -> PResult<()> {
    let keyword = p.optional(|p: &mut Parser<'_>| {
        let name = word(p)?;
        p.token("=")?;
        let value = super::literal::literal(p)?;
        Ok((name, value))
    })?;
    match keyword {
        Some((name, value)) => {
            let mut pair = AstNode::new();
            pair.set("name", name);
            pair.set("value", value);
            p.ast_append("kwparams", Node::Ast(pair));
            Ok(())
        }
        None => {
            let value = super::literal::literal(p)?;
            p.ast_append("params", value);
            Ok(())
        }
    }
}

fn rule(p: &mut Parser<'_>) -> PResult<Node> {
    p.call("rule", &|p: &mut Parser<'_>| {
        p.closure(|p: &mut Parser<'_>| -> PResult<Node> {
            let d = decorator(p)?;
            p.ast_append("decorators", d);
            Ok(Node::None)
        })?;
        let name = word(p)?;
        p.ast_set("name", name);
        p.optional(|p: &mut Parser<'_>| params(p))?;
        let base = p.optional(|p: &mut Parser<'_>| {
            p.token("<")?;
            word(p)
        })?;
        if let Some(base) = base {
            p.ast_set("base", base);
        }
        p.token("=")?;
        let exp = expression(p)?;
        p.ast_set("exp", exp);
        p.token(";")?;
        Ok(Node::None)
    })
}

#[cfg(test)]
mod tests {
    use crate::model::GrammarElement;

    fn first_rule(text: &str) -> crate::model::Rule {
        let grammar = crate::parse_grammar_source(text).unwrap();
        grammar.rules.into_iter().next().unwrap()
    }

    #[test]
    fn decorators_are_collected_in_order() {
        let rule = first_rule("@override @name start = 'a';");
        assert_eq!(rule.decorators, vec!["override", "name"]);
    }

    #[test]
    fn params_colon_form_is_positional() {
        let rule = first_rule("start::'a','b' = 'x';");
        assert_eq!(rule.params, vec!["a", "b"]);
        assert!(rule.kwparams.is_empty());
    }

    #[test]
    fn params_paren_form_accepts_positional_and_keyword_args() {
        let rule = first_rule("start(1, sep=',') = 'x';");
        assert_eq!(rule.params, vec!["1"]);
        assert_eq!(rule.kwparams, vec![("sep".to_string(), ",".to_string())]);
    }

    #[test]
    fn base_rule_inheritance_is_captured() {
        let rule = first_rule("start<base = 'x';");
        assert_eq!(rule.base.as_deref(), Some("base"));
    }

    #[test]
    fn rule_without_base_leaves_it_unset() {
        let rule = first_rule("start = 'x';");
        assert!(rule.base.is_none());
    }

    #[test]
    fn keyword_decl_collects_one_or_more_words() {
        let grammar = crate::parse_grammar_source("@@keyword :: if else\nstart = 'x';").unwrap();
        assert_eq!(grammar.keywords, vec!["if", "else"]);
    }

    #[test]
    fn directive_with_regex_value_is_kept_verbatim() {
        let grammar = crate::parse_grammar_source("@@whitespace :: /\\s+/\nstart = 'x';").unwrap();
        assert_eq!(grammar.directives[0].name, "whitespace");
        assert_eq!(grammar.directives[0].value, r"\s+");
    }

    #[test]
    fn rule_exp_defaults_to_void_only_when_slot_absent() {
        let rule = first_rule("start = ();");
        assert!(matches!(*rule.exp, GrammarElement::EmptyClosure(_)));
    }
}
