//! Validates a [`pegc_core::model::Grammar`] and renders diagnostics for the
//! failures it finds.
//!
//! [`Validator`] resolves the reference graph a parsed grammar implies
//! ([`pegc_core::model::Grammar::referenced_rule_names`]) and reports the
//! dangling ones, and [`render_report`] builds an [`ariadne`] report for
//! them, simplified to a single source file (`pegc-core` parses one grammar
//! file per [`pegc_core::Grammar`] tree, not a multi-file source map, so
//! there is no file id to carry).

use std::ops::Range;

use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use indexmap::IndexMap;
use thiserror::Error;

use pegc_core::model::Grammar;
use pegc_core::Pos;

/// A single validation failure, with enough position information to label a
/// source excerpt.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("reference to undefined rule {name:?} at line {}:{}", pos.line, pos.column)]
    UndefinedRule { name: String, pos: Pos },

    #[error("rule {name:?} redefined at line {}:{} (first defined at line {}:{})", second.line, second.column, first.line, first.column)]
    DuplicateRule { name: String, first: Pos, second: Pos },
}

impl ValidationError {
    fn pos(&self) -> Pos {
        match self {
            ValidationError::UndefinedRule { pos, .. } => *pos,
            ValidationError::DuplicateRule { second, .. } => *second,
        }
    }
}

/// Checks a parsed grammar is self-consistent: every rule name it mentions is
/// declared exactly once. `pegc_core` itself never checks this — a
/// [`pegc_core::model::Grammar`] is a context-free syntax tree, agnostic of
/// whether its `RuleRef`s resolve, including cyclic ones.
pub struct Validator;

impl Validator {
    pub fn validate(grammar: &Grammar) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut declared: IndexMap<&str, Pos> = IndexMap::new();
        for rule in &grammar.rules {
            if let Some(&first) = declared.get(rule.name.as_str()) {
                errors.push(ValidationError::DuplicateRule {
                    name: rule.name.clone(),
                    first,
                    second: rule.pos,
                });
            } else {
                declared.insert(rule.name.as_str(), rule.pos);
            }
        }
        for (name, pos) in grammar.referenced_rule_names() {
            if !declared.contains_key(name) {
                errors.push(ValidationError::UndefinedRule { name: name.to_string(), pos });
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Render `errors` against `source` as one [`ariadne`] report per error,
/// concatenated. `source` must be the exact text the errors' positions were
/// computed against.
pub fn render_report(source: &str, errors: &[ValidationError]) -> String {
    let mut out = Vec::new();
    for error in errors {
        let pos = error.pos();
        let span = byte_span(source, pos);
        let mut colors = ColorGenerator::new();
        let mut report = Report::build(ReportKind::Error, (), span.start);
        report.set_message(error.to_string());
        report.add_label(
            Label::new(span)
                .with_message(match error {
                    ValidationError::UndefinedRule { name, .. } => format!("no rule named {name:?}"),
                    ValidationError::DuplicateRule { name, .. } => format!("{name:?} redefined here"),
                })
                .with_color(colors.next()),
        );
        report
            .finish()
            .write(Source::from(source), &mut out)
            .expect("writing to a Vec<u8> never fails");
    }
    String::from_utf8(out).expect("ariadne reports are always valid UTF-8")
}

fn byte_span(source: &str, pos: Pos) -> Range<usize> {
    let start = pos.offset.min(source.len());
    let end = source[start..]
        .char_indices()
        .nth(1)
        .map(|(i, _)| start + i)
        .unwrap_or(source.len());
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_self_consistent_grammar() {
        let grammar = pegc_core::parse_grammar_source("start = 'a' expr ; expr = /\\d+/ ;").unwrap();
        assert!(Validator::validate(&grammar).is_ok());
    }

    #[test]
    fn flags_a_reference_to_an_undeclared_rule() {
        let grammar = pegc_core::parse_grammar_source("start = 'a' missing ;").unwrap();
        let errors = Validator::validate(&grammar).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], ValidationError::UndefinedRule { name, .. } if name == "missing"));
    }

    #[test]
    fn flags_a_redefined_rule_name() {
        let grammar = pegc_core::parse_grammar_source("start = 'a' ; start = 'b' ;").unwrap();
        let errors = Validator::validate(&grammar).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], ValidationError::DuplicateRule { name, .. } if name == "start"));
    }

    #[test]
    fn renders_a_report_mentioning_the_undefined_rule() {
        let source = "start = 'a' missing ;";
        let grammar = pegc_core::parse_grammar_source(source).unwrap();
        let errors = Validator::validate(&grammar).unwrap_err();
        let report = render_report(source, &errors);
        assert!(report.contains("missing"));
    }
}
