//! The parse-failure taxonomy. Kinds, not type names: every
//! combinator boundary (`choice`, `optional`, `closure`, rule invocation)
//! catches these by matching on the enum, not on distinct Rust types.

use thiserror::Error;

use crate::buffer::Pos;

/// A parse failure, carrying enough context to render a user-visible
/// diagnostic (line, column, offending excerpt via [`Pos`], and the rule
/// stack at the point of failure) without needing to re-walk the buffer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("expected {expected:?} at line {}:{}", pos.line, pos.column)]
    Token {
        expected: String,
        pos: Pos,
        rule_stack: Vec<String>,
    },

    #[error("expected pattern {expected:?} at line {}:{}", pos.line, pos.column)]
    Pattern {
        expected: String,
        pos: Pos,
        rule_stack: Vec<String>,
    },

    #[error("lookahead failed at line {}:{}", pos.line, pos.column)]
    Lookahead { pos: Pos, rule_stack: Vec<String> },

    #[error("reference to undefined rule {name:?}")]
    Ref {
        name: String,
        pos: Pos,
        rule_stack: Vec<String>,
    },

    /// A left-recursive rule re-entered at the same position before any
    /// seed has succeeded; caught internally by the fixpoint and never
    /// expected to escape to a caller.
    #[error("no left-recursion seed yet for {name:?} at line {}:{}", pos.line, pos.column)]
    Seed {
        name: String,
        pos: Pos,
        rule_stack: Vec<String>,
    },

    /// Wraps a failure that occurred after a `cut`; suppresses the enclosing
    /// `choice`'s backtracking.
    #[error("{0}")]
    Cut(Box<ParseError>),

    #[error("{message} at line {}:{}", pos.line, pos.column)]
    Semantic {
        message: String,
        pos: Pos,
        rule_stack: Vec<String>,
    },
}

impl ParseError {
    pub fn pos(&self) -> Pos {
        match self {
            ParseError::Token { pos, .. }
            | ParseError::Pattern { pos, .. }
            | ParseError::Lookahead { pos, .. }
            | ParseError::Ref { pos, .. }
            | ParseError::Seed { pos, .. }
            | ParseError::Semantic { pos, .. } => *pos,
            ParseError::Cut(inner) => inner.pos(),
        }
    }

    pub fn rule_stack(&self) -> &[String] {
        match self {
            ParseError::Token { rule_stack, .. }
            | ParseError::Pattern { rule_stack, .. }
            | ParseError::Lookahead { rule_stack, .. }
            | ParseError::Ref { rule_stack, .. }
            | ParseError::Seed { rule_stack, .. }
            | ParseError::Semantic { rule_stack, .. } => rule_stack,
            ParseError::Cut(inner) => inner.rule_stack(),
        }
    }

    pub fn is_cut(&self) -> bool {
        matches!(self, ParseError::Cut(_))
    }

    /// Wrap in `Cut` unless already wrapped: cut escalation is idempotent,
    /// so an ancestor choice that itself has not yet cut still sees it as
    /// escalated.
    pub fn escalate(self) -> ParseError {
        if self.is_cut() {
            self
        } else {
            ParseError::Cut(Box::new(self))
        }
    }

    /// Strip one layer of `Cut`, if present. Used at a rule boundary, where
    /// an escalated failure becomes the rule's ordinary overall failure —
    /// caught only at the enclosing rule boundary, or bubbling all the way
    /// to the top-level `parse` call.
    pub fn into_rule_failure(self) -> ParseError {
        match self {
            ParseError::Cut(inner) => inner.into_rule_failure(),
            other => other,
        }
    }

    /// Render a one-line, human-readable diagnostic including a source
    /// excerpt.
    pub fn render(&self, source: &str) -> String {
        let pos = self.pos();
        let line_text = source.lines().nth((pos.line.saturating_sub(1)) as usize).unwrap_or("");
        let rule_stack = self.rule_stack().join(".");
        format!(
            "{} (line {}, column {})\n  {}\n{}in rule: {}",
            self,
            pos.line,
            pos.column,
            line_text,
            " ".repeat(2 + pos.column.saturating_sub(1) as usize),
            if rule_stack.is_empty() { "<top level>" } else { &rule_stack }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos() -> Pos {
        Pos { offset: 0, line: 1, column: 1 }
    }

    #[test]
    fn escalate_is_idempotent() {
        let err = ParseError::Token {
            expected: "a".into(),
            pos: pos(),
            rule_stack: vec![],
        };
        let once = err.clone().escalate();
        let twice = once.clone().escalate();
        assert_eq!(once, twice);
    }

    #[test]
    fn into_rule_failure_strips_cut_wrapper() {
        let err = ParseError::Token {
            expected: "a".into(),
            pos: pos(),
            rule_stack: vec![],
        };
        let wrapped = err.clone().escalate();
        assert_eq!(wrapped.into_rule_failure(), err);
    }
}
