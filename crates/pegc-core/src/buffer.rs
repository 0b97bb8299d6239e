//! Input cursor with whitespace/comment skipping and literal/regex matching.
//!
//! `Buffer` is the sole authority on parse position: every other component
//! backtracks by asking the buffer to `goto` a saved position, and every
//! match primitive goes through it so that whitespace/comment skipping
//! happens exactly once, right before the match is attempted.

use std::cell::RefCell;
use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use serde::Serialize;

/// A resolved source location, computed lazily from a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

/// Buffer configuration (the non-grammar-specific half of [`crate::parser::ParserConfig`]).
#[derive(Debug, Clone)]
pub struct BufferConfig {
    pub whitespace: Vec<char>,
    pub comments_re: Option<String>,
    pub eol_comments_re: Option<String>,
    pub ignorecase: bool,
    pub nameguard: bool,
}

impl Default for BufferConfig {
    fn default() -> Self {
        BufferConfig {
            whitespace: vec![' ', '\t', '\n', '\r', '\x0b'],
            comments_re: None,
            eol_comments_re: None,
            ignorecase: false,
            nameguard: true,
        }
    }
}

pub struct Buffer {
    text: String,
    pos: usize,
    config: BufferConfig,
    regex_cache: RefCell<HashMap<String, Regex>>,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl Buffer {
    pub fn new(text: impl Into<String>, config: BufferConfig) -> Self {
        Buffer {
            text: text.into(),
            pos: 0,
            config,
            regex_cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Restore the cursor to a previously saved position. The only way the
    /// cursor ever moves backwards.
    pub fn goto(&mut self, pos: usize) {
        debug_assert!(pos <= self.text.len());
        self.pos = pos;
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    /// A short excerpt starting at the cursor, for trace output and error messages.
    pub fn lookahead(&self, n: usize) -> &str {
        let rest = &self.text[self.pos..];
        let end = rest
            .char_indices()
            .nth(n)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        &rest[..end]
    }

    /// Resolve a byte offset into 1-based line/column.
    pub fn pos_at(&self, offset: usize) -> Pos {
        let (mut line, mut col) = (1u32, 1u32);
        for c in self.text[..offset.min(self.text.len())].chars() {
            if c == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        Pos {
            offset,
            line,
            column: col,
        }
    }

    pub fn current_pos(&self) -> Pos {
        self.pos_at(self.pos)
    }

    /// Advance past any prefix of whitespace and, if configured, any run of
    /// comments. Idempotent at a given position.
    pub fn skip_comments_and_whitespace(&mut self) {
        loop {
            let before = self.pos;
            self.skip_whitespace_once();
            self.skip_comment_once();
            if self.pos == before {
                break;
            }
        }
    }

    fn skip_whitespace_once(&mut self) {
        while let Some(c) = self.text[self.pos..].chars().next() {
            if self.config.whitespace.contains(&c) {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn skip_comment_once(&mut self) {
        if let Some(pattern) = self.config.comments_re.clone() {
            while let Some(m) = self.try_match_regex_at_cursor(&pattern, false) {
                self.pos += m.len();
            }
        }
        if let Some(pattern) = self.config.eol_comments_re.clone() {
            while let Some(m) = self.try_match_regex_at_cursor(&pattern, false) {
                self.pos += m.len();
            }
        }
    }

    /// Compare `literal` at the cursor. Advances on success. An empty literal
    /// matches vacuously without advancing. Honors the ignore-case and
    /// name-guard configuration.
    pub fn match_literal(&mut self, literal: &str, ignorecase: bool) -> Option<String> {
        if literal.is_empty() {
            return Some(String::new());
        }
        let slice = self.text.get(self.pos..)?;
        let matches = if ignorecase || self.config.ignorecase {
            slice.len() >= literal.len()
                && slice[..literal.len()].eq_ignore_ascii_case(literal)
                && slice
                    .chars()
                    .zip(literal.chars())
                    .all(|(a, b)| a.to_lowercase().eq(b.to_lowercase()))
        } else {
            slice.starts_with(literal)
        };
        if !matches {
            return None;
        }
        if self.config.nameguard && literal.chars().last().is_some_and(is_word_char) {
            let after = &slice[literal.len()..];
            if after.chars().next().is_some_and(is_word_char) {
                return None;
            }
        }
        self.pos += literal.len();
        Some(literal.to_string())
    }

    /// Match `pattern` anchored at the cursor. Patterns are compiled lazily
    /// and cached.
    pub fn match_regex(&mut self, pattern: &str, ignorecase: bool) -> Option<String> {
        let m = self.try_match_regex_at_cursor(pattern, ignorecase || self.config.ignorecase)?;
        self.pos += m.len();
        Some(m)
    }

    fn try_match_regex_at_cursor(&self, pattern: &str, ignorecase: bool) -> Option<String> {
        let re = self.compiled(pattern, ignorecase).ok()?;
        let slice = self.text.get(self.pos..)?;
        re.find(slice).map(|m| m.as_str().to_string())
    }

    fn compiled(&self, pattern: &str, ignorecase: bool) -> Result<Regex, regex::Error> {
        let key = format!("{}\0{}", ignorecase, pattern);
        if let Some(re) = self.regex_cache.borrow().get(&key) {
            return Ok(re.clone());
        }
        // `\A` anchors the match to the cursor regardless of `multi_line`;
        // `multi_line` only changes what `^`/`$` inside the pattern mean, so
        // an eol-comment pattern like `#([^\n]*?)$` stops at the next
        // newline rather than only at the very end of the input.
        let anchored = format!(r"\A(?:{pattern})");
        let re = RegexBuilder::new(&anchored)
            .case_insensitive(ignorecase)
            .multi_line(true)
            .build()?;
        self.regex_cache
            .borrow_mut()
            .insert(key, re.clone());
        Ok(re)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_whitespace_before_match() {
        let mut buf = Buffer::new("   hello", BufferConfig::default());
        buf.skip_comments_and_whitespace();
        assert_eq!(buf.pos(), 3);
    }

    #[test]
    fn block_comments_are_skipped() {
        let mut cfg = BufferConfig::default();
        cfg.comments_re = Some(r"\(\*(.|\n)*?\*\)".to_string());
        let mut buf = Buffer::new("(* hi *)  x", cfg);
        buf.skip_comments_and_whitespace();
        assert_eq!(buf.lookahead(1), "x");
    }

    #[test]
    fn eol_comments_stop_at_the_next_newline_not_end_of_input() {
        let mut cfg = BufferConfig::default();
        cfg.eol_comments_re = Some(r"#([^\n]*?)$".to_string());
        let mut buf = Buffer::new("# a comment\nrest", cfg);
        buf.skip_comments_and_whitespace();
        assert_eq!(buf.lookahead(4), "rest");
    }

    #[test]
    fn empty_literal_matches_vacuously() {
        let mut buf = Buffer::new("abc", BufferConfig::default());
        let start = buf.pos();
        assert_eq!(buf.match_literal("", false), Some(String::new()));
        assert_eq!(buf.pos(), start);
    }

    #[test]
    fn nameguard_rejects_prefix_match() {
        let mut buf = Buffer::new("iffy", BufferConfig::default());
        assert_eq!(buf.match_literal("if", false), None);
    }

    #[test]
    fn nameguard_allows_boundary_match() {
        let mut buf = Buffer::new("if x", BufferConfig::default());
        assert_eq!(buf.match_literal("if", false), Some("if".to_string()));
        assert_eq!(buf.pos(), 2);
    }

    #[test]
    fn regex_is_anchored_at_cursor() {
        let mut buf = Buffer::new("12ab", BufferConfig::default());
        assert_eq!(buf.match_regex(r"\d+", false), Some("12".to_string()));
        assert_eq!(buf.match_regex(r"\d+", false), None);
    }

    #[test]
    fn goto_moves_backwards() {
        let mut buf = Buffer::new("abcdef", BufferConfig::default());
        buf.match_literal("abc", false);
        let saved = buf.pos();
        buf.match_literal("def", false);
        buf.goto(saved);
        assert_eq!(buf.pos(), saved);
    }
}
