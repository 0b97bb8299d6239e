//! The combinator runtime: packrat memoization, bounded left recursion, cut
//! semantics, and the primitive combinators every generated (or hand-written)
//! rule method is built from.
//!
//! Grounded on `original_source/grako/parsing.py`'s `Parser` class: `_call`
//! (rule-stack push/pop + position restore on failure), the `@memoize`
//! decorator on `_invoke_rule`, `_choice_context`/`_repeat_context`
//! (contextmanagers restoring position and catching failures), and
//! `_token`/`_pattern`/`_try`. The seed-growing left-recursion fixpoint is
//! from Warth, Douglass & Millstein, "Packrat Parsers Can Support Left
//! Recursion" (2008), which `grako` itself implements; neither source bounds
//! the fixpoint's iteration count, so `max_left_recursion_depth` is this
//! engine's own stack-safety backstop.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tracing::{instrument, trace};

use crate::ast::{AstNode, Node};
use crate::buffer::{Buffer, BufferConfig, Pos};
use crate::error::ParseError;
use crate::semantics::Semantics;

pub type PResult<T> = Result<T, ParseError>;

/// Grammar-independent parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    pub buffer: BufferConfig,
    pub trace: bool,
    /// When `false`, a rule re-entering itself at the same position raises
    /// its seed failure immediately instead of running the left-recursion
    /// fixpoint (default `true`; grako's `@@left_recursion :: false`).
    pub left_recursion: bool,
    /// Backstop on the left-recursion seed-growing loop.
    pub max_left_recursion_depth: usize,
    /// Reserved words a word-matching primitive must not accept (grako's
    /// `@@keyword` directive).
    pub keywords: HashSet<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            buffer: BufferConfig::default(),
            trace: false,
            left_recursion: true,
            max_left_recursion_depth: 250,
            keywords: HashSet::new(),
        }
    }
}

#[derive(Clone)]
enum MemoEntry {
    /// The rule body is currently running at this position; a nested call
    /// reaching this entry is the left-recursion detector firing.
    InProgress,
    Done(PResult<(Node, usize)>),
}

/// A rule-body closure: given a running parser, attempt the rule and return
/// its semantic result. Grammar productions (hand-written or generated from
/// the meta-parser's output) are exactly this shape.
pub type RuleBody<'g> = dyn Fn(&mut Parser<'g>) -> PResult<Node> + 'g;

pub struct Parser<'g> {
    buffer: Buffer,
    config: ParserConfig,
    semantics: &'g dyn Semantics,
    rule_stack: Vec<String>,
    /// AST-slot accumulators, one pushed per active rule invocation.
    ast_stack: Vec<AstNode>,
    /// Cut flags, one pushed per active `choice` (and one as a fallback per
    /// rule invocation, so a cut inside a rule with no enclosing `choice`
    /// still has a frame to mark).
    cut_stack: Vec<Rc<std::cell::Cell<bool>>>,
    memo: RefCell<HashMap<(String, usize), MemoEntry>>,
    lr_detected: RefCell<HashSet<(String, usize)>>,
    /// One entry per rule invocation currently on the call stack, recording
    /// every `(rule, pos)` memo key any descendant call has written `Done`
    /// into since this entry's invocation began. When a rule turns out to
    /// be left-recursive, growing its seed must invalidate not just its own
    /// memo entry but every other rule's memo entry computed against the
    /// pre-growth seed — otherwise a rule reached only through indirect
    /// recursion (`A = B '+' term | term ; B = A ;`) keeps replaying the
    /// stale failure it memoized before `A` had a seed at all.
    growth_scopes: RefCell<Vec<HashSet<(String, usize)>>>,
}

impl<'g> Parser<'g> {
    pub fn new(text: impl Into<String>, config: ParserConfig, semantics: &'g dyn Semantics) -> Self {
        let buffer = Buffer::new(text, config.buffer.clone());
        Parser {
            buffer,
            config,
            semantics,
            rule_stack: Vec::new(),
            ast_stack: Vec::new(),
            cut_stack: Vec::new(),
            memo: RefCell::new(HashMap::new()),
            lr_detected: RefCell::new(HashSet::new()),
            growth_scopes: RefCell::new(Vec::new()),
        }
    }

    pub fn pos(&self) -> Pos {
        self.buffer.current_pos()
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    fn rule_stack_names(&self) -> Vec<String> {
        self.rule_stack.clone()
    }

    // --- AST slot accumulation --------------------------------------------

    pub fn ast_set(&mut self, name: &str, value: Node) {
        if let Some(top) = self.ast_stack.last_mut() {
            top.set(name, value);
        }
    }

    pub fn ast_append(&mut self, name: &str, value: Node) {
        if let Some(top) = self.ast_stack.last_mut() {
            top.append(name, value);
        }
    }

    pub fn ast_define(&mut self, required: &[&str], optional: &[&str]) {
        if let Some(top) = self.ast_stack.last_mut() {
            top.define(required, optional);
        }
    }

    // --- Rule invocation: exactly-once packrat + left-recursion fixpoint --

    /// Call a named rule at the current position.
    #[instrument(level = "trace", skip(self, body, name), fields(rule = name))]
    pub fn call(&mut self, name: &str, body: &RuleBody<'g>) -> PResult<Node> {
        let start = self.buffer.pos();
        let key = (name.to_string(), start);

        if let Some(entry) = self.memo.borrow().get(&key).cloned() {
            return match entry {
                MemoEntry::InProgress => {
                    self.lr_detected.borrow_mut().insert(key.clone());
                    Err(ParseError::Seed {
                        name: name.to_string(),
                        pos: self.buffer.pos_at(start),
                        rule_stack: self.rule_stack_names(),
                    })
                }
                MemoEntry::Done(result) => self.replay(result),
            };
        }

        self.memo.borrow_mut().insert(key.clone(), MemoEntry::InProgress);
        self.rule_stack.push(name.to_string());
        let cut_flag = Rc::new(std::cell::Cell::new(false));
        self.cut_stack.push(cut_flag);
        self.ast_stack.push(AstNode::new_at(self.buffer.pos_at(start)));
        // Tracks every memo key a descendant call finishes with while this
        // invocation (and, if it turns out to be the left-recursion root,
        // its whole seed-growing loop) is running. Stays on the stack
        // through `grow_lr` below, not just the first body invocation, so
        // a growth iteration can see everything the previous iteration's
        // sub-calls memoized.
        self.growth_scopes.borrow_mut().push(HashSet::new());

        trace!(rule = name, pos = start, "enter");
        let first = self.invoke_body_once(name, start, body);
        self.ast_stack.pop();
        self.cut_stack.pop();
        self.rule_stack.pop();

        let became_left_recursive = self.lr_detected.borrow_mut().remove(&key);
        let outcome = if became_left_recursive && self.config.left_recursion {
            self.memo.borrow_mut().remove(&key);
            self.grow_lr(name, start, body, first)
        } else {
            first
        };
        self.growth_scopes.borrow_mut().pop();

        self.memo.borrow_mut().insert(key.clone(), MemoEntry::Done(outcome.clone()));
        self.record_touched(&key);
        trace!(rule = name, pos = start, ok = outcome.is_ok(), "exit");
        self.replay(outcome)
    }

    /// Record that `key`'s memo entry was just written, in every
    /// left-recursion growth scope currently on the call stack — i.e. every
    /// ancestor rule invocation that might later need to purge it before
    /// re-running its body against a grown seed.
    fn record_touched(&self, key: &(String, usize)) {
        for scope in self.growth_scopes.borrow_mut().iter_mut() {
            scope.insert(key.clone());
        }
    }

    /// A rule's canonical result, before semantics, is its accumulated AST if
    /// the body populated any named slot, or else its bare return value:
    /// absent a handler, a rule with named captures yields that AST, a bare
    /// rule yields whatever its body produced.
    fn invoke_body_once(&mut self, name: &str, start: usize, body: &RuleBody<'g>) -> PResult<(Node, usize)> {
        match body(self) {
            Ok(returned) => {
                let ast_is_empty = self.ast_stack.last().is_some_and(AstNode::is_empty);
                let raw = if ast_is_empty {
                    returned
                } else {
                    Node::Ast(self.ast_stack.last().cloned().unwrap_or_default())
                };
                let node = self.apply_semantics(name, raw);
                Ok((node, self.buffer.pos()))
            }
            Err(err) => {
                self.buffer.goto(start);
                Err(err.into_rule_failure())
            }
        }
    }

    fn apply_semantics(&mut self, name: &str, node: Node) -> Node {
        match (self.semantics.lookup(name), node) {
            (Some(handler), Node::Ast(ast)) => handler(ast),
            (_, node) => node,
        }
    }

    /// Warth-style seed growing: re-run the rule body with the previous best
    /// result memoized as the seed, keep growing while a re-run both
    /// succeeds and consumes more input than the prior best, stop otherwise
    /// or after `max_left_recursion_depth` iterations.
    ///
    /// Every growth iteration first purges the memo entries this rule's
    /// growth scope (see [`Self::growth_scopes`]) collected from the
    /// *previous* attempt, at this position or any later one. Without this,
    /// a rule reached only indirectly — e.g. `B` in `A = B '+' term | term ;
    /// B = A ;` — keeps a `Done(Err(..))` entry memoized from the pass where
    /// `A` had no seed yet, and every subsequent growth iteration replays
    /// that stale failure via the ordinary memo hit in [`Self::call`]
    /// instead of re-running `B`'s body against `A`'s newly grown seed.
    fn grow_lr(
        &mut self,
        name: &str,
        start: usize,
        body: &RuleBody<'g>,
        seed: PResult<(Node, usize)>,
    ) -> PResult<(Node, usize)> {
        let key = (name.to_string(), start);
        let mut best = seed;
        let mut iterations = 0usize;

        loop {
            if best.is_err() {
                break;
            }
            if iterations >= self.config.max_left_recursion_depth {
                trace!(rule = name, iterations, "left recursion depth limit reached");
                break;
            }
            self.purge_growth_scope();
            self.memo.borrow_mut().insert(key.clone(), MemoEntry::Done(best.clone()));
            self.buffer.goto(start);

            self.rule_stack.push(name.to_string());
            self.cut_stack.push(Rc::new(std::cell::Cell::new(false)));
            self.ast_stack.push(AstNode::new_at(self.buffer.pos_at(start)));
            let attempt = self.invoke_body_once(name, start, body);
            self.ast_stack.pop();
            self.cut_stack.pop();
            self.rule_stack.pop();

            let grew = match (&attempt, &best) {
                (Ok((_, new_end)), Ok((_, best_end))) => new_end > best_end,
                (Ok(_), Err(_)) => true,
                _ => false,
            };
            if !grew {
                break;
            }
            best = attempt;
            iterations += 1;
        }

        // The final attempt (whether it grew and became `best`, or failed to
        // grow and was rejected) may have left descendant rules memoized
        // against a seed other than the one `best` settles on; purge them so
        // nothing above this call replays a result computed against a
        // discarded attempt.
        self.purge_growth_scope();

        self.memo.borrow_mut().remove(&key);
        // Leave the buffer positioned at the end of the winning seed.
        if let Ok((_, end)) = &best {
            self.buffer.goto(*end);
        } else {
            self.buffer.goto(start);
        }
        best
    }

    /// Remove from the memo table every key the innermost active growth
    /// scope has recorded, then clear the scope so it starts tracking fresh
    /// for the next attempt.
    fn purge_growth_scope(&mut self) {
        let touched = match self.growth_scopes.borrow_mut().last_mut() {
            Some(scope) => std::mem::take(scope),
            None => return,
        };
        let mut memo = self.memo.borrow_mut();
        for touched_key in touched {
            memo.remove(&touched_key);
        }
    }

    fn replay(&mut self, result: PResult<(Node, usize)>) -> PResult<Node> {
        match result {
            Ok((node, end)) => {
                self.buffer.goto(end);
                Ok(node)
            }
            Err(err) => Err(err),
        }
    }

    // --- Cut ----------------------------------------------------------

    /// Mark the innermost enclosing choice (or, absent one, the current
    /// rule) as committed. Subsequent ordinary failures in this alternative
    /// escalate past that choice's backtracking.
    pub fn cut(&mut self) {
        if let Some(flag) = self.cut_stack.last() {
            flag.set(true);
        }
    }

    fn cut_committed(&self) -> bool {
        self.cut_stack.last().is_some_and(|f| f.get())
    }

    // --- Primitive combinators ---------------------------------------------

    pub fn token(&mut self, literal: &str) -> PResult<Node> {
        self.buffer.skip_comments_and_whitespace();
        let pos = self.buffer.pos_at(self.buffer.pos());
        match self.buffer.match_literal(literal, false) {
            Some(matched) => Ok(Node::Token(matched)),
            None => Err(ParseError::Token {
                expected: literal.to_string(),
                pos,
                rule_stack: self.rule_stack_names(),
            }),
        }
    }

    pub fn pattern(&mut self, regex: &str) -> PResult<Node> {
        self.buffer.skip_comments_and_whitespace();
        let pos = self.buffer.pos_at(self.buffer.pos());
        match self.buffer.match_regex(regex, false) {
            Some(matched) => Ok(Node::Token(matched)),
            None => Err(ParseError::Pattern {
                expected: regex.to_string(),
                pos,
                rule_stack: self.rule_stack_names(),
            }),
        }
    }

    /// A word-matching primitive that rejects reserved words: match
    /// `pattern`, then fail (without consuming) if the matched text is a
    /// configured keyword. Distinct from [`Self::pattern`], which has no
    /// notion of reserved words.
    pub fn word(&mut self, pattern: &str) -> PResult<Node> {
        self.buffer.skip_comments_and_whitespace();
        let pos = self.buffer.pos_at(self.buffer.pos());
        let before = self.buffer.pos();
        match self.buffer.match_regex(pattern, false) {
            Some(matched) if self.config.keywords.contains(&matched) => {
                self.buffer.goto(before);
                Err(ParseError::Token {
                    expected: format!("identifier (not the reserved word {matched:?})"),
                    pos,
                    rule_stack: self.rule_stack_names(),
                })
            }
            Some(matched) => Ok(Node::Token(matched)),
            None => Err(ParseError::Pattern {
                expected: pattern.to_string(),
                pos,
                rule_stack: self.rule_stack_names(),
            }),
        }
    }

    pub fn constant(&self, value: &str) -> Node {
        Node::Token(value.to_string())
    }

    pub fn eof(&mut self) -> PResult<Node> {
        self.buffer.skip_comments_and_whitespace();
        if self.buffer.at_end() {
            Ok(Node::None)
        } else {
            Err(ParseError::Token {
                expected: "<end of input>".to_string(),
                pos: self.buffer.current_pos(),
                rule_stack: self.rule_stack_names(),
            })
        }
    }

    /// Try each alternative in order, backtracking the buffer between
    /// attempts. A cut inside an alternative suppresses that backtracking:
    /// the alternative's failure escalates out of the whole choice instead.
    pub fn choice<T>(&mut self, options: &[&dyn Fn(&mut Self) -> PResult<T>]) -> PResult<T> {
        let start = self.buffer.pos();
        self.cut_stack.push(Rc::new(std::cell::Cell::new(false)));
        let mut last_err = None;
        for option in options {
            self.buffer.goto(start);
            match option(self) {
                Ok(value) => {
                    self.cut_stack.pop();
                    return Ok(value);
                }
                Err(err) => {
                    if self.cut_committed() || err.is_cut() {
                        self.cut_stack.pop();
                        self.buffer.goto(start);
                        return Err(err.escalate());
                    }
                    last_err = Some(err);
                }
            }
        }
        self.cut_stack.pop();
        self.buffer.goto(start);
        Err(last_err.unwrap_or_else(|| ParseError::Token {
            expected: "<no alternative matched>".to_string(),
            pos: self.buffer.pos_at(start),
            rule_stack: self.rule_stack_names(),
        }))
    }

    /// Zero-or-more. Stops at the first ordinary failure or non-progressing
    /// success (an empty match would otherwise loop forever), restoring the
    /// buffer to just past the last successful iteration. A cut failure
    /// inside an iteration is not a stopping condition for the loop alone:
    /// it escalates out of the closure entirely — cut escalation passes
    /// through repetition and optional, stopping only at an uncut choice or
    /// the rule boundary.
    pub fn closure<T: Into<Node>>(&mut self, mut body: impl FnMut(&mut Self) -> PResult<T>) -> PResult<Node> {
        let mut items = Vec::new();
        loop {
            let before = self.buffer.pos();
            match body(self) {
                Ok(node) => {
                    if self.buffer.pos() == before {
                        break;
                    }
                    items.push(node.into());
                }
                Err(err) if err.is_cut() => return Err(err),
                Err(_) => {
                    self.buffer.goto(before);
                    break;
                }
            }
        }
        Ok(Node::Repeated(items))
    }

    /// One-or-more: same as [`Self::closure`] but requires at least one
    /// successful iteration.
    pub fn positive_closure<T: Into<Node>>(&mut self, body: impl FnMut(&mut Self) -> PResult<T>) -> PResult<Node> {
        let result = self.closure(body)?;
        match &result {
            Node::Repeated(items) if items.is_empty() => Err(ParseError::Token {
                expected: "<at least one repetition>".to_string(),
                pos: self.buffer.current_pos(),
                rule_stack: self.rule_stack_names(),
            }),
            _ => Ok(result),
        }
    }

    /// `sep.{exp}` / `sep.{exp}+`: `exp` repeated, separated by `sep`.
    pub fn join<T>(
        &mut self,
        positive: bool,
        mut exp: impl FnMut(&mut Self) -> PResult<T>,
        mut sep: impl FnMut(&mut Self) -> PResult<()>,
    ) -> PResult<Node>
    where
        T: Into<Node>,
    {
        let mut items = Vec::new();
        let start = self.buffer.pos();
        match exp(self) {
            Ok(first) => items.push(first.into()),
            Err(err) => {
                if positive {
                    return Err(err);
                }
                self.buffer.goto(start);
                return Ok(Node::Repeated(items));
            }
        }
        loop {
            let before = self.buffer.pos();
            if sep(self).is_err() {
                self.buffer.goto(before);
                break;
            }
            match exp(self) {
                Ok(node) => items.push(node.into()),
                Err(_) => {
                    self.buffer.goto(before);
                    break;
                }
            }
        }
        Ok(Node::Repeated(items))
    }

    /// `e?`. A cut failure inside `e` escalates rather than being absorbed
    /// into `None`.
    pub fn optional<T>(&mut self, mut body: impl FnMut(&mut Self) -> PResult<T>) -> PResult<Option<T>> {
        let before = self.buffer.pos();
        match body(self) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_cut() => Err(err),
            Err(_) => {
                self.buffer.goto(before);
                Ok(None)
            }
        }
    }

    /// Positive lookahead `&e`: succeeds without consuming input iff `e`
    /// would succeed here.
    pub fn lookahead<T>(&mut self, mut body: impl FnMut(&mut Self) -> PResult<T>) -> PResult<()> {
        let before = self.buffer.pos();
        let result = body(self);
        self.buffer.goto(before);
        match result {
            Ok(_) => Ok(()),
            Err(err) => Err(ParseError::Lookahead {
                pos: self.buffer.pos_at(before),
                rule_stack: self.rule_stack_names(),
            }
            .and_escalate_if(err.is_cut())),
        }
    }

    /// Negative lookahead `!e`: succeeds without consuming input iff `e`
    /// would fail here.
    pub fn negative_lookahead<T>(&mut self, mut body: impl FnMut(&mut Self) -> PResult<T>) -> PResult<()> {
        let before = self.buffer.pos();
        let result = body(self);
        self.buffer.goto(before);
        match result {
            Err(_) => Ok(()),
            Ok(_) => Err(ParseError::Lookahead {
                pos: self.buffer.pos_at(before),
                rule_stack: self.rule_stack_names(),
            }),
        }
    }

}

impl ParseError {
    fn and_escalate_if(self, escalate: bool) -> ParseError {
        if escalate {
            self.escalate()
        } else {
            self
        }
    }
}
