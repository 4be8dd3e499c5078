//! Ordered rewrite rules.
//!
//! Each rule is a named pattern plus a rewrite. A rule whose pattern does
//! not match leaves the text untouched, so unknown syntax falls through
//! every table unchanged.

use log::trace;
use pl2py_lexer::{QuoteState, Scan};
use regex::{Captures, NoExpand, Regex};

enum Rewrite {
    Literal(&'static str),
    With(fn(&Captures<'_>) -> String),
}

pub(super) struct Rule {
    pub name: &'static str,
    pattern: Regex,
    rewrite: Rewrite,
    code_only: bool,
}

impl Rule {
    /// Replace every match with fixed text.
    pub fn literal(name: &'static str, pattern: &str, replacement: &'static str) -> Self {
        Self::new(name, pattern, Rewrite::Literal(replacement))
    }

    /// Replace every match with the output of `rewrite`.
    pub fn with(name: &'static str, pattern: &str, rewrite: fn(&Captures<'_>) -> String) -> Self {
        Self::new(name, pattern, Rewrite::With(rewrite))
    }

    fn new(name: &'static str, pattern: &str, rewrite: Rewrite) -> Self {
        let pattern = Regex::new(pattern)
            .unwrap_or_else(|e| panic!("rule {name} has an invalid pattern: {e}"));
        Self {
            name,
            pattern,
            rewrite,
            code_only: false,
        }
    }

    /// Leave the insides of string literals alone.
    pub fn outside_literals(mut self) -> Self {
        self.code_only = true;
        self
    }

    /// `None` when the pattern does not match.
    pub fn apply(&self, text: &str) -> Option<String> {
        if !self.pattern.is_match(text) {
            return None;
        }
        if !self.code_only {
            return Some(self.rewrite_all(text));
        }

        let mut out = String::with_capacity(text.len());
        let mut changed = false;
        for (is_code, segment) in split_literals(text) {
            if is_code && self.pattern.is_match(segment) {
                out.push_str(&self.rewrite_all(segment));
                changed = true;
            } else {
                out.push_str(segment);
            }
        }
        changed.then_some(out)
    }

    fn rewrite_all(&self, text: &str) -> String {
        let rewritten = match &self.rewrite {
            Rewrite::Literal(replacement) => self.pattern.replace_all(text, NoExpand(replacement)),
            Rewrite::With(rewrite) => self
                .pattern
                .replace_all(text, |caps: &Captures<'_>| rewrite(caps)),
        };
        rewritten.into_owned()
    }
}

/// Cut `text` into alternating code and string-literal segments.
///
/// Quote characters belong to the literal they delimit.
fn split_literals(text: &str) -> Vec<(bool, &str)> {
    let mut quotes = QuoteState::new();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_code = true;

    for (i, c) in text.char_indices() {
        let is_code = quotes.handle_char(c) == Scan::Code;
        if is_code != in_code {
            if i > start {
                segments.push((in_code, &text[start..i]));
            }
            start = i;
            in_code = is_code;
        }
    }
    if start < text.len() {
        segments.push((in_code, &text[start..]));
    }
    segments
}

/// Run `rules` in order, feeding each rule the previous rule's output.
pub(super) fn apply_rules(rules: &[Rule], text: &str, applied: &mut Vec<&'static str>) -> String {
    let mut current = text.to_string();
    for rule in rules {
        if let Some(next) = rule.apply(&current) {
            trace!(rule = rule.name, before = current.as_str(), after = next.as_str(); "rule applied");
            applied.push(rule.name);
            current = next;
        }
    }
    current
}
