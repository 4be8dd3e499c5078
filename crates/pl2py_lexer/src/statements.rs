//! Statement boundaries and keyword positions.

use pl2py_model::Scope;

use crate::quote::{is_word_char, QuoteState, Scan};

/// Split a physical line into statements on top-level `;`.
///
/// Separators inside quotes or inside `()`, `[]`, `{}` do not split, so
/// `for (my $i = 0; $i < 3; $i++) {` and `sub f { a; b; }` stay whole.
/// Each statement keeps its `;` and is trimmed. A trailing `#` comment is
/// returned as its own piece. Empty pieces are dropped.
pub fn split_statements(line: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut quotes = QuoteState::new();
    let mut depth: i32 = 0;
    let mut start = 0;
    let mut prev: Option<char> = None;

    for (i, c) in line.char_indices() {
        if quotes.handle_char(c) != Scan::Code {
            prev = Some(c);
            continue;
        }

        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = (depth - 1).max(0),
            ';' if depth == 0 => {
                push_piece(&mut pieces, &line[start..=i]);
                start = i + 1;
            }
            '#' if prev.map_or(true, char::is_whitespace) => {
                push_piece(&mut pieces, &line[start..i]);
                push_piece(&mut pieces, &line[i..]);
                return pieces;
            }
            _ => {}
        }
        prev = Some(c);
    }

    push_piece(&mut pieces, &line[start..]);
    pieces
}

fn push_piece(pieces: &mut Vec<String>, text: &str) {
    let text = text.trim();
    if !text.is_empty() && text != ";" {
        pieces.push(text.to_string());
    }
}

/// Byte offset of the first top-level, unquoted occurrence of `word`.
///
/// The word must be preceded by whitespace and followed by whitespace or
/// `(`, which is the shape of a postfix `if`/`unless`.
pub fn find_word_outside_quotes(line: &str, word: &str) -> Option<usize> {
    let mut quotes = QuoteState::new();
    let mut depth: i32 = 0;
    let mut prev: Option<char> = None;

    for (i, c) in line.char_indices() {
        let scan = quotes.handle_char(c);
        if scan == Scan::Code {
            match c {
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth = (depth - 1).max(0),
                _ => {}
            }
            if depth == 0
                && prev.is_some_and(char::is_whitespace)
                && line[i..].starts_with(word)
            {
                let after = line[i + word.len()..].chars().next();
                if after.is_some_and(|a| a.is_whitespace() || a == '(') {
                    return Some(i);
                }
            }
        }
        prev = Some(c);
    }
    None
}

/// The declaration keyword immediately before byte offset `pos`, if any.
///
/// Returns the scope and the byte offset where the keyword starts. Only
/// whitespace may sit between the keyword and `pos`.
pub fn keyword_before(line: &str, pos: usize) -> Option<(Scope, usize)> {
    let head = line[..pos].trim_end();
    if head.len() == pos {
        // `my$x` is not a declaration we rewrite.
        return None;
    }
    let word_start = head
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_word_char(*c))
        .last()
        .map(|(i, _)| i)?;
    let scope = Scope::from_keyword(&head[word_start..])?;

    let before = head[..word_start].chars().next_back();
    if before.is_some_and(|c| is_word_char(c) || pl2py_model::Sigil::is_sigil_char(c)) {
        return None;
    }
    Some((scope, word_start))
}

/// Whether a declaration keyword sits at statement position.
///
/// Statement position means line start, or just after `{` or `;`. This is
/// how a `my`/`our`/`sub` with no sigil is told apart from the same word
/// in prose.
pub fn has_leading_keyword(line: &str) -> bool {
    let mut quotes = QuoteState::new();
    let mut at_statement_start = true;

    for (i, c) in line.char_indices() {
        let scan = quotes.handle_char(c);
        if scan != Scan::Code {
            at_statement_start = false;
            continue;
        }
        if c.is_whitespace() {
            continue;
        }
        if at_statement_start && starts_with_keyword(&line[i..]) {
            return true;
        }
        at_statement_start = matches!(c, '{' | ';');
    }
    false
}

fn starts_with_keyword(rest: &str) -> bool {
    ["my", "our", "sub"].iter().any(|kw| {
        rest.starts_with(kw) && !rest[kw.len()..].chars().next().is_some_and(is_word_char)
    })
}
