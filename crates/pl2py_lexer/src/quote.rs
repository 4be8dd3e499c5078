//! Quote tracking shared by the scanners.

/// Classification of one character fed to [`QuoteState::handle_char`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// Outside any string literal.
    Code,
    /// An opening or closing quote character.
    Delimiter,
    /// Inside a literal opened by the given quote character.
    Literal(char),
}

/// State for tracking `"…"`, `'…'` and `` `…` `` literals across a line.
///
/// Backslash escapes are honoured inside literals. Perl's `q{}`/`qq{}`
/// operators and regex literals are not recognised.
#[derive(Debug, Default, Clone)]
pub struct QuoteState {
    open: Option<char>,
    escaped: bool,
}

impl QuoteState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_literal(&self) -> bool {
        self.open.is_some()
    }

    pub fn handle_char(&mut self, c: char) -> Scan {
        let Some(quote) = self.open else {
            if matches!(c, '"' | '\'' | '`') {
                self.open = Some(c);
                return Scan::Delimiter;
            }
            return Scan::Code;
        };

        if self.escaped {
            self.escaped = false;
            return Scan::Literal(quote);
        }
        if c == '\\' {
            self.escaped = true;
            return Scan::Literal(quote);
        }
        if c == quote {
            self.open = None;
            return Scan::Delimiter;
        }
        Scan::Literal(quote)
    }
}

pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(line: &str) -> Vec<Scan> {
        let mut state = QuoteState::new();
        line.chars().map(|c| state.handle_char(c)).collect()
    }

    #[test]
    fn tracks_double_quotes() {
        let scans = classify(r#"a"b"c"#);
        assert_eq!(
            scans,
            vec![
                Scan::Code,
                Scan::Delimiter,
                Scan::Literal('"'),
                Scan::Delimiter,
                Scan::Code
            ]
        );
    }

    #[test]
    fn escaped_quote_stays_inside() {
        let mut state = QuoteState::new();
        for c in r#""a\"b"#.chars() {
            state.handle_char(c);
        }
        assert!(state.in_literal());
    }

    #[test]
    fn other_quote_kind_does_not_close() {
        let scans = classify(r#"'a"b'"#);
        assert_eq!(scans[2], Scan::Literal('\''));
        assert_eq!(scans[4], Scan::Delimiter);
    }
}
