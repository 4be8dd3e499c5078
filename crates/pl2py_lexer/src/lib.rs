//! Character-level scanner for pl2py.
//!
//! Walks a line once, tracking quotes and bracket depth, and reports:
//!
//! - sigil tokens (`$name`, `@list`, `%map`, `&code`, `*glob`) with byte spans
//! - statement boundaries (top-level `;`)
//! - keyword positions (`if`/`unless` postfix, `my`/`our`/`sub` declarations)

mod quote;
mod statements;

pub use quote::{QuoteState, Scan};
pub use statements::{find_word_outside_quotes, has_leading_keyword, keyword_before, split_statements};

use pl2py_model::Sigil;

use crate::quote::is_word_char;

/// A sigil followed by an identifier, as found in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigilSpan {
    pub sigil: Sigil,
    pub name: String,
    /// Byte offset of the sigil character.
    pub start: usize,
    /// Byte offset just past the identifier.
    pub end: usize,
}

/// Find every sigil token in `line`.
///
/// A sigil counts when it is not preceded by a word character, `)` or `]`
/// (so `2*x` and `$a%b` are left alone), nor escaped with `\`, and is
/// followed by a letter or `_`.
/// Inside double quotes only `$` and `@` interpolate; inside single quotes
/// nothing does.
pub fn scan_sigils(line: &str) -> Vec<SigilSpan> {
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let mut spans = Vec::new();
    let mut quotes = QuoteState::new();
    let mut i = 0;

    while i < chars.len() {
        let (byte, c) = chars[i];
        let scan = quotes.handle_char(c);

        let interpolates = match scan {
            Scan::Code => true,
            Scan::Literal('"') => matches!(c, '$' | '@'),
            _ => false,
        };
        if !interpolates || !Sigil::is_sigil_char(c) {
            i += 1;
            continue;
        }

        let prev = i.checked_sub(1).map(|p| chars[p].1);
        if prev.is_some_and(|p| is_word_char(p) || matches!(p, ')' | ']' | '\\')) {
            i += 1;
            continue;
        }

        // `(*args` and `,*rest` are Python splats left by earlier rewrites.
        if c == '*' && matches!(prev, Some('(' | ',')) {
            i += 1;
            continue;
        }

        let ident_start = i + 1;
        let starts_ident = chars
            .get(ident_start)
            .is_some_and(|(_, n)| n.is_alphabetic() || *n == '_');
        if !starts_ident {
            i += 1;
            continue;
        }

        let mut j = ident_start;
        while j < chars.len() && is_word_char(chars[j].1) {
            j += 1;
        }
        let end = chars.get(j).map_or(line.len(), |(b, _)| *b);

        if let Ok(sigil) = Sigil::from_char(c) {
            spans.push(SigilSpan {
                sigil,
                name: line[chars[ident_start].0..end].to_string(),
                start: byte,
                end,
            });
        }
        // The identifier contains no quotes, so `quotes` stays in sync.
        i = j;
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn names(line: &str) -> Vec<String> {
        scan_sigils(line)
            .into_iter()
            .map(|s| format!("{}{}", s.sigil, s.name))
            .collect()
    }

    #[test]
    fn all_five_sigils() {
        assert_eq!(
            names("$scalar @array %hash &subroutine *typeblob"),
            vec!["$scalar", "@array", "%hash", "&subroutine", "*typeblob"]
        );
    }

    #[test]
    fn spans_are_byte_offsets() {
        let spans = scan_sigils("x = $foo;");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start, 4);
        assert_eq!(spans[0].end, 8);
        assert_eq!(spans[0].sigil, Sigil::Scalar);
    }

    #[test]
    fn arithmetic_is_not_a_sigil() {
        assert!(names("2*x").is_empty());
        assert!(names("$a%b").iter().all(|n| n != "%b"));
        assert!(names("f(x)*y").is_empty());
        assert!(names("user@example.com").is_empty());
    }

    #[test]
    fn double_star_yields_single_glob() {
        assert_eq!(names("def f(**args)"), vec!["*args"]);
    }

    #[test]
    fn splat_after_paren_is_not_a_glob() {
        assert!(names("def f(*args)").is_empty());
        assert_eq!(names("*glob"), vec!["*glob"]);
    }

    #[test]
    fn quotes_limit_interpolation() {
        assert_eq!(names(r#""hi $name %d""#), vec!["$name"]);
        assert!(names("'$literal'").is_empty());
    }

    #[test]
    fn digits_do_not_start_identifiers() {
        assert!(names("$1").is_empty());
        assert_eq!(names("$var123"), vec!["$var123"]);
    }

    proptest! {
        #[test]
        fn every_plain_token_is_found(
            tokens in proptest::collection::vec(("[$@%&*]", "[a-z_][a-z0-9_]{0,6}"), 1..6)
        ) {
            let line = tokens
                .iter()
                .map(|(s, n)| format!("{s}{n}"))
                .collect::<Vec<_>>()
                .join(" ");
            prop_assert_eq!(scan_sigils(&line).len(), tokens.len());
        }
    }
}
