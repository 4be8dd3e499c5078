//! Per-line translation: split into statements, run both passes on each.

mod operator_pass;
mod rules;
mod sigil_pass;

use log::debug;
use pl2py_lexer::split_statements;
use pl2py_model::{Options, TranslateError};

pub use operator_pass::{convert_postfix_if, has_postfix_conditional, translate_operators};
pub use sigil_pass::{resolve_sigils, strip_sigils};

/// Output of [`translate_line`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    /// Python text. One statement per line when the input held several.
    pub text: String,
    /// Names of the rules that fired, in firing order.
    pub applied: Vec<&'static str>,
}

/// Translate one line of Perl code.
///
/// The line should already be known to be code: blank lines, comments
/// and POD are the driver's business.
pub fn translate_line(line: &str, options: &Options) -> Result<Translation, TranslateError> {
    let pieces = if options.split_statements {
        split_statements(line)
    } else {
        vec![line.trim().to_string()]
    };

    let mut applied = Vec::new();
    let mut out = Vec::with_capacity(pieces.len());
    for piece in &pieces {
        if piece.starts_with('#') {
            out.push(piece.clone());
            continue;
        }
        let text = operator_pass::run(piece, options, &mut applied);
        out.push(sigil_pass::run(&text, options, &mut applied)?);
    }

    let text = out.join("\n");
    debug!(input = line, output = text.as_str(), rules = applied.len(); "translated line");
    Ok(Translation { text, applied })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pl2py_lexer::scan_sigils;
    use proptest::prelude::*;

    fn translate(line: &str) -> String {
        translate_line(line, &Options::default()).unwrap().text
    }

    #[test]
    fn subroutine_on_one_line() {
        assert_eq!(
            translate("sub $greet { my $name = shift; print $name; }"),
            "def greet(*args): Callable[..., Any] { name: Any = args.pop(0); print(name); }"
        );
    }

    #[test]
    fn statements_are_split_onto_lines() {
        assert_eq!(
            translate("my $var = 5; print $var;"),
            "var: Any = 5;\nprint(var);"
        );
        assert_eq!(translate("$x = 1; # set x"), "x = 1;\n# set x");
    }

    #[test]
    fn splitting_can_be_disabled() {
        let options = Options {
            split_statements: false,
            ..Options::default()
        };
        let out = translate_line("my $a = 1; my $b = 2;", &options).unwrap();
        assert_eq!(out.text, "a: Any = 1; b: Any = 2;");
    }

    #[test]
    fn postfix_print_with_interpolation() {
        assert_eq!(
            translate(r#"print "Hi $name\n" if $debug;"#),
            r#"if debug: print(f"Hi {name}\n");"#
        );
        assert_eq!(translate("usage() unless $ok;"), "if not (ok): usage();");
    }

    #[test]
    fn print_of_keyed_access() {
        assert_eq!(translate("print $h{'key'};"), "print(h['key']);");
        assert_eq!(
            translate(r#"print $hash{$k}, "\n";"#),
            r#"print(hash[k], "\n");"#
        );
        assert_eq!(
            translate(r#"print "Name: $self->{name}\n";"#),
            r#"print(f"Name: {self['name']}\n");"#
        );
    }

    #[test]
    fn method_named_like_loop_control() {
        assert_eq!(translate("$s = $obj->last;"), "s = obj.last;");
    }

    #[test]
    fn operators_then_sigils() {
        assert_eq!(translate("if ($a eq $b) {"), "if (a == b) {");
        assert_eq!(translate("$s .= 'x';"), "s += 'x';");
        assert_eq!(translate("$self->{DEBUG} = 1;"), r#"self["DEBUG"] = 1;"#);
        assert_eq!(
            translate("my %opts = (debug => 0);"),
            "opts: Dict[Any, Any] = {debug : 0};"
        );
    }

    #[test]
    fn applied_rules_are_reported() {
        let out = translate_line("my $n = shift;", &Options::default()).unwrap();
        assert_eq!(out.applied, vec!["declaration", "shift"]);
    }

    #[test]
    fn malformed_declaration_surfaces() {
        assert!(matches!(
            translate_line("my x = 5;", &Options::default()),
            Err(TranslateError::MalformedDeclaration { .. })
        ));
    }

    #[test]
    fn unknown_syntax_passes_through() {
        assert_eq!(translate("frobnicate(1, 2)"), "frobnicate(1, 2)");
    }

    proptest! {
        #[test]
        fn no_sigil_survives_translation(
            words in proptest::collection::vec(("[$@%&*]?", "v[a-z0-9_]{0,5}"), 1..8)
        ) {
            let line = words
                .iter()
                .map(|(s, n)| format!("{s}{n}"))
                .collect::<Vec<_>>()
                .join(" ");
            let out = translate_line(&line, &Options::default()).unwrap();
            prop_assert!(scan_sigils(&out.text).is_empty());
        }
    }
}
