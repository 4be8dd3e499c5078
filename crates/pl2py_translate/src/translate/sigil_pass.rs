//! Sigil resolution pass.
//!
//! Steps, in order. Every step before the last still needs the sigils:
//!
//! 1. block initializers: `my @a = (1, 2)` → `a: List[Any] = [1, 2];`
//! 2. container access: `$h{k}` → `h[k]`, `$#a` → `len(a) - 1`
//! 3. declarations: `my $x` → `x: Any`, `our $x` → `X: Any`,
//!    `sub $f` → `def f(**args): Callable[..., Any]`
//! 4. implicit arguments: `shift` → `args.pop(0)`, `@_` → `args`
//! 5. strip whatever sigils remain

use std::sync::LazyLock;

use log::warn;
use pl2py_lexer::{has_leading_keyword, keyword_before, scan_sigils};
use pl2py_model::{Options, Sigil, SigilToken, TranslateError};
use regex::Captures;

use super::rules::{apply_rules, Rule};

static INITIALIZERS: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::with(
            "array-literal",
            r"^(?P<scope>my|our)\s+@(?P<name>\w+)\s*=\s*\((?P<items>.*)\)\s*;?\s*$",
            |caps| {
                format!(
                    "{}: {} = [{}];",
                    scoped_name(caps),
                    Sigil::Array.type_hint(),
                    &caps["items"]
                )
            },
        ),
        Rule::with(
            "hash-literal",
            r"^(?P<scope>my|our)\s+%(?P<name>\w+)\s*=\s*\((?P<items>.*)\)\s*;?\s*$",
            |caps| {
                format!(
                    "{}: {} = {{{}}};",
                    scoped_name(caps),
                    Sigil::Hash.type_hint(),
                    caps["items"].replace("=>", ":")
                )
            },
        ),
        Rule::with(
            "group-assign",
            r"^(?:my|our)\s*\((?P<names>[^)]*)\)\s*=\s*(?P<rhs>.+?)\s*;?\s*$",
            |caps| format!("{} = {};", bare_names(&caps["names"]), &caps["rhs"]),
        ),
        Rule::with(
            "group-local",
            r"^my\s*\((?P<names>[^)]*)\)\s*;?\s*$",
            |caps| typed_names(&caps["names"]),
        ),
        Rule::with(
            "group-global",
            r"^our\s*\((?P<names>[^)]*)\)\s*;?\s*$",
            |caps| format!("global {}", bare_names(&caps["names"])),
        ),
    ]
});

static CONTAINER_ACCESS: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::with(
            "keyed-access",
            r"\$(?P<name>\w+)(?P<keys>(?:\{[^{}]*\})+)",
            |caps| {
                let keys = caps["keys"].replace('{', "[").replace('}', "]");
                format!("{}{keys}", &caps["name"])
            },
        ),
        Rule::with("last-index", r"\$#(?P<name>[A-Za-z_]\w*)", |caps| {
            format!("len({}) - 1", &caps["name"])
        }),
    ]
});

static IMPLICIT_ARGS: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::with(
            "shift-array",
            r"(?P<pre>^|[^\w$@%&*.>])shift(?:\s*\(\s*@(?P<paren>\w+)\s*\)|\s+@(?P<bare>\w+))",
            |caps| {
                let array = caps
                    .name("paren")
                    .or_else(|| caps.name("bare"))
                    .map_or("_", |m| m.as_str());
                format!("{}{}.pop(0)", &caps["pre"], args_name(array))
            },
        ),
        Rule::with("shift", r"(?P<pre>^|[^\w$@%&*.>])shift\b", |caps| {
            format!("{}args.pop(0)", &caps["pre"])
        }),
        Rule::literal("arg-index", r"\$_\[", "args["),
        Rule::literal("arg-list", r"@_\b", "args"),
    ]
});

fn scoped_name(caps: &Captures<'_>) -> String {
    let name = &caps["name"];
    if &caps["scope"] == "our" {
        name.to_uppercase()
    } else {
        name.to_string()
    }
}

/// `$a, @b` → `a, b`
fn bare_names(list: &str) -> String {
    list.split(',')
        .map(|name| name.trim().trim_start_matches(Sigil::is_sigil_char))
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `$a, @b` → `a: Any; b: List[Any];`
fn typed_names(list: &str) -> String {
    let declarations: Vec<String> = list
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            let mut chars = name.chars();
            match chars.next().map(Sigil::from_char) {
                Some(Ok(sigil)) => format!("{}: {}", chars.as_str(), sigil.type_hint()),
                _ => format!("{name}: Any"),
            }
        })
        .collect();
    format!("{};", declarations.join("; "))
}

fn args_name(array: &str) -> &str {
    if array == "_" {
        "args"
    } else {
        array
    }
}

/// Rewrite `my`/`our`/`sub` + sigil into typed Python declarations.
fn rewrite_declarations(
    line: &str,
    options: &Options,
    applied: &mut Vec<&'static str>,
) -> Result<String, TranslateError> {
    let spans = scan_sigils(line);
    let bound: Vec<_> = spans
        .iter()
        .filter_map(|span| keyword_before(line, span.start).map(|(scope, start)| (span, scope, start)))
        .collect();

    if bound.is_empty() && !has_leading_keyword(line) {
        return Ok(line.to_string());
    }
    if spans.is_empty() {
        if options.strict_declarations {
            return Err(TranslateError::MalformedDeclaration {
                line: line.to_string(),
            });
        }
        warn!(line; "declaration without a sigil passed through");
        return Ok(line.to_string());
    }

    let mut result = line.to_string();
    // Right to left so earlier byte offsets stay valid.
    for (span, scope, start) in bound.iter().rev() {
        let token = SigilToken::new(span.sigil, span.name.as_str(), *scope);
        result.replace_range(*start..span.end, &token.declaration());
    }
    if !bound.is_empty() {
        applied.push("declaration");
    }
    Ok(result)
}

/// Drop the sigil from every remaining sigil token.
///
/// Stripping already-stripped text changes nothing.
pub fn strip_sigils(line: &str) -> String {
    let spans = scan_sigils(line);
    let mut out = String::with_capacity(line.len());
    let mut last = 0;
    for span in &spans {
        out.push_str(&line[last..span.start]);
        // Sigils are single-byte ASCII.
        last = span.start + 1;
    }
    out.push_str(&line[last..]);
    out
}

/// Resolve sigils in one statement.
pub fn resolve_sigils(line: &str, options: &Options) -> Result<String, TranslateError> {
    run(line, options, &mut Vec::new())
}

pub(super) fn run(
    line: &str,
    options: &Options,
    applied: &mut Vec<&'static str>,
) -> Result<String, TranslateError> {
    let text = apply_rules(&INITIALIZERS, line.trim(), applied);
    let text = apply_rules(&CONTAINER_ACCESS, &text, applied);
    let text = rewrite_declarations(&text, options, applied)?;
    let text = apply_rules(&IMPLICIT_ARGS, &text, applied);
    Ok(strip_sigils(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn resolve(line: &str) -> String {
        resolve_sigils(line, &Options::default()).unwrap()
    }

    #[test]
    fn strip_every_sigil_kind() {
        assert_eq!(
            strip_sigils("$scalar @array %hash &subroutine *typeblob"),
            "scalar array hash subroutine typeblob"
        );
        assert_eq!(strip_sigils("$var123 @arr456 %hash789"), "var123 arr456 hash789");
        assert_eq!(strip_sigils("^invalid_sigil"), "^invalid_sigil");
        assert_eq!(strip_sigils(""), "");
    }

    #[test]
    fn strip_is_idempotent_on_function_heads() {
        let once = strip_sigils("def f(**args): Callable[..., Any] {");
        assert_eq!(once, "def f(*args): Callable[..., Any] {");
        assert_eq!(strip_sigils(&once), once);
    }

    proptest! {
        #[test]
        fn strip_twice_equals_strip_once(
            words in proptest::collection::vec(("[$@%&*]?", "[a-z_][a-z0-9_]{0,5}"), 0..8)
        ) {
            let line = words
                .iter()
                .map(|(s, n)| format!("{s}{n}"))
                .collect::<Vec<_>>()
                .join(" ");
            let once = strip_sigils(&line);
            prop_assert_eq!(strip_sigils(&once), once.clone());
            prop_assert!(scan_sigils(&once).is_empty());
        }
    }

    #[test]
    fn shift_declaration() {
        assert_eq!(resolve("my $var = shift;"), "var: Any = args.pop(0);");
    }

    #[test]
    fn global_declaration_upper_cases() {
        assert_eq!(resolve("our $global_var = 42;"), "GLOBAL_VAR: Any = 42;");
        assert_eq!(resolve("our @list;"), "LIST: List[Any];");
    }

    #[test]
    fn local_declaration() {
        assert_eq!(resolve("my $local_var = 'hello';"), "local_var: Any = 'hello';");
        assert_eq!(resolve("for (my $i=0; $i<=$n; $i++) {"), "for (i: Any=0; i<=n; i++) {");
    }

    #[test]
    fn array_and_hash_literals() {
        assert_eq!(resolve("my @array = (1, 2, 3);"), "array: List[Any] = [1, 2, 3];");
        assert_eq!(resolve("our @names = ($a, $b)"), "NAMES: List[Any] = [a, b];");
        assert_eq!(
            resolve("my %hash = ('key' => 'value');"),
            "hash: Dict[Any, Any] = {'key' : 'value'};"
        );
    }

    #[test]
    fn keyed_access() {
        assert_eq!(resolve("$value = $hash{'key'};"), "value = hash['key'];");
        assert_eq!(resolve("print($h{'key'} . 'x')"), "print(h['key'] . 'x')");
        assert_eq!(resolve("$n = $#ARGV;"), "n = len(ARGV) - 1;");
        assert_eq!(resolve("$v = $h{'a'}{'b'};"), "v = h['a']['b'];");
        assert_eq!(resolve("$v = $h{$i}{x}{$j};"), "v = h[i][x][j];");
    }

    #[test]
    fn subroutine_declarations() {
        assert_eq!(
            resolve("sub $func_name {"),
            "def func_name(*args): Callable[..., Any] {"
        );
        assert_eq!(
            resolve("sub $func_name { my $var1 = shift; my $var2 = shift; }"),
            "def func_name(*args): Callable[..., Any] { var1: Any = args.pop(0); var2: Any = args.pop(0); }"
        );
    }

    #[test]
    fn calls_and_indexing() {
        assert_eq!(
            resolve("$result = $func_name($arg1, $arg2);"),
            "result = func_name(arg1, arg2);"
        );
        assert_eq!(resolve("$value = $array[0];"), "value = array[0];");
        assert_eq!(resolve("&subroutine($arg1, $arg2);"), "subroutine(arg1, arg2);");
    }

    #[test]
    fn group_declarations() {
        assert_eq!(resolve("our (var1, var2);"), "global var1, var2");
        assert_eq!(resolve("our($debug, $file);"), "global debug, file");
        assert_eq!(resolve("my ($self, $x) = @_;"), "self, x = args;");
        assert_eq!(resolve("my ($x, $y);"), "x: Any; y: Any;");
        assert_eq!(resolve("my ($n, @list, %seen)"), "n: Any; list: List[Any]; seen: Dict[Any, Any];");
    }

    #[test]
    fn implicit_arguments() {
        assert_eq!(resolve("my $first = shift @ARGV;"), "first: Any = ARGV.pop(0);");
        assert_eq!(resolve("my $self = shift(@_);"), "self: Any = args.pop(0);");
        assert_eq!(resolve("$x = $_[1];"), "x = args[1];");
        assert_eq!(resolve("$n = scalar(@_);"), "n = scalar(args);");
        assert_eq!(resolve("$q->shift"), "q->shift");
    }

    #[test]
    fn declaration_without_sigil_is_an_error() {
        let err = resolve_sigils("my x = 5;", &Options::default()).unwrap_err();
        assert_eq!(
            err,
            TranslateError::MalformedDeclaration {
                line: "my x = 5;".to_string()
            }
        );
    }

    #[test]
    fn lenient_mode_passes_malformed_declaration() {
        let options = Options {
            strict_declarations: false,
            ..Options::default()
        };
        assert_eq!(resolve_sigils("sub usage {", &options).unwrap(), "sub usage {");
    }

    #[test]
    fn prose_mentioning_my_is_not_a_declaration() {
        assert_eq!(
            resolve(r#"raise Exception("my file")"#),
            r#"raise Exception("my file")"#
        );
    }
}
