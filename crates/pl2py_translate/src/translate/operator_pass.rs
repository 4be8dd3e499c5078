//! Operator and statement translation pass.
//!
//! Runs on one statement at a time, in three phases:
//!
//! 1. substitutions: operators, loop control, `open`/`close`/`system`,
//!    arrow dereference
//! 2. postfix conditionals: `stmt if cond;` → `if cond: stmt;`
//! 3. statement calls: `print`, `die`, `warn`, `use`
//!
//! Phase 3 runs after phase 2 so that `print "x" if $d;` ends up as
//! `if $d: print(f"x");`.

use std::sync::LazyLock;

use log::debug;
use pl2py_lexer::find_word_outside_quotes;
use pl2py_model::{Options, TranslateError};
use regex::{Captures, Regex};

use super::rules::{apply_rules, Rule};

/// A double- or single-quoted literal, escape aware.
const STRING_LITERAL: &str = r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'"#;

static SUBSTITUTIONS: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::with(
            "match-bind",
            r"(?P<var>[$@%]?\w+)\s*=~\s*/(?P<pat>[^/]*)/(?P<end>[^\w/]|$)",
            |caps| regex_call("re.match", caps),
        ),
        Rule::with(
            "match-negated",
            r"(?P<var>[$@%]?\w+)\s*!~\s*/(?P<pat>[^/]*)/(?P<end>[^\w/]|$)",
            |caps| regex_call("re.search", caps),
        ),
        Rule::literal("eq", " eq ", " == "),
        Rule::literal("ne", " ne ", " != "),
        Rule::literal("lt", " lt ", " < "),
        Rule::literal("gt", " gt ", " > "),
        Rule::literal("le", " le ", " <= "),
        Rule::literal("ge", " ge ", " >= "),
        Rule::literal("or-assign", r" \|\|= ", " |= "),
        Rule::literal("and-assign", " &&= ", " &= "),
        Rule::literal("concat-assign", r" \.= ", " += "),
        Rule::literal("and", " && ", " and "),
        Rule::literal("or", r" \|\| ", " or "),
        Rule::literal("not", " ! ", " not "),
        Rule::literal("repeat", " x ", " * "),
        Rule::literal("concat", r" \. ", " + "),
        Rule::with(
            "loop-control",
            r"(?P<pre>^|[^\w$@%&*.>])(?P<kw>last|next|redo)\b",
            |caps| {
                let keyword = match &caps["kw"] {
                    "last" => "break",
                    "next" => "continue",
                    _ => "pass",
                };
                format!("{}{keyword}", &caps["pre"])
            },
        ),
        Rule::with(
            "open",
            r#"\bopen\s*\(\s*['"](?P<path>[^'"]*)['"]\s*,\s*['"](?P<mode>[^'"]*)['"]\s*\)"#,
            |caps| format!("open({}, \"{}\")", &caps["path"], &caps["mode"]),
        ),
        Rule::with(
            "close",
            r#"\bclose\s*\(\s*['"]?(?P<handle>[$\w]+)['"]?\s*\)"#,
            |caps| format!("{}.close()", &caps["handle"]),
        ),
        Rule::with(
            "system",
            r"(?P<pre>^|[^.\w])system\s*\((?P<args>[^()]*)\)",
            |caps| format!("{}os.system({})", &caps["pre"], caps["args"].trim()),
        ),
        Rule::with("arrow-key", r"->\{(?P<key>\w+)\}", |caps| {
            format!("[\"{}\"]", &caps["key"])
        })
        .outside_literals(),
        Rule::literal("arrow-index", r"->\[", "[").outside_literals(),
        Rule::with("arrow-call", r"->(?P<method>[A-Za-z_])", |caps| {
            format!(".{}", &caps["method"])
        })
        .outside_literals(),
    ]
});

static STATEMENT_CALLS: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::with(
            "use",
            r"^use\s+(?P<module>[\w:]+)(?P<rest>[^;]*);?\s*$",
            rewrite_use,
        ),
        Rule::with(
            "print",
            &format!(
                r#"(?P<lead>^|[{{;:]\s*)print\s+(?P<handle>(?:STDERR|STDOUT)\s+)?(?P<args>(?:{STRING_LITERAL}|\{{[^{{}};]*\}}|[^;{{}}"'])*?)\s*(?P<end>;|$)"#
            ),
            rewrite_print,
        ),
        Rule::with(
            "die",
            &format!(r"\bdie\s+(?P<msg>{STRING_LITERAL})(?:\s*;)?"),
            |caps| format!("raise Exception({})", &caps["msg"]),
        ),
        Rule::with(
            "warn",
            &format!(r"\bwarn\s+(?P<msg>{STRING_LITERAL})(?:\s*;)?"),
            |caps| format!("warnings.warn({})", &caps["msg"]),
        ),
    ]
});

/// `$name` plus any `{key}`, `[idx]` or `->{key}` subscripts after it.
static INTERPOLATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\$(?P<name>[A-Za-z_]\w*)(?P<subs>(?:(?:->)?(?:\{[^{}"]*\}|\[[^\[\]"]*\]))*)"#,
    )
    .expect("static pattern")
});

static SUBSCRIPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:->)?(?:\{(?P<key>[^{}"]*)\}|\[(?P<idx>[^\[\]"]*)\])"#)
        .expect("static pattern")
});

fn regex_call(func: &str, caps: &Captures<'_>) -> String {
    let var = &caps["var"];
    format!("{var} = {func}(r\"{}\", {var}){}", &caps["pat"], &caps["end"])
}

fn rewrite_use(caps: &Captures<'_>) -> String {
    let module = &caps["module"];
    let rest = caps["rest"].trim();
    match module {
        "strict" => "import sys".to_string(),
        "warnings" => "import warnings".to_string(),
        "lib" if !rest.is_empty() => format!("sys.path.insert(0, {rest})"),
        // `use 5.010;` and friends have no Python counterpart.
        _ if module.starts_with(|c: char| c.is_ascii_digit()) => format!("# {}", &caps[0]),
        _ => format!("import {}", module.replace("::", ".")),
    }
}

fn rewrite_print(caps: &Captures<'_>) -> String {
    let args = caps["args"].trim();
    let args = match args.chars().next() {
        Some('"') => format!("f{}", interpolate_leading_literal(args)),
        Some('\'') => format!("f{args}"),
        _ => args.to_string(),
    };
    let target = match caps.name("handle").map(|h| h.as_str().trim()) {
        Some("STDERR") => ", file=sys.stderr",
        _ => "",
    };
    format!("{}print({args}{target}){}", &caps["lead"], &caps["end"])
}

/// Turn `$name` into `{name}` inside the first double-quoted literal.
fn interpolate_leading_literal(args: &str) -> String {
    let mut escaped = false;
    let close = args
        .char_indices()
        .skip(1)
        .find(|&(_, c)| {
            let hit = c == '"' && !escaped;
            escaped = c == '\\' && !escaped;
            hit
        })
        .map_or(args.len(), |(i, _)| i + 1);

    let (literal, rest) = args.split_at(close);
    let literal = INTERPOLATION.replace_all(literal, |caps: &Captures<'_>| {
        format!("{{{}{}}}", &caps["name"], python_subscripts(&caps["subs"]))
    });
    format!("{literal}{rest}")
}

/// `{key}{'k'}[$i]` → `['key']['k'][i]`, quoted with `'` so the result can
/// sit inside a `"`-delimited f-string.
fn python_subscripts(subs: &str) -> String {
    SUBSCRIPT
        .captures_iter(subs)
        .map(|caps| {
            let index = if let Some(key) = caps.name("key") {
                let key = key.as_str().trim();
                if !key.is_empty() && key.chars().all(|c| c.is_alphanumeric() || c == '_') {
                    format!("'{key}'")
                } else {
                    key.trim_start_matches('$').to_string()
                }
            } else {
                caps.name("idx")
                    .map_or("", |idx| idx.as_str().trim().trim_start_matches('$'))
                    .to_string()
            };
            format!("[{index}]")
        })
        .collect()
}

/// A statement split around its postfix `if` / `unless`.
struct Postfix<'a> {
    statement: &'a str,
    condition: &'a str,
    negated: bool,
}

impl Postfix<'_> {
    fn render(&self, statement: &str) -> String {
        if self.negated {
            format!("if not ({}): {statement};", self.condition)
        } else {
            format!("if {}: {statement};", self.condition)
        }
    }
}

fn split_postfix(line: &str) -> Option<Postfix<'_>> {
    let trimmed = line.trim();
    let body = trimmed.strip_suffix(';').unwrap_or(trimmed).trim_end();

    let (pos, keyword_len, negated) = [("if", false), ("unless", true)]
        .into_iter()
        .filter_map(|(kw, negated)| {
            find_word_outside_quotes(body, kw).map(|pos| (pos, kw.len(), negated))
        })
        .min_by_key(|(pos, _, _)| *pos)?;

    let statement = body[..pos].trim();
    let condition = body[pos + keyword_len..].trim();
    if statement.is_empty() || condition.is_empty() {
        return None;
    }
    Some(Postfix {
        statement,
        condition,
        negated,
    })
}

/// Whether the statement ends in a postfix `if`/`unless` clause.
///
/// Block headers (`if (...) {`, `} else {`, loops) are not postfix forms.
pub fn has_postfix_conditional(line: &str) -> bool {
    let trimmed = line.trim();
    let first_word: String = trimmed
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    let block_header = matches!(
        first_word.as_str(),
        "if" | "unless" | "elsif" | "else" | "while" | "until" | "for" | "foreach"
    );
    if block_header || trimmed.starts_with('}') || trimmed.ends_with('{') {
        return false;
    }
    split_postfix(trimmed).is_some()
}

/// Rewrite `STMT if COND;` as `if COND: STMT;`.
///
/// `STMT unless COND;` becomes `if not (COND): STMT;`. Callers are expected
/// to have checked [`has_postfix_conditional`]; any other shape is an error.
pub fn convert_postfix_if(line: &str) -> Result<String, TranslateError> {
    let postfix =
        split_postfix(line).ok_or_else(|| TranslateError::UnrecognizedPostfixConditional {
            line: line.to_string(),
        })?;
    Ok(postfix.render(postfix.statement))
}

/// Translate operators and statement forms in one statement.
pub fn translate_operators(line: &str, options: &Options) -> String {
    run(line, options, &mut Vec::new())
}

pub(super) fn run(line: &str, options: &Options, applied: &mut Vec<&'static str>) -> String {
    let text = apply_rules(&SUBSTITUTIONS, line, applied);

    if options.postfix_conditionals && has_postfix_conditional(&text) {
        if let Some(postfix) = split_postfix(&text) {
            debug!(statement = postfix.statement, condition = postfix.condition; "postfix conditional");
            applied.push(if postfix.negated { "postfix-unless" } else { "postfix-if" });
            let statement = apply_rules(&STATEMENT_CALLS, postfix.statement, applied);
            return postfix.render(&statement);
        }
    }

    apply_rules(&STATEMENT_CALLS, &text, applied)
}
