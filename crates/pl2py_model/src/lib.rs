//! Data model for pl2py.
//!
//! The translator has no persistent entities. What lives here:
//! - [`Sigil`] and the static sigil → Python type-hint table
//! - [`Scope`] and [`SigilToken`] for declarations (`my`, `our`, `sub`)
//! - [`SourceLine`] / [`LineKind`] line classification
//! - [`Options`] feature flags, loaded from config by the CLI

pub mod error;

pub use error::TranslateError;

use serde::{Deserialize, Serialize};

/// Marker line separating preserved front matter from translatable code.
///
/// Emitted exactly once by the front-matter preparer and consumed by the
/// line driver.
pub const SENTINEL: &str = "=====Start Converting Now=====";

/// The closed five-symbol sigil alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sigil {
    /// `$` scalar.
    Scalar,
    /// `@` array.
    Array,
    /// `%` hash.
    Hash,
    /// `&` subroutine.
    Code,
    /// `*` typeglob (symbol-table entry).
    Glob,
}

const SIGIL_TYPES: [(char, Sigil, &str); 5] = [
    ('$', Sigil::Scalar, "Any"),
    ('@', Sigil::Array, "List[Any]"),
    ('%', Sigil::Hash, "Dict[Any, Any]"),
    ('&', Sigil::Code, "Callable[..., Any]"),
    ('*', Sigil::Glob, "Any"),
];

impl Sigil {
    pub const ALL: [Sigil; 5] = [
        Sigil::Scalar,
        Sigil::Array,
        Sigil::Hash,
        Sigil::Code,
        Sigil::Glob,
    ];

    pub fn from_char(c: char) -> Result<Self, TranslateError> {
        SIGIL_TYPES
            .iter()
            .find(|(ch, _, _)| *ch == c)
            .map(|(_, sigil, _)| *sigil)
            .ok_or(TranslateError::UnsupportedSigil(c))
    }

    pub fn as_char(self) -> char {
        match self {
            Sigil::Scalar => '$',
            Sigil::Array => '@',
            Sigil::Hash => '%',
            Sigil::Code => '&',
            Sigil::Glob => '*',
        }
    }

    /// Python type annotation for a container of this kind.
    pub fn type_hint(self) -> &'static str {
        SIGIL_TYPES
            .iter()
            .find(|(_, sigil, _)| *sigil == self)
            .map(|(_, _, hint)| *hint)
            .unwrap_or("Any")
    }

    pub fn is_sigil_char(c: char) -> bool {
        SIGIL_TYPES.iter().any(|(ch, _, _)| *ch == c)
    }
}

impl std::fmt::Display for Sigil {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl TryFrom<char> for Sigil {
    type Error = TranslateError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        Sigil::from_char(c)
    }
}

/// Look up the type hint for a raw sigil character.
pub fn type_hint(c: char) -> Result<&'static str, TranslateError> {
    Sigil::from_char(c).map(Sigil::type_hint)
}

/// Declaration scope introduced by a keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// `my`
    Local,
    /// `our`, named in upper case on the Python side.
    Global,
    /// `sub`
    Subroutine,
}

impl Scope {
    pub fn keyword(self) -> &'static str {
        match self {
            Scope::Local => "my",
            Scope::Global => "our",
            Scope::Subroutine => "sub",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "my" => Some(Scope::Local),
            "our" => Some(Scope::Global),
            "sub" => Some(Scope::Subroutine),
            _ => None,
        }
    }
}

/// A sigil-bearing identifier bound by a declaration keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigilToken {
    pub sigil: Sigil,
    pub name: String,
    pub scope: Scope,
}

impl SigilToken {
    pub fn new(sigil: Sigil, name: impl Into<String>, scope: Scope) -> Self {
        Self {
            sigil,
            name: name.into(),
            scope,
        }
    }

    /// Python text replacing `<keyword> <sigil><name>`.
    pub fn declaration(&self) -> String {
        match self.scope {
            Scope::Local => format!("{}: {}", self.name, self.sigil.type_hint()),
            Scope::Global => format!("{}: {}", self.name.to_uppercase(), self.sigil.type_hint()),
            Scope::Subroutine => format!("def {}(**args): {}", self.name, Sigil::Code.type_hint()),
        }
    }
}

/// How the driver treats a physical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Blank,
    /// First non-blank character is `#`.
    Comment,
    /// A POD directive (`=head1`, `=cut`, ...) or the [`SENTINEL`].
    DocBoundary,
    Code,
}

/// One physical input line and its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine<'a> {
    raw: &'a str,
    kind: LineKind,
}

impl<'a> SourceLine<'a> {
    pub fn new(raw: &'a str) -> Self {
        let raw = raw.trim_end_matches(['\n', '\r']);
        let trimmed = raw.trim();
        let kind = if trimmed.is_empty() {
            LineKind::Blank
        } else if trimmed.starts_with('#') {
            LineKind::Comment
        } else if trimmed == SENTINEL || is_pod_directive(raw) {
            LineKind::DocBoundary
        } else {
            LineKind::Code
        };
        Self { raw, kind }
    }

    /// The line without its terminator, otherwise untouched.
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    pub fn trimmed(&self) -> &'a str {
        self.raw.trim()
    }

    pub fn kind(&self) -> LineKind {
        self.kind
    }

    pub fn is_sentinel(&self) -> bool {
        self.trimmed() == SENTINEL
    }

    pub fn is_pod_end(&self) -> bool {
        self.kind == LineKind::DocBoundary && self.raw.starts_with("=cut")
    }
}

/// POD directives start in column 0 with `=` followed by a letter.
fn is_pod_directive(raw: &str) -> bool {
    let mut chars = raw.chars();
    chars.next() == Some('=') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
}

/// Feature flags controlling which rewrites the translator applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Split `a; b;` into one output line per statement.
    pub split_statements: bool,
    /// Rewrite `stmt if cond;` / `stmt unless cond;`.
    pub postfix_conditionals: bool,
    /// Abort on declarations without a sigil instead of passing them through.
    pub strict_declarations: bool,
    /// Copy lines verbatim until the [`SENTINEL`] is seen.
    pub require_sentinel: bool,
    /// Copy POD blocks in the translated region verbatim.
    pub pod_passthrough: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            split_statements: true,
            postfix_conditionals: true,
            strict_declarations: true,
            require_sentinel: true,
            pod_passthrough: true,
        }
    }
}
