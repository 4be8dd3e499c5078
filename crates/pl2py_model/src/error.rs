//! Errors raised by the translation passes.

use thiserror::Error;

/// A fatal translation failure for a single line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// A sigil character outside `$ @ % & *` was looked up.
    #[error("unsupported sigil: {0:?}")]
    UnsupportedSigil(char),

    /// A `my`/`our`/`sub` line that carries no sigil token at all.
    #[error("declaration without a sigil: {line}")]
    MalformedDeclaration { line: String },

    /// A postfix-conditional rewrite was requested on a line without the
    /// `<stmt> if <cond>;` shape.
    #[error("line does not match '<statement> if <condition>;': {line}")]
    UnrecognizedPostfixConditional { line: String },
}
