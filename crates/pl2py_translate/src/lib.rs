//! Line-level Perl → Python rewriting.
//!
//! Two passes run on every statement, always in this order:
//!
//! 1. Operator & statement translation: `eq` → `==`, `=~` → `re.match`,
//!    `last` → `break`, `print` → `print(...)`, postfix `if`, ...
//! 2. Sigil resolution: `my @a = (...)` → `a: List[Any] = [...]`,
//!    `$h{k}` → `h[k]`, `shift` → `args.pop(0)`, then every remaining
//!    sigil is dropped.
//!
//! Several operator rules look for `$var` operands, so the sigils must
//! still be in the text when pass 1 runs.

pub mod translate;

pub use translate::{
    convert_postfix_if, has_postfix_conditional, resolve_sigils, strip_sigils, translate_line,
    translate_operators, Translation,
};
