//! Front matter for translated modules.
//!
//! Preparing a Perl script produces an intermediate document:
//!
//! ```text
//! #!/usr/bin/env python3
//!
//! """
//! <extracted documentation>
//! """
//! __all__ = []
//! __author__ = "..."
//! =====Start Converting Now=====
//! <original Perl source>
//! ```
//!
//! which the line driver then translates below the sentinel.

use std::io::Write;
use std::path::Path;
use std::process::Command;

use log::{debug, info};
use pl2py_model::{LineKind, SourceLine, SENTINEL};
use serde::{Deserialize, Serialize};

use crate::DriverError;

/// Source of the module docstring.
pub trait DocExtractor {
    fn extract(&self, path: &Path, source: &str) -> Result<String, DriverError>;
}

/// Collects the script's POD blocks without leaving the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct PodExtractor;

impl DocExtractor for PodExtractor {
    fn extract(&self, _path: &Path, source: &str) -> Result<String, DriverError> {
        let mut doc = Vec::new();
        let mut in_pod = false;
        for raw in source.lines() {
            let line = SourceLine::new(raw);
            if line.is_pod_end() {
                in_pod = false;
                continue;
            }
            if !in_pod && line.kind() == LineKind::DocBoundary && !line.is_sentinel() {
                in_pod = true;
            }
            if in_pod {
                doc.push(line.raw());
            }
        }
        Ok(doc.join("\n"))
    }
}

/// Runs `perldoc <path>` and captures what it prints.
#[derive(Debug, Clone)]
pub struct PerldocCommand {
    program: String,
}

impl PerldocCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for PerldocCommand {
    fn default() -> Self {
        Self::new("perldoc")
    }
}

impl DocExtractor for PerldocCommand {
    fn extract(&self, path: &Path, _source: &str) -> Result<String, DriverError> {
        debug!(program = self.program.as_str(), path = path.display().to_string(); "running perldoc");
        let output = Command::new(&self.program)
            .arg(path)
            .output()
            .map_err(|e| DriverError::Extractor(format!("failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            return Err(DriverError::Extractor(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Optional module dunders.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub author: Option<String>,
    pub version: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatter {
    pub doc: String,
    pub metadata: Metadata,
}

impl FrontMatter {
    pub fn new(doc: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            doc: doc.into(),
            metadata,
        }
    }

    /// Python module header, ending with the sentinel line.
    pub fn render(&self) -> String {
        let doc = self.doc.trim_end().replace(r#"""""#, r#"\"\"\""#);
        let mut out = String::from("#!/usr/bin/env python3\n\n");
        out.push_str(&format!("\"\"\"\n{doc}\n\"\"\"\n"));
        out.push_str("__all__ = []\n");

        let dunders = [
            ("__author__", &self.metadata.author),
            ("__date__", &self.metadata.date),
            ("__version__", &self.metadata.version),
        ];
        for (name, value) in dunders {
            if let Some(value) = value {
                out.push_str(&format!("{name} = {}\n", python_string(value)));
            }
        }

        out.push_str(SENTINEL);
        out.push('\n');
        out
    }
}

/// Double-quoted Python string literal for `value`.
///
/// Printable characters, non-ASCII included, are kept as they are. Control
/// characters use Python's `\xNN` / `\uNNNN` / `\UNNNNNNNN` escapes.
fn python_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let code = u32::from(c);
                if code <= 0xff {
                    out.push_str(&format!("\\x{code:02x}"));
                } else if code <= 0xffff {
                    out.push_str(&format!("\\u{code:04x}"));
                } else {
                    out.push_str(&format!("\\U{code:08x}"));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Write the front matter for `source`, then `source` itself.
pub fn prepare_document<W: Write>(
    path: &Path,
    source: &str,
    extractor: &dyn DocExtractor,
    metadata: &Metadata,
    mut writer: W,
) -> Result<(), DriverError> {
    let doc = extractor.extract(path, source)?;
    let front = FrontMatter::new(doc, metadata.clone());

    writer.write_all(front.render().as_bytes())?;
    writer.write_all(source.as_bytes())?;
    if !source.is_empty() && !source.ends_with('\n') {
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    info!(path = path.display().to_string(); "front matter prepared");
    Ok(())
}
