//! Document-level driver.
//!
//! A document has two regions separated by the sentinel line
//! `=====Start Converting Now=====`. Everything above it is front matter and
//! is copied verbatim. Everything below is translated line by line.
//!
//! ```text
//! DocPassthrough --(sentinel)--> Translating
//! ```
//!
//! With `require_sentinel = false` the driver starts in `Translating`.

mod error;
pub mod front_matter;

pub use error::DriverError;
pub use front_matter::{
    prepare_document, DocExtractor, FrontMatter, Metadata, PerldocCommand, PodExtractor,
};

use std::io::{BufRead, Write};

use log::{debug, info, trace};
use pl2py_model::{LineKind, Options, SourceLine};
use pl2py_translate::translate_line;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Lines are copied unchanged.
    DocPassthrough,
    /// Code lines go through the translator.
    Translating,
}

/// Result of feeding one line to the driver.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Step {
    /// Text to write, without a terminator. `None` for the sentinel.
    pub output: Option<String>,
    /// Rules that fired. Empty unless the line was translated.
    pub applied: Vec<&'static str>,
    pub translated: bool,
}

impl Step {
    fn copied(text: &str) -> Self {
        Self {
            output: Some(text.to_string()),
            ..Self::default()
        }
    }

    fn consumed() -> Self {
        Self::default()
    }
}

/// Per-line state machine.
#[derive(Debug)]
pub struct LineDriver<'o> {
    options: &'o Options,
    mode: Mode,
    in_pod: bool,
    line_number: usize,
}

impl<'o> LineDriver<'o> {
    pub fn new(options: &'o Options) -> Self {
        let mode = if options.require_sentinel {
            Mode::DocPassthrough
        } else {
            Mode::Translating
        };
        Self {
            options,
            mode,
            in_pod: false,
            line_number: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Number of lines processed so far.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Feed the next physical line.
    pub fn process(&mut self, raw: &str) -> Result<Step, DriverError> {
        self.line_number += 1;
        let line = SourceLine::new(raw);

        if self.in_pod {
            if line.is_pod_end() {
                self.in_pod = false;
            }
            return Ok(Step::copied(line.raw()));
        }

        if line.is_sentinel() {
            if self.mode == Mode::DocPassthrough {
                info!(line = self.line_number; "sentinel reached, translating");
                self.mode = Mode::Translating;
            } else {
                debug!(line = self.line_number; "sentinel in translated region dropped");
            }
            return Ok(Step::consumed());
        }

        if self.mode == Mode::DocPassthrough {
            return Ok(Step::copied(line.raw()));
        }

        match line.kind() {
            LineKind::Blank => Ok(Step::copied("")),
            LineKind::Comment => Ok(Step::copied(line.trimmed())),
            LineKind::DocBoundary if self.options.pod_passthrough => {
                self.in_pod = !line.is_pod_end();
                trace!(line = self.line_number, directive = line.trimmed(); "pod block");
                Ok(Step::copied(line.raw()))
            }
            LineKind::DocBoundary | LineKind::Code => {
                let translation = translate_line(line.raw(), self.options).map_err(|source| {
                    DriverError::Translate {
                        line: self.line_number,
                        source,
                    }
                })?;
                Ok(Step {
                    output: Some(translation.text),
                    applied: translation.applied,
                    translated: true,
                })
            }
        }
    }
}

/// Counters for one translated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Summary {
    pub lines_read: usize,
    pub lines_translated: usize,
    pub rules_applied: usize,
}

/// Translate `reader` into `writer`, one line at a time.
///
/// Each line's output is written before the next line is read. On a fatal
/// error the writer is flushed, so everything above the failing line is
/// kept.
pub fn translate_document<R: BufRead, W: Write>(
    reader: R,
    mut writer: W,
    options: &Options,
) -> Result<Summary, DriverError> {
    let mut driver = LineDriver::new(options);
    let mut summary = Summary::default();

    for raw in reader.lines() {
        let raw = raw?;
        let step = match driver.process(&raw) {
            Ok(step) => step,
            Err(err) => {
                writer.flush()?;
                return Err(err);
            }
        };

        summary.lines_read += 1;
        if step.translated {
            summary.lines_translated += 1;
            summary.rules_applied += step.applied.len();
        }
        if let Some(output) = step.output {
            writeln!(writer, "{output}")?;
        }
    }

    writer.flush()?;
    info!(
        lines_read = summary.lines_read,
        lines_translated = summary.lines_translated;
        "document translated"
    );
    Ok(summary)
}

/// [`translate_document`] over an in-memory string.
pub fn translate_str(source: &str, options: &Options) -> Result<String, DriverError> {
    let mut out = Vec::new();
    translate_document(source.as_bytes(), &mut out, options)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// What happened to one input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineReport {
    pub line: usize,
    /// Mode the line was read in.
    pub mode: Mode,
    pub kind: LineKind,
    pub input: String,
    pub output: Option<String>,
    pub rules: Vec<&'static str>,
    pub error: Option<String>,
}

/// Run the driver over `reader` and report every line.
///
/// Unlike [`translate_document`], a failing line does not stop the run: its
/// error goes into the report and the next line is processed.
pub fn trace_document<R: BufRead>(
    reader: R,
    options: &Options,
) -> Result<Vec<LineReport>, DriverError> {
    let mut driver = LineDriver::new(options);
    let mut reports = Vec::new();

    for raw in reader.lines() {
        let raw = raw?;
        let mode = driver.mode();
        let kind = SourceLine::new(&raw).kind();
        let mut report = LineReport {
            line: driver.line_number() + 1,
            mode,
            kind,
            input: raw.clone(),
            output: None,
            rules: Vec::new(),
            error: None,
        };
        match driver.process(&raw) {
            Ok(step) => {
                report.output = step.output;
                report.rules = step.applied;
            }
            Err(err) => report.error = Some(err.to_string()),
        }
        reports.push(report);
    }

    Ok(reports)
}
