use std::io;

use pl2py_model::TranslateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A code line failed to translate. `line` is 1-based.
    #[error("line {line}: {source}")]
    Translate {
        line: usize,
        source: TranslateError,
    },

    #[error("documentation extractor failed: {0}")]
    Extractor(String),
}

impl DriverError {
    /// Input line the error is attached to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            DriverError::Translate { line, .. } => Some(*line),
            _ => None,
        }
    }
}
