//! Error handling for the TDD interpreter.
//! Defines the error type shared by the interpreter, the data loaders and the CLI,
//! together with the source location rendering used in the TDD diagnostics.

use std::fmt;
use std::io;
use std::sync::Arc;
use thiserror::Error;

use crate::constants::{MAX_QUOTED_LINE, TAB_WIDTH};
use crate::strings::expand_tabs;

/// Position of a TDD error in the evaluated text.
///
/// The full source text is kept (shared, not copied) so the rendered
/// diagnostic can quote the offending line with a caret under the position.
#[derive(Debug, Clone)]
pub struct Location {
    text: Arc<str>,
    position: usize,
    file_name: Option<String>,
}

impl Location {
    pub fn new(text: Arc<str>, position: usize, file_name: Option<String>) -> Self {
        Self { text, position, file_name }
    }

    /// The whole source text the error refers to.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte offset of the error in [`Location::text`].
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Returns the 1-based line and column of the position.
    pub fn line_and_column(&self) -> (usize, usize) {
        let (row, row_begin, _, position) = self.row_bounds();
        (row, self.text[row_begin..position].chars().count() + 1)
    }

    /// Returns `(row, row_begin, row_stop, clamped_position)`, where
    /// `row_stop` is the exclusive end of the line, before its line break.
    fn row_bounds(&self) -> (usize, usize, usize, usize) {
        let bytes = self.text.as_bytes();
        let ln = bytes.len();
        let mut position = self.position.min(ln);

        let mut row = 1;
        let mut row_begin = 0;
        let mut last = 0u8;
        for (i, &c) in bytes.iter().enumerate().take(position + 1) {
            if last == b'\n' || (last == b'\r' && c != b'\n') {
                row_begin = i;
                row += 1;
            }
            last = c;
        }

        let mut row_stop = position;
        while row_stop < ln {
            let c = bytes[row_stop];
            if c == b'\n' || c == b'\r' {
                if c == b'\n' && row_stop > 0 && bytes[row_stop - 1] == b'\r' {
                    row_stop -= 1;
                }
                break;
            }
            row_stop += 1;
        }
        if position > row_stop {
            position = row_stop;
        }
        (row, row_begin, row_stop, position)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subject = self.file_name.as_deref().unwrap_or("the text");
        let ln = self.text.len();
        if self.position >= ln {
            return if self.position == ln {
                write!(f, "\nError location: The very end of {subject}.")
            } else {
                write!(f, "\nError location: ??? (after the end of {subject})")
            };
        }

        let (row, row_begin, row_stop, position) = self.row_bounds();
        let col = self.text[row_begin..position].chars().count() + 1;
        write!(f, "\nError location: line {row}, column {col}")?;
        if let Some(file_name) = &self.file_name {
            write!(f, " in {file_name}")?;
        }
        f.write_str(":")?;
        if row_begin >= row_stop {
            return f.write_str("\n(Can't show the line because it is empty.)");
        }

        let mut s1: Vec<char> = expand_tabs(&self.text[row_begin..position], TAB_WIDTH, 0).chars().collect();
        let mut s2: Vec<char> =
            expand_tabs(&self.text[position..row_stop], TAB_WIDTH, s1.len()).chars().collect();
        if s1.len() + s2.len() > MAX_QUOTED_LINE {
            let new_ln2 = s2.len().saturating_sub(s1.len() + s2.len() - MAX_QUOTED_LINE).max(6);
            if new_ln2 < s2.len() {
                s2.truncate(new_ln2 - 3);
                s2.extend("...".chars());
            }
            if s1.len() + s2.len() > MAX_QUOTED_LINE {
                let cut = (s1.len() + s2.len() - MAX_QUOTED_LINE + 3).min(s1.len());
                s1 = "...".chars().chain(s1[cut..].iter().copied()).collect();
            }
        }
        let s1: String = s1.into_iter().collect();
        let s2: String = s2.into_iter().collect();
        write!(f, "\n{s1}{s2}\n{}^", " ".repeat(s1.chars().count()))
    }
}

/// Custom error types for TDD operations.
///
/// The first three variants are raised by the interpreter itself and always
/// carry a [`Location`]. The rest come from the I/O and format glue around it.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed TDD: unterminated literal or listing, illegal character, bad separator.
    #[error("TDD syntax error: {message}{location}")]
    SyntaxError { message: String, location: Location },

    /// Well-formed TDD that can't be evaluated, like a non-string hash key.
    #[error("TDD error: {message}{location}")]
    EvalError {
        message: String,
        location: Location,
        #[source]
        cause: Option<Box<Error>>,
    },

    /// A failure of the evaluation environment outside of function calls.
    #[error("Error while evaluating TDD: {cause}{location}")]
    WrappedError {
        #[source]
        cause: Box<Error>,
        location: Location,
    },

    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    #[error("JSON error: {0}.")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}.")]
    YamlError(#[from] serde_yaml::Error),

    #[error("CSV error: {0}.")]
    CsvError(#[from] csv::Error),

    /// Represents errors that occur during template rendering
    #[error("Template error: {0}.")]
    MinijinjaError(#[from] minijinja::Error),

    /// Unknown or unsupported character encoding name
    #[error("Unsupported encoding: {0}.")]
    EncodingError(String),

    /// Bad data loader name or arguments, or a failed `get` lookup
    #[error("Data loader error: {0}")]
    DataLoaderError(String),
}

impl Error {
    /// Whether this error was produced by the interpreter (and so already
    /// carries a source location).
    pub fn is_tdd_error(&self) -> bool {
        matches!(
            self,
            Error::SyntaxError { .. } | Error::EvalError { .. } | Error::WrappedError { .. }
        )
    }

    /// Source location of a TDD error.
    pub fn location(&self) -> Option<&Location> {
        match self {
            Error::SyntaxError { location, .. }
            | Error::EvalError { location, .. }
            | Error::WrappedError { location, .. } => Some(location),
            _ => None,
        }
    }
}

/// Convenience type alias for Results with [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Behavior
/// Prints the error message and its causes to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{}", err);
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        eprintln!("Caused by: {}", cause);
        source = std::error::Error::source(cause);
    }
    std::process::exit(1);
}
