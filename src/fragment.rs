//! Deferred, unevaluated slices of TDD source text.

use std::fmt;
use std::sync::Arc;

/// A slice of a TDD text kept for later evaluation.
///
/// The fragment shares the full source buffer, so re-evaluating it with
/// [`crate::interpreter::eval_fragment`] reports error positions relative to
/// the whole original text.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    text: Arc<str>,
    start: usize,
    end: usize,
    file_name: Option<String>,
}

impl Fragment {
    /// Creates a fragment of `text[start..end]`.
    ///
    /// # Arguments
    /// * `text` - The full text that contains the fragment
    /// * `start` - Byte offset of the first character of the fragment
    /// * `end` - Byte offset after the last character of the fragment
    /// * `file_name` - The file the text comes from, for diagnostics only
    pub fn new(text: Arc<str>, start: usize, end: usize, file_name: Option<String>) -> Self {
        Self { text, start, end, file_name }
    }

    /// The full text that contains the fragment.
    pub fn text(&self) -> &Arc<str> {
        &self.text
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// Exclusive end offset.
    pub fn end(&self) -> usize {
        self.end
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// The source text of the fragment.
    pub fn as_str(&self) -> &str {
        &self.text[self.start..self.end]
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
