//! Common constants used throughout the tdd crate.

/// Charset of TDD and text files unless configured or declared otherwise
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// Words accepted in the `# encoding: NAME` header comment
pub const ENCODING_HEADER_WORDS: [&str; 2] = ["encoding", "charset"];

/// Indentation step of the multi-line dump
pub const DUMP_INDENT: &str = "    ";

/// Tab width assumed when quoting a source line in an error location
pub const TAB_WIDTH: usize = 8;

/// Longest quoted source line in an error location, in columns
pub const MAX_QUOTED_LINE: usize = 56;
