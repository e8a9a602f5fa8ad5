//! tdd is an interpreter of TDD (Textual Data Definition), a compact text
//! format for hashes, sequences, strings, numbers and booleans, with function
//! calls that are resolved while the text is read.
//! It also provides the data loaders TDD data files usually call, and a CLI
//! that evaluates a file and dumps the result or renders a template with it.

/// Command-line interface module for the tdd binary
pub mod cli;

/// Evaluation settings: data root, charset, evaluation mode
pub mod config;

pub mod constants;

/// TDD-like text output of evaluated values
pub mod dump;

/// `# encoding: NAME` header detection and charset decoding
pub mod encoding;

/// The callbacks the interpreter calls for function calls and structural events
pub mod environment;

/// Error types and handling for the tdd crate
pub mod error;

pub mod fragment;

pub mod function_call;

/// The TDD scanner and evaluator
/// Entry points: eval, eval_fragment, eval_as_hash, eval_as_sequence
pub mod interpreter;

/// Data loaders and the evaluation environment of TDD data files
pub mod loader;

pub mod logger;

/// Template rendering with evaluated data
pub mod render;

pub mod strings;

/// The evaluated value tree
pub mod value;
