//! Evaluation settings shared by the CLI and the data loaders.

use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::cli::Args;
use crate::constants::DEFAULT_ENCODING;

/// How the top level of a TDD text is read.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EvalMode {
    /// `key: value` pairs without the enclosing braces
    #[default]
    Hash,
    /// Values without the enclosing brackets
    Sequence,
    /// A single expression
    Expression,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory that relative data file paths are resolved against
    pub data_root: PathBuf,
    /// Charset of data files that don't specify one
    pub source_encoding: String,
    pub mode: EvalMode,
    /// Read `true` or `123` as strings instead of a boolean or a number
    pub force_string_values: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("."),
            source_encoding: DEFAULT_ENCODING.to_string(),
            mode: EvalMode::default(),
            force_string_values: false,
        }
    }
}

impl Config {
    /// Builds the configuration of a CLI run.
    ///
    /// Without `--data-root` the data root is the directory of the evaluated
    /// file.
    pub fn from_args(args: &Args) -> Self {
        let data_root = match &args.data_root {
            Some(dir) => dir.clone(),
            None => match args.file.parent() {
                Some(parent) if parent != Path::new("") => parent.to_path_buf(),
                _ => PathBuf::from("."),
            },
        };
        Self {
            data_root,
            source_encoding: args.encoding.clone().unwrap_or_else(|| DEFAULT_ENCODING.to_string()),
            mode: args.mode,
            force_string_values: args.force_strings,
        }
    }

    /// Resolves a data file path against [`Config::data_root`]. `/` works as
    /// separator on every platform.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let path = PathBuf::from(path.replace('/', std::path::MAIN_SEPARATOR_STR));
        if path.is_absolute() {
            path
        } else {
            self.data_root.join(path)
        }
    }
}
