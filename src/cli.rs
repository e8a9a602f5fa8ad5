//! Command-line interface implementation for tdd.
//! Provides argument parsing and help text formatting using clap.

use clap::{error::ErrorKind, CommandFactory, Parser};
use std::path::PathBuf;

use crate::config::EvalMode;

/// Command-line arguments structure for tdd.
#[derive(Parser, Debug)]
#[command(author, version, about = "tdd: evaluates Textual Data Definition files", long_about = None)]
pub struct Args {
    /// TDD file to evaluate
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// How the top level of the file is read
    #[arg(short, long, value_enum, default_value_t = EvalMode::Hash)]
    pub mode: EvalMode,

    /// Charset of the file and of the data files it loads, unless they declare one
    #[arg(short, long, value_name = "ENC")]
    pub encoding: Option<String>,

    /// Directory that relative data file paths are resolved against.
    /// Defaults to the directory of FILE.
    #[arg(short, long, value_name = "DIR")]
    pub data_root: Option<PathBuf>,

    /// Read values like true or 123 as strings
    #[arg(short = 's', long)]
    pub force_strings: bool,

    /// MiniJinja template to render with the evaluated hash as its variables,
    /// instead of dumping the result
    #[arg(short, long, value_name = "FILE")]
    pub template: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parses command line arguments and returns the Args structure.
///
/// # Returns
/// * `Args` - Parsed command line arguments
///
/// # Exits
/// * With status code 1 if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
