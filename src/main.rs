//! tdd's main application entry point.
//! Evaluates a TDD file, then prints its dump or renders a template with it.

use std::path::Path;

use log::{debug, info};
use tdd::{
    cli::{get_args, Args},
    config::{Config, EvalMode},
    dump::dump,
    encoding::{decode, load_tdd},
    error::{default_error_handler, Error, Result},
    interpreter::{eval, eval_as_hash, eval_as_sequence},
    loader::DataLoaderEnvironment,
    logger::init_logger,
    render::{MiniJinjaRenderer, TemplateRenderer},
    value::{Hash, Value},
};

/// Main application entry point.
fn main() {
    let args = get_args();

    init_logger(args.verbose);

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

/// Reads and evaluates a TDD file according to `config`.
fn evaluate_file(file: &Path, config: &Config, data: &Hash) -> Result<Value> {
    debug!("Evaluating {} as {:?}", file.display(), config.mode);
    let bytes = std::fs::read(file).map_err(Error::IoError)?;
    let text = load_tdd(&bytes, &config.source_encoding)?;
    let file_name = file.display().to_string();
    let mut env = DataLoaderEnvironment::new(config, data);
    let force = config.force_string_values;
    Ok(match config.mode {
        EvalMode::Hash => Value::Hash(eval_as_hash(text, Some(&mut env), force, Some(&file_name))?),
        EvalMode::Sequence => {
            Value::Sequence(eval_as_sequence(text, Some(&mut env), force, Some(&file_name))?)
        }
        EvalMode::Expression => eval(text, Some(&mut env), force, Some(&file_name))?,
    })
}

/// Main application logic execution.
///
/// # Arguments
/// * `args` - Parsed command line arguments
///
/// # Returns
/// * `Result<()>` - Success or error status of the evaluation
fn run(args: Args) -> Result<()> {
    let config = Config::from_args(&args);
    let data = Hash::new();
    let value = evaluate_file(&args.file, &config, &data)?;

    let Some(template_path) = &args.template else {
        println!("{}", dump(&value));
        return Ok(());
    };

    // Anything but a hash is exposed as the `data` variable.
    let variables = match value {
        Value::Hash(map) => map,
        other => Hash::from([("data".to_string(), other)]),
    };
    info!("Rendering {}", template_path.display());
    let bytes = std::fs::read(template_path).map_err(Error::IoError)?;
    let template = decode(&bytes, &config.source_encoding)?;
    let engine = MiniJinjaRenderer::new();
    print!("{}", engine.render(&template, &variables)?);
    Ok(())
}
