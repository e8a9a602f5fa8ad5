//! The built-in loaders that read a file, `name(path[, encoding])` or
//! `name(path[, options])`.

use log::debug;
use std::path::PathBuf;

use super::options::string_option;
use super::properties::parse_properties;
use super::{from_json, from_yaml, DataLoader, LoadContext};
use crate::encoding::{decode, load_tdd};
use crate::error::{Error, Result};
use crate::interpreter::{eval_as_hash, eval_as_sequence};
use crate::value::{Hash, Value};

/// Arguments of a file loader call, already checked.
pub(super) struct FileArgs {
    path: PathBuf,
    encoding: Option<String>,
    /// Options other than `encoding`, in the order they were given
    pub(super) options: Hash,
}

impl FileArgs {
    /// Validates `args` against the call shape `usage`, which also names the
    /// loader in the error messages.
    fn parse(ctx: &LoadContext<'_>, args: &[Value], usage: &str, takes_encoding: bool) -> Result<Self> {
        let path = Self::path(ctx, args, usage, if takes_encoding { 2 } else { 1 })?;
        let encoding = match args.get(1) {
            None => None,
            Some(Value::String(encoding)) => Some(encoding.clone()),
            Some(other) => {
                return Err(Error::DataLoaderError(format!(
                    "The 2nd argument of {usage} (encoding) must be a string, but it is a(n) {}",
                    other.type_name()
                )))
            }
        };
        Ok(Self { path, encoding, options: Hash::new() })
    }

    /// Like [`FileArgs::parse`], but the optional 2nd argument is a hash of
    /// options. The `encoding` option is taken out of it.
    pub(super) fn parse_with_options(ctx: &LoadContext<'_>, args: &[Value], usage: &str) -> Result<Self> {
        let path = Self::path(ctx, args, usage, 2)?;
        let mut options = match args.get(1) {
            None => Hash::new(),
            Some(Value::Hash(options)) => options.clone(),
            Some(other) => {
                return Err(Error::DataLoaderError(format!(
                    "The 2nd argument of {usage} (options) must be a hash, but it is a(n) {}",
                    other.type_name()
                )))
            }
        };
        let encoding = options
            .shift_remove("encoding")
            .map(|value| string_option("encoding", &value))
            .transpose()?;
        Ok(Self { path, encoding, options })
    }

    fn path(ctx: &LoadContext<'_>, args: &[Value], usage: &str, max: usize) -> Result<PathBuf> {
        if args.is_empty() || args.len() > max {
            return Err(Error::DataLoaderError(format!(
                "Wrong number of arguments, the call must look like {usage}"
            )));
        }
        match &args[0] {
            Value::String(path) => Ok(ctx.config.resolve_path(path)),
            other => Err(Error::DataLoaderError(format!(
                "The 1st argument of {usage} (file name) must be a string, but it is a(n) {}",
                other.type_name()
            ))),
        }
    }

    fn encoding<'c>(&'c self, ctx: &'c LoadContext<'_>) -> &'c str {
        self.encoding.as_deref().unwrap_or(&ctx.config.source_encoding)
    }

    fn read(&self) -> Result<Vec<u8>> {
        debug!("Loading data file {}", self.path.display());
        std::fs::read(&self.path).map_err(Error::IoError)
    }

    /// The decoded content of the file, without a leading BOM.
    pub(super) fn read_text(&self, ctx: &LoadContext<'_>) -> Result<String> {
        Ok(strip_bom(decode(&self.read()?, self.encoding(ctx))?))
    }

    fn file_name(&self) -> String {
        std::fs::canonicalize(&self.path)
            .unwrap_or_else(|_| self.path.clone())
            .display()
            .to_string()
    }
}

fn strip_bom(mut text: String) -> String {
    if text.starts_with('\u{feff}') {
        text.drain(..'\u{feff}'.len_utf8());
    }
    text
}

/// `tdd(path[, encoding])`: a file of `key: value` pairs, evaluated into a hash.
pub struct TddLoader;

impl DataLoader for TddLoader {
    fn load(&self, ctx: LoadContext<'_>, args: &[Value]) -> Result<Value> {
        let file = FileArgs::parse(&ctx, args, "tdd(fileName[, encoding])", true)?;
        let text = load_tdd(&file.read()?, file.encoding(&ctx))?;
        let mut env = ctx.environment();
        let map = eval_as_hash(text, Some(&mut env), false, Some(&file.file_name()))?;
        Ok(Value::Hash(map))
    }
}

/// `tddSequence(path[, encoding])`: a file of values, evaluated into a sequence.
pub struct TddSequenceLoader;

impl DataLoader for TddSequenceLoader {
    fn load(&self, ctx: LoadContext<'_>, args: &[Value]) -> Result<Value> {
        let file = FileArgs::parse(&ctx, args, "tddSequence(fileName[, encoding])", true)?;
        let text = load_tdd(&file.read()?, file.encoding(&ctx))?;
        let mut env = ctx.environment();
        let items = eval_as_sequence(text, Some(&mut env), false, Some(&file.file_name()))?;
        Ok(Value::Sequence(items))
    }
}

/// `text(path[, encoding])`: the content of a file as a string.
pub struct TextLoader;

impl DataLoader for TextLoader {
    fn load(&self, ctx: LoadContext<'_>, args: &[Value]) -> Result<Value> {
        let file = FileArgs::parse(&ctx, args, "text(fileName[, encoding])", true)?;
        Ok(Value::String(file.read_text(&ctx)?))
    }
}

/// `json(path)`: a JSON file. JSON is always UTF-8.
pub struct JsonLoader;

impl DataLoader for JsonLoader {
    fn load(&self, ctx: LoadContext<'_>, args: &[Value]) -> Result<Value> {
        let file = FileArgs::parse(&ctx, args, "json(fileName)", false)?;
        let text = strip_bom(decode(&file.read()?, "UTF-8")?);
        let value: serde_json::Value = serde_json::from_str(&text).map_err(Error::JsonError)?;
        from_json(value)
    }
}

/// `yaml(path)`: a YAML file, in UTF-8.
pub struct YamlLoader;

impl DataLoader for YamlLoader {
    fn load(&self, ctx: LoadContext<'_>, args: &[Value]) -> Result<Value> {
        let file = FileArgs::parse(&ctx, args, "yaml(fileName)", false)?;
        let text = strip_bom(decode(&file.read()?, "UTF-8")?);
        let value: serde_yaml::Value = serde_yaml::from_str(&text).map_err(Error::YamlError)?;
        from_yaml(value)
    }
}

/// `properties(path)`: a Java `.properties` file, read as ISO-8859-1, into a
/// hash of strings.
pub struct PropertiesLoader;

impl DataLoader for PropertiesLoader {
    fn load(&self, ctx: LoadContext<'_>, args: &[Value]) -> Result<Value> {
        let file = FileArgs::parse(&ctx, args, "properties(fileName)", false)?;
        let text: String = file.read()?.into_iter().map(char::from).collect();
        Ok(Value::Hash(parse_properties(&text)?))
    }
}
