//! Data loaders: the functions a TDD data file can call, like
//! `tdd(data/common.tdd)`, `text(readme.txt, ISO-8859-1)` or
//! `csv(data/birds.csv, {separator: ','})`.

use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use indexmap::IndexMap;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::value::{Hash, Value};

pub mod environment;
mod file;
mod options;
mod properties;
mod sliced;
mod table;

pub use environment::DataLoaderEnvironment;
pub use file::{JsonLoader, PropertiesLoader, TddLoader, TddSequenceLoader, TextLoader, YamlLoader};
pub use properties::parse_properties;
pub use sliced::SlicedTextLoader;
pub use table::CsvLoader;

/// Loaders registered on a [`DataLoaderEnvironment`], by function name.
pub type LoaderRegistry = IndexMap<String, Arc<dyn DataLoader>>;

/// What a data loader can see of the evaluation it was called from.
#[derive(Clone, Copy)]
pub struct LoadContext<'a> {
    pub config: &'a Config,
    /// Data that existed before the evaluation started
    pub data: &'a Hash,
    pub(crate) loaders: &'a LoaderRegistry,
}

impl<'a> LoadContext<'a> {
    /// A fresh environment for evaluating another TDD text, with the same
    /// configuration, data and registered loaders.
    pub fn environment(&self) -> DataLoaderEnvironment<'a> {
        DataLoaderEnvironment::new(self.config, self.data).with_loaders(self.loaders.clone())
    }
}

/// Trait for functions that produce data, usually from a file.
pub trait DataLoader {
    /// Loads the data.
    ///
    /// # Arguments
    /// * `ctx` - Configuration and data of the calling evaluation
    /// * `args` - The already evaluated parameters of the function call
    ///
    /// # Returns
    /// * `Result<Value>` - The loaded data
    fn load(&self, ctx: LoadContext<'_>, args: &[Value]) -> Result<Value>;
}

/// Returns the built-in data loader with the given function name.
///
/// # Errors
/// * `Error::DataLoaderError` if there is no such loader
pub fn get_data_loader(name: &str) -> Result<Box<dyn DataLoader>> {
    let loader: Box<dyn DataLoader> = match name {
        "tdd" => Box::new(TddLoader),
        "tddSequence" => Box::new(TddSequenceLoader),
        "text" => Box::new(TextLoader),
        "json" => Box::new(JsonLoader),
        "yaml" => Box::new(YamlLoader),
        "properties" => Box::new(PropertiesLoader),
        "csv" => Box::new(CsvLoader),
        "slicedText" => Box::new(SlicedTextLoader),
        _ => return Err(Error::DataLoaderError(format!("Unknown data loader: {name}"))),
    };
    Ok(loader)
}

/// Returns the entries of a value that can be merged into a hash, or gives
/// the value back if it can't be.
pub fn convert_to_data_map(value: Value) -> std::result::Result<Hash, Value> {
    match value {
        Value::Hash(map) => Ok(map),
        other => Err(other),
    }
}

fn decimal(text: &str) -> Result<Value> {
    BigDecimal::from_str(text)
        .map(Value::Decimal)
        .map_err(|_| Error::DataLoaderError(format!("Number {text} can't be represented")))
}

/// Maps a JSON document to a [`Value`]. Object member order is kept.
///
/// # Errors
/// * `Error::DataLoaderError` for `null`, which has no TDD counterpart
pub fn from_json(value: serde_json::Value) -> Result<Value> {
    Ok(match value {
        serde_json::Value::Null => {
            return Err(Error::DataLoaderError("JSON null is not supported".to_string()))
        }
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => decimal(&n.to_string())?,
        },
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => {
            Value::Sequence(items.into_iter().map(from_json).collect::<Result<_>>()?)
        }
        serde_json::Value::Object(members) => Value::Hash(
            members
                .into_iter()
                .map(|(k, v)| from_json(v).map(|v| (k, v)))
                .collect::<Result<_>>()?,
        ),
    })
}

/// Maps a YAML document to a [`Value`]. Tags are ignored.
///
/// # Errors
/// * `Error::DataLoaderError` for null values and non-string mapping keys
pub fn from_yaml(value: serde_yaml::Value) -> Result<Value> {
    Ok(match value {
        serde_yaml::Value::Null => {
            return Err(Error::DataLoaderError("YAML null is not supported".to_string()))
        }
        serde_yaml::Value::Bool(b) => Value::Boolean(b),
        serde_yaml::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => decimal(&n.to_string())?,
        },
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Sequence(items.into_iter().map(from_yaml).collect::<Result<_>>()?)
        }
        serde_yaml::Value::Mapping(entries) => {
            let mut map = Hash::with_capacity(entries.len());
            for (k, v) in entries {
                match k {
                    serde_yaml::Value::String(key) => {
                        map.insert(key, from_yaml(v)?);
                    }
                    other => {
                        return Err(Error::DataLoaderError(format!(
                            "YAML mapping keys must be strings, but found {other:?}"
                        )))
                    }
                }
            }
            Value::Hash(map)
        }
        serde_yaml::Value::Tagged(tagged) => from_yaml(tagged.value)?,
    })
}
