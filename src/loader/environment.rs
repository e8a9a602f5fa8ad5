use std::sync::Arc;

use log::trace;

use super::{get_data_loader, DataLoader, LoadContext, LoaderRegistry};
use crate::config::Config;
use crate::environment::{Event, EvaluationEnvironment, Response};
use crate::error::{Error, Result};
use crate::function_call::FunctionCall;
use crate::interpreter::Context;
use crate::strings::j_quote;
use crate::value::{Hash, Value};

/// Evaluation environment of TDD data files: function calls invoke data
/// loaders, except `get(name, subName, ...)`, which reads a variable.
///
/// `get` sees the keys already put into the hashes under construction, so a
/// file can refer to an entry defined earlier in it. Hashes nested into a
/// sequence or into function call parameters are not visible this way.
pub struct DataLoaderEnvironment<'a> {
    config: &'a Config,
    data: &'a Hash,
    loaders: LoaderRegistry,
    /// Indexes into [`Context::open_hashes`] of the visible hashes
    map_stack: Vec<usize>,
    disable_map_stacking: usize,
}

impl<'a> DataLoaderEnvironment<'a> {
    /// # Arguments
    /// * `config` - Passed on to the data loaders
    /// * `data` - Variables visible to `get` after the hashes being built
    pub fn new(config: &'a Config, data: &'a Hash) -> Self {
        Self {
            config,
            data,
            loaders: LoaderRegistry::new(),
            map_stack: Vec::new(),
            disable_map_stacking: 0,
        }
    }

    pub fn with_loaders(mut self, loaders: LoaderRegistry) -> Self {
        self.loaders = loaders;
        self
    }

    /// Registers a loader under a function name. It takes precedence over a
    /// built-in loader of the same name.
    pub fn register<S: Into<String>>(&mut self, name: S, loader: Arc<dyn DataLoader>) {
        self.loaders.insert(name.into(), loader);
    }

    fn find_top_level_variable<'s>(&'s self, name: &str, ctx: &'s Context) -> Option<&'s Value> {
        let open_hashes = ctx.open_hashes();
        self.map_stack
            .iter()
            .rev()
            .filter_map(|&i| open_hashes.get(i))
            .find_map(|map| map.get(name))
            .or_else(|| self.data.get(name))
    }

    fn get(&self, params: &[Value], ctx: &Context) -> Result<Value> {
        let mut map: Option<&Hash> = None;
        for (i, param) in params.iter().enumerate() {
            let position = i + 1;
            let Value::String(name) = param else {
                return Err(Error::DataLoaderError(format!(
                    "Parameters to function \"get\" must be strings, but parameter at \
                     position {position} is a {}.",
                    param.type_name()
                )));
            };
            let found = match map {
                None => self.find_top_level_variable(name, ctx),
                Some(map) => map.get(name),
            };
            let Some(found) = found else {
                return Err(Error::DataLoaderError(if i == 0 {
                    format!("No variable with name {} exists.", j_quote(name))
                } else {
                    format!(
                        "No sub-variable with name {} exists (referred by parameter at \
                         position {position}).",
                        j_quote(name)
                    )
                }));
            };
            if position == params.len() {
                return Ok(found.clone());
            }
            match found {
                Value::Hash(sub) => map = Some(sub),
                other => {
                    return Err(Error::DataLoaderError(format!(
                        "Parameter at position {position} must be the name of a hash \
                         variable, but it is the name of a {} variable.",
                        other.type_name()
                    )))
                }
            }
        }
        Err(Error::DataLoaderError(
            "Function \"get\" needs at least 1 arguments. get(name, subName, subSubName, ...)"
                .to_string(),
        ))
    }
}

impl EvaluationEnvironment for DataLoaderEnvironment<'_> {
    fn eval_function_call(&mut self, call: FunctionCall, ctx: &Context) -> Result<Value> {
        if call.name() == "get" {
            return self.get(call.params(), ctx);
        }
        let load_ctx = LoadContext { config: self.config, data: self.data, loaders: &self.loaders };
        match self.loaders.get(call.name()) {
            Some(loader) => {
                trace!("Calling registered data loader {}", call.name());
                loader.load(load_ctx, call.params())
            }
            None => {
                trace!("Calling built-in data loader {}", call.name());
                get_data_loader(call.name())?.load(load_ctx, call.params())
            }
        }
    }

    fn notify(&mut self, event: Event<'_>, ctx: &Context) -> Result<Option<Response>> {
        match event {
            Event::EnterSequence | Event::EnterFunctionParams(_) => self.disable_map_stacking += 1,
            Event::LeaveSequence | Event::LeaveFunctionParams(_) => {
                self.disable_map_stacking = self.disable_map_stacking.saturating_sub(1)
            }
            Event::EnterHash if self.disable_map_stacking == 0 => {
                self.map_stack.push(ctx.open_hashes().len().saturating_sub(1))
            }
            Event::LeaveHash if self.disable_map_stacking == 0 => {
                self.map_stack.pop();
            }
            _ => {}
        }
        Ok(None)
    }
}
