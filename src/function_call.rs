use std::fmt;

use crate::dump::dump;
use crate::value::Value;

/// A parsed `name(param, ...)` call whose parameters are already evaluated.
///
/// An [`crate::environment::EvaluationEnvironment`] may hand the call back
/// unresolved, in which case it stays in the evaluation result.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    name: String,
    params: Vec<Value>,
}

impl FunctionCall {
    pub fn new<S: Into<String>>(name: S, params: Vec<Value>) -> Self {
        Self { name: name.into(), params }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn into_params(self) -> Vec<Value> {
        self.params
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&dump(&Value::FunctionCall(self.clone())))
    }
}
