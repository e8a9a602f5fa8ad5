//! The value tree produced by evaluating TDD.

use bigdecimal::{BigDecimal, ToPrimitive};
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::fragment::Fragment;
use crate::function_call::FunctionCall;

/// Insertion-ordered, string-keyed map. Inserting an existing key overwrites
/// its value but keeps its original position.
pub type Hash = IndexMap<String, Value>;

/// Result of evaluating a TDD expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    /// Numbers that fit into `i64`
    Integer(i64),
    /// Every other number
    Decimal(BigDecimal),
    Boolean(bool),
    Sequence(Vec<Value>),
    Hash(Hash),
    /// A function call the environment left unresolved
    FunctionCall(FunctionCall),
    /// Source text whose evaluation was deferred
    Fragment(Fragment),
}

impl Value {
    /// Name of the value type as it appears in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) | Value::Decimal(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::Sequence(_) => "sequence",
            Value::Hash(_) => "hash",
            Value::FunctionCall(_) => "function call",
            Value::Fragment(_) => "fragment",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_hash(&self) -> Option<&Hash> {
        match self {
            Value::Hash(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<BigDecimal> for Value {
    fn from(n: BigDecimal) -> Self {
        Value::Decimal(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<Hash> for Value {
    fn from(map: Hash) -> Self {
        Value::Hash(map)
    }
}

impl From<FunctionCall> for Value {
    fn from(call: FunctionCall) -> Self {
        Value::FunctionCall(call)
    }
}

impl From<Fragment> for Value {
    fn from(fragment: Fragment) -> Self {
        Value::Fragment(fragment)
    }
}

/// Serializes the tree the way template variables expect it. Decimals become
/// floats; unresolved calls and fragments become their source-like text.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::String(s) => serializer.serialize_str(s),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Decimal(n) => match n.to_f64() {
                Some(f) => serializer.serialize_f64(f),
                None => serializer.serialize_str(&n.to_string()),
            },
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Hash(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Value::FunctionCall(call) => serializer.serialize_str(&call.to_string()),
            Value::Fragment(fragment) => serializer.serialize_str(fragment.as_str()),
        }
    }
}
