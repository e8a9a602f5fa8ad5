//! Reading the `{name: value, ...}` option hash of a data loader call.

use crate::error::{Error, Result};
use crate::strings::j_quote;
use crate::value::Value;

fn invalid(name: &str, requirement: &str) -> Error {
    Error::DataLoaderError(format!("The value of the {} option must be {requirement}.", j_quote(name)))
}

pub(super) fn unknown_option(name: &str, supported: &str) -> Error {
    Error::DataLoaderError(format!(
        "Unknown option: {}. The supported options are: {supported}",
        j_quote(name)
    ))
}

pub(super) fn string_option(name: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        _ => Err(invalid(name, "a string")),
    }
}

pub(super) fn bool_option(name: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Boolean(b) => Ok(*b),
        _ => Err(invalid(name, "a boolean")),
    }
}

/// A single character, or the word `tab`.
pub(super) fn char_option(name: &str, value: &Value) -> Result<char> {
    let Value::String(s) = value else {
        return Err(invalid(name, "a character"));
    };
    if s.eq_ignore_ascii_case("tab") {
        return Ok('\t');
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(invalid(name, "1 character long or tab")),
    }
}

/// A sequence of strings; with `allow_string` a lone string is a sequence of
/// one.
pub(super) fn string_list_option(name: &str, value: &Value, allow_string: bool) -> Result<Vec<String>> {
    match value {
        Value::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(invalid(
                    name,
                    &format!("a sequence of strings, but the item at index {i} is not a string"),
                )),
            })
            .collect(),
        Value::String(s) if allow_string => Ok(vec![s.clone()]),
        _ if allow_string => Err(invalid(
            name,
            "a sequence of strings or a single string, but it is neither",
        )),
        _ => Err(invalid(name, "a sequence of strings, but it is not even a sequence")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_option() {
        assert_eq!(char_option("separator", &Value::from(",")).unwrap(), ',');
        assert_eq!(char_option("separator", &Value::from("TAB")).unwrap(), '\t');
        let err = char_option("separator", &Value::from(",;")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Data loader error: The value of the \"separator\" option must be 1 character long or tab."
        );
    }

    #[test]
    fn test_string_list_option() {
        let list = Value::Sequence(vec!["a".into(), "b".into()]);
        assert_eq!(string_list_option("headers", &list, false).unwrap(), ["a", "b"]);
        assert_eq!(string_list_option("emptyValue", &Value::from("-"), true).unwrap(), ["-"]);
        assert!(string_list_option("headers", &Value::from("a"), false).is_err());
        assert!(string_list_option("headers", &Value::Sequence(vec![Value::from(1)]), false).is_err());
    }
}
