//! Parser of the Java `.properties` format.

use crate::error::{Error, Result};
use crate::value::{Hash, Value};

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{c}')
}

/// Lines ended by `\n`, `\r\n` or a lone `\r`.
fn natural_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..i]);
                start = i + 1;
            }
            b'\r' => {
                lines.push(&text[start..i]);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < bytes.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn ends_with_odd_backslashes(s: &str) -> bool {
    s.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Splits a logical line at the first unescaped `=`, `:` or blank.
fn split_entry(line: &str) -> (&str, &str) {
    let mut chars = line.char_indices();
    let mut key_end = line.len();
    let mut separator_is_blank = false;
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == '=' || c == ':' || is_blank(c) {
            key_end = i;
            separator_is_blank = is_blank(c);
            break;
        }
    }
    if key_end == line.len() {
        return (line, "");
    }

    let mut rest = line[key_end + 1..].trim_start_matches(is_blank);
    if separator_is_blank {
        if let Some(after) = rest.strip_prefix(['=', ':']) {
            rest = after.trim_start_matches(is_blank);
        }
    }
    (&line[..key_end], rest)
}

fn unescape(s: &str) -> Result<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = if hex.len() == 4 { u32::from_str_radix(&hex, 16).ok() } else { None };
                match code.and_then(char::from_u32) {
                    Some(c) => out.push(c),
                    None => {
                        return Err(Error::DataLoaderError(format!(
                            "Malformed \\uxxxx encoding in properties: \\u{hex}"
                        )))
                    }
                }
            }
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

/// Parses the content of a `.properties` file into a hash of strings, keeping
/// the order of the file. A repeated key keeps its first position and its
/// last value.
///
/// Comment lines start with `#` or `!`. Keys are separated from the values
/// by `=`, `:` or blanks; a line ending with a backslash continues on
/// the next line.
///
/// # Errors
/// * `Error::DataLoaderError` for a malformed `\uXXXX` escape
pub fn parse_properties(text: &str) -> Result<Hash> {
    let mut map = Hash::new();
    let mut lines = natural_lines(text).into_iter();
    while let Some(line) = lines.next() {
        let line = line.trim_start_matches(is_blank);
        if line.is_empty() || line.starts_with(['#', '!']) {
            continue;
        }
        let mut logical = line.to_string();
        while ends_with_odd_backslashes(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start_matches(is_blank)),
                None => break,
            }
        }
        let (key, value) = split_entry(&logical);
        map.insert(unescape(key)?, Value::String(unescape(value)?));
    }
    Ok(map)
}
