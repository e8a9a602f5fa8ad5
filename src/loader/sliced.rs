//! `slicedText(fileName[, options])`: a text file cut into a sequence of
//! strings at each occurrence of a separator.

use super::file::FileArgs;
use super::options::{bool_option, string_option, unknown_option};
use super::{DataLoader, LoadContext};
use crate::error::{Error, Result};
use crate::interpreter::is_ws;
use crate::strings::j_quote;
use crate::value::{Hash, Value};

const USAGE: &str = "slicedText(fileName[, options])";

#[derive(Debug)]
struct SliceOptions {
    separator: Vec<char>,
    trim: bool,
    drop_empty_last_item: bool,
}

impl SliceOptions {
    fn parse(options: &Hash) -> Result<Self> {
        let mut parsed = Self { separator: vec!['\n'], trim: false, drop_empty_last_item: true };
        for (name, value) in options {
            match name.as_str() {
                "separator" => {
                    let separator = normalize_line_breaks(&string_option(name, value)?);
                    if separator.is_empty() {
                        return Err(Error::DataLoaderError(format!(
                            "The value of the {} option can't be 0 length string.",
                            j_quote(name)
                        )));
                    }
                    parsed.separator = separator.chars().collect();
                }
                "trim" => parsed.trim = bool_option(name, value)?,
                "dropEmptyLastItem" => parsed.drop_empty_last_item = bool_option(name, value)?,
                _ => return Err(unknown_option(name, "encoding, separator, trim, dropEmptyLastItem")),
            }
        }
        Ok(parsed)
    }
}

fn normalize_line_breaks(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

/// Returns the index just after the separator if `text[at..]` starts with it.
///
/// A `\n` in the separator matches any line break. Spaces and tabs right
/// before a line break are skipped, unless the line break opens the
/// separator.
fn separator_end(text: &[char], at: usize, separator: &[char]) -> Option<usize> {
    let mut ti = at;
    let mut si = 0;
    while si < separator.len() {
        let c = *text.get(ti)?;
        if separator[si] == '\n' {
            match c {
                '\n' => {
                    si += 1;
                    ti += 1;
                }
                '\r' => {
                    si += 1;
                    ti += 1;
                    if text.get(ti) == Some(&'\n') {
                        ti += 1;
                    }
                }
                ' ' | '\t' if si != 0 => ti += 1,
                _ => return None,
            }
        } else if separator[si] == c {
            si += 1;
            ti += 1;
        } else {
            return None;
        }
    }
    Some(ti)
}

fn slice(text: &str, options: &SliceOptions) -> Vec<String> {
    let text: Vec<char> = text.chars().collect();
    let mut items = Vec::new();
    let mut begin = 0;
    let mut end = 0;
    loop {
        // The end of the text is an implicit separator
        let next = if end < text.len() {
            separator_end(&text, end, &options.separator)
        } else {
            Some(text.len())
        };
        match next {
            Some(next) => {
                let item: String = text[begin..end].iter().collect();
                items.push(if options.trim { item.trim_matches(is_ws).to_string() } else { item });
                if end >= text.len() {
                    break;
                }
                begin = next;
                end = next;
            }
            None => end += 1,
        }
    }
    if options.drop_empty_last_item && items.last().is_some_and(String::is_empty) {
        items.pop();
    }
    items
}

/// Loads the slices of a text file as a sequence of strings. Slices are
/// lines by default.
pub struct SlicedTextLoader;

impl DataLoader for SlicedTextLoader {
    fn load(&self, ctx: LoadContext<'_>, args: &[Value]) -> Result<Value> {
        let file = FileArgs::parse_with_options(&ctx, args, USAGE)?;
        let options = SliceOptions::parse(&file.options)?;
        let text = file.read_text(&ctx)?;
        Ok(Value::Sequence(slice(&text, &options).into_iter().map(Value::String).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(separator: &str) -> SliceOptions {
        SliceOptions { separator: separator.chars().collect(), trim: false, drop_empty_last_item: true }
    }

    #[test]
    fn test_lines() {
        assert_eq!(slice("a\nb\r\nc\rd\n", &options("\n")), ["a", "b", "c", "d"]);
        assert_eq!(slice("a\n\nb", &options("\n")), ["a", "", "b"]);
        assert!(slice("", &options("\n")).is_empty());
    }

    #[test]
    fn test_blank_line_separator() {
        let items = slice("one\ntwo\n \t\nthree\n", &options("\n\n"));
        assert_eq!(items, ["one\ntwo", "three\n"]);
    }

    #[test]
    fn test_keep_empty_last_item() {
        let mut options = options(";");
        options.drop_empty_last_item = false;
        assert_eq!(slice("a;b;", &options), ["a", "b", ""]);
        options.trim = true;
        assert_eq!(slice(" a ; b ", &options), ["a", "b"]);
    }
}
