//! Small string helpers used by the diagnostics and by [`crate::dump`].

/// Quotes a string as a double-quoted literal that the interpreter reads back
/// as the same string.
pub fn j_quote(s: &str) -> String {
    let mut b = String::with_capacity(s.len() + 2);
    b.push('"');
    for c in s.chars() {
        match c {
            '\\' => b.push_str("\\\\"),
            '"' => b.push_str("\\\""),
            '\n' => b.push_str("\\n"),
            '\r' => b.push_str("\\r"),
            '\t' => b.push_str("\\t"),
            '\u{8}' => b.push_str("\\b"),
            '\u{c}' => b.push_str("\\f"),
            c if (c as u32) < 0x20 => b.push_str(&format!("\\u{:04x}", c as u32)),
            c => b.push(c),
        }
    }
    b.push('"');
    b
}

/// Describes a character for an error message, either quoted or by its name
/// when quoting would be confusing.
pub fn quote_or_name(c: char) -> String {
    match c {
        '"' => "quotation mark".to_string(),
        '\'' => "apostrophe-quote".to_string(),
        '\\' => "'\\\\'".to_string(),
        '\n' => "'\\n'".to_string(),
        '\r' => "'\\r'".to_string(),
        '\t' => "'\\t'".to_string(),
        '\u{8}' => "'\\b'".to_string(),
        '\u{c}' => "'\\f'".to_string(),
        c if (c as u32) < 0x20 => format!("'\\u{:04x}'", c as u32),
        c => format!("'{c}'"),
    }
}

/// Replaces tabs with spaces, assuming the text starts at column `start_col`.
pub fn expand_tabs(s: &str, tab_width: usize, start_col: usize) -> String {
    let mut out = String::with_capacity(s.len());
    let mut col = start_col;
    for c in s.chars() {
        if c == '\t' {
            let n = tab_width - col % tab_width;
            out.extend(std::iter::repeat(' ').take(n));
            col += n;
        } else {
            out.push(c);
            col += 1;
        }
    }
    out
}
