/// Whitespace, with the byte order mark counted as whitespace too.
pub(crate) fn is_ws(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

/// Tells if `c` can be part of an unquoted string. Beyond Latin-1 everything
/// but whitespace can be.
///
/// `+` and `:` are excluded here, the caller decides about them based on
/// where they appear.
pub(super) fn is_unquoted_char(c: char) -> bool {
    if c > '\u{a0}' {
        return !is_ws(c);
    }
    !matches!(
        c,
        '\t' | '\n'
            | '\u{b}'
            | '\u{c}'
            | '\r'
            | ' '
            | '"'
            | '\''
            | '('
            | ')'
            | '+'
            | ','
            | ':'
            | ';'
            | '<'
            | '='
            | '>'
            | '['
            | ']'
            | '{'
            | '}'
            | '\u{85}'
            | '\u{a0}'
    )
}
