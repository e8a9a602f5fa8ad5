use super::chars::{is_unquoted_char, is_ws};
use super::Interpreter;
use crate::error::Result;
use crate::strings::quote_or_name;

const HASH_UNION_DEPRECATED: &str = "The + operator (\"hash union\") is deprecated since \
FMPP 0.9.0, and starting from FMPP 0.9.9 it is not allowed at all. Please use \"hash addition\" \
instead. For example, assuming that your configuration file is in .properties format (same as \
.cfg), instead of this:\n\
data={a:1, b:2} + properties(data/style.properties) + birds:csv(data/birds.csv)\n\
your should write this:\n\
data=a:1, b:2, tdd(data/style.tdd), birds:csv(data/birds.csv)\n\
For more information on hash addition please see:\n\
http://fmpp.sourceforge.net/tdd.html#hashAddition";

/// What [`Interpreter::skip_separator`] found between two items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Separator {
    /// An explicit comma, or a line break acting as one
    Comma,
    Colon,
    /// The terminator of the listing; also the end of the text when the
    /// listing is not bracketed
    Terminator,
    /// End of the text inside a bracketed listing
    Eos,
}

impl Interpreter<'_> {
    /// Moves the cursor to the next character that is neither whitespace nor
    /// part of a comment, and returns it (`None` at the end of the text).
    ///
    /// `#` starts a comment that lasts until the end of the line if only
    /// whitespace precedes it in its line. `<#-- ... -->` is a comment
    /// anywhere.
    pub(super) fn skip_ws(&mut self) -> Result<Option<char>> {
        self.ctx.skip_ws_found_nl = false;
        while let Some(c) = self.ctx.peek() {
            if is_ws(c) {
                if c == '\n' || c == '\r' {
                    self.ctx.skip_ws_found_nl = true;
                }
                self.ctx.p += c.len_utf8();
            } else if c == '#' && self.is_line_empty_before(self.ctx.p) {
                match self.ctx.rest().find(['\n', '\r']) {
                    Some(i) => self.ctx.p += i,
                    None => {
                        self.ctx.p = self.ctx.ln;
                        return Ok(None);
                    }
                }
            } else if self.ctx.rest().starts_with("<#--") {
                let comment_p = self.ctx.p;
                match self.ctx.text[comment_p + 2..self.ctx.ln].find("-->") {
                    Some(i) => self.ctx.p = comment_p + 2 + i + 3,
                    None => {
                        return Err(self.syntax_error_at(
                            "Comment was not closed with \"-->\".",
                            comment_p,
                        ))
                    }
                }
            } else {
                return Ok(Some(c));
            }
        }
        Ok(None)
    }

    /// Tells if there is only whitespace before `pos` in its line.
    fn is_line_empty_before(&self, pos: usize) -> bool {
        self.ctx.text[..pos]
            .chars()
            .rev()
            .take_while(|&c| c != '\n' && c != '\r')
            .all(is_ws)
    }

    /// Skips the separator between two items and the whitespace around it.
    /// The cursor is left on the next item or the terminator.
    ///
    /// # Arguments
    /// * `terminator` - Closing bracket of the listing, `None` for the end of the text
    /// * `colon_bad` - When set, a colon is an error, and this is the reason
    ///
    /// # Errors
    /// * `Error::SyntaxError` if there is no valid separator
    pub(super) fn skip_separator(
        &mut self,
        terminator: Option<char>,
        colon_bad: Option<&str>,
    ) -> Result<Separator> {
        let initial_p = self.ctx.p;
        let c = self.skip_ws()?;
        match c {
            Some('+') => Err(self.syntax_error(HASH_UNION_DEPRECATED)),
            Some(':') if colon_bad.is_some() => Err(self.syntax_error(format!(
                "Colon (:) shouldn't be used here. {}",
                colon_bad.unwrap_or_default()
            ))),
            Some(sep @ (',' | ':')) => {
                self.ctx.p += 1;
                self.skip_ws()?;
                Ok(if sep == ',' { Separator::Comma } else { Separator::Colon })
            }
            Some(c) if Some(c) == terminator => Ok(Separator::Terminator),
            None if terminator.is_none() => Ok(Separator::Terminator),
            None => Ok(Separator::Eos),
            Some(';') => Err(self.syntax_error(
                "Semicolon (;) was unexpected here. If you want to separate items in a \
                 listing then use comma (,) instead.",
            )),
            Some('=') => Err(self.syntax_error(
                "Equals sign (=) was unexpected here. If you want to associate a key with \
                 a value then use colon (:) instead.",
            )),
            Some(_) if self.ctx.skip_ws_found_nl => Ok(Separator::Comma),
            Some(c) if self.ctx.p == initial_p => Err(self.syntax_error(format!(
                "Character {} shouldn't occur here.",
                quote_or_name(c)
            ))),
            Some(_) => Err(self.syntax_error(
                "No separator was used before the item. Items in listings should be \
                 separated with comma (,) or line-break. Keys and values in hashes should be \
                 separated with colon (:).",
            )),
        }
    }

    /// Moves the cursor after the expression that starts at it, without
    /// evaluating anything.
    pub(super) fn skip_expression(&mut self) -> Result<()> {
        let Some(c) = self.ctx.peek() else {
            return Err(self.syntax_error("Unexpected end of the text."));
        };

        let closing = match c {
            '{' => Some('}'),
            '[' => Some(']'),
            // unresolved object in a dump
            '<' => Some('>'),
            '(' => Some(')'),
            _ => None,
        };
        if let Some(closing) = closing {
            self.ctx.p += 1;
            self.skip_listing(closing)?;
            self.ctx.p += 1;
            return Ok(());
        }

        let b = self.ctx.p;
        if c == '"' || c == '\'' {
            self.ctx.p += 1;
            while let Some(d) = self.ctx.peek() {
                self.ctx.p += d.len_utf8();
                if d == c {
                    return Ok(());
                }
                if d == '\\' {
                    if let Some(escaped) = self.ctx.peek() {
                        self.ctx.p += escaped.len_utf8();
                    }
                }
            }
            return Err(self.missing_quote(c, b));
        }

        if c == 'r' {
            if let Some(q @ ('"' | '\'')) = self.ctx.char_at(b + 1) {
                return match self.ctx.text[b + 2..self.ctx.ln].find(q) {
                    Some(i) => {
                        self.ctx.p = b + 2 + i + 1;
                        Ok(())
                    }
                    None => Err(self.missing_quote(q, b)),
                };
            }
        }

        self.scan_unquoted(false);
        if b == self.ctx.p {
            return Err(self.syntax_error_at("Unexpected character.", b));
        }
        let old_p = self.ctx.p;
        if self.skip_ws()? == Some('(') {
            self.ctx.p += 1;
            self.skip_listing(')')?;
            self.ctx.p += 1;
        } else {
            self.ctx.p = old_p;
        }
        Ok(())
    }

    /// Skips the items of a listing up to `terminator`, leaving the cursor on
    /// it. Separators aren't checked.
    fn skip_listing(&mut self, terminator: char) -> Result<()> {
        let list_p = self.ctx.p.saturating_sub(1);
        self.skip_ws()?;
        loop {
            match self.ctx.peek() {
                Some(c) if c == terminator => return Ok(()),
                Some(',' | ':' | ';' | '=') => self.ctx.p += 1,
                Some(_) => self.skip_expression()?,
                None => {
                    return Err(self.syntax_error_at(
                        format!(
                            "Reached the end of the text, but the closing {} is missing.",
                            quote_or_name(terminator)
                        ),
                        list_p,
                    ))
                }
            }
            if self.skip_ws()? == Some(terminator) {
                return Ok(());
            }
        }
    }

    /// Moves the cursor after the unquoted token that starts at it. A leading
    /// `+` belongs to the token; a colon belongs to it unless `hash_key`.
    pub(super) fn scan_unquoted(&mut self, hash_key: bool) {
        let b = self.ctx.p;
        while let Some(c) = self.ctx.peek() {
            let accepted = is_unquoted_char(c)
                || (c == '+' && self.ctx.p == b)
                || (c == ':' && !hash_key);
            if !accepted {
                break;
            }
            self.ctx.p += c.len_utf8();
        }
    }
}
