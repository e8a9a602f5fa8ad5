use std::str::FromStr;

use bigdecimal::BigDecimal;

use super::chars::is_ws;
use super::skip::Separator;
use super::Interpreter;
use crate::environment::{Event, Response};
use crate::error::Result;
use crate::function_call::FunctionCall;
use crate::loader::convert_to_data_map;
use crate::strings::quote_or_name;
use crate::value::{Hash, Value};

const CANT_EVALUATE_FUNCTION: &str =
    "You can't use the function here, because it can't be evaluated in this context.";

impl Interpreter<'_> {
    /// Fetches separated expressions until `terminator` (`None` for the end
    /// of the text). The cursor is left on the terminator.
    pub(super) fn fetch_sequence_inner(
        &mut self,
        terminator: Option<char>,
        force: bool,
    ) -> Result<Vec<Value>> {
        let mut list = Vec::new();
        let mut list_p = self.ctx.p.saturating_sub(1);
        self.skip_ws()?;
        if terminator.is_none() {
            list_p = self.ctx.p;
        }

        loop {
            match self.ctx.peek() {
                Some(c) if Some(c) == terminator => return Ok(list),
                Some(',') => return Err(self.syntax_error("List item is missing before the comma.")),
                Some(_) => {}
                None => {
                    return match terminator {
                        None => Ok(list),
                        Some(t) => Err(self.syntax_error_at(
                            format!(
                                "Reached the end of the text, but the list was not closed with {}.",
                                quote_or_name(t)
                            ),
                            list_p,
                        )),
                    }
                }
            }
            list.push(self.fetch_expression(force, false)?);
            let sep = self.skip_separator(terminator, Some("This is a list, and not a hash."))?;
            if sep == Separator::Terminator {
                return Ok(list);
            }
        }
    }

    /// Fetches separated `key: value` pairs into the innermost open hash until
    /// `terminator` (`None` for the end of the text). The cursor is left on
    /// the terminator.
    pub(super) fn fetch_hash_inner(&mut self, terminator: Option<char>, force: bool) -> Result<()> {
        let mut map_p = self.ctx.p.saturating_sub(1);
        self.skip_ws()?;
        if terminator.is_none() {
            map_p = self.ctx.p;
        }

        loop {
            match self.ctx.peek() {
                Some(c) if Some(c) == terminator => return Ok(()),
                Some(',') => {
                    return Err(self.syntax_error("Key-value pair is missing before the comma."))
                }
                Some(_) => {}
                None => {
                    return match terminator {
                        None => Ok(()),
                        Some(t) => Err(self.syntax_error_at(
                            format!(
                                "Reached the end of the text, but the map was not closed with {}.",
                                quote_or_name(t)
                            ),
                            map_p,
                        )),
                    }
                }
            }

            let key_p = self.ctx.p;
            let (key, key_func) = match self.fetch_expression(false, true)? {
                Value::FunctionCall(call) => {
                    let unresolved = call.clone();
                    (self.call_function(call, key_p)?, Some(unresolved))
                }
                other => (other, None),
            };
            let unresolved = matches!(
                (&key, &key_func),
                (Value::FunctionCall(result), Some(call)) if result == call
            );

            let sep = match self.skip_separator(terminator, None)? {
                Separator::Colon => self.fetch_hash_value(key, unresolved, key_p, terminator, force)?,
                sep => {
                    self.store_bare_key(key, key_func.is_some(), unresolved, key_p)?;
                    sep
                }
            };
            if sep == Separator::Terminator {
                return Ok(());
            }
        }
    }

    /// The `value` part of `key: value`; the cursor is after the colon.
    fn fetch_hash_value(
        &mut self,
        key: Value,
        unresolved: bool,
        key_p: usize,
        terminator: Option<char>,
        force: bool,
    ) -> Result<Separator> {
        let name = match key {
            Value::String(name) => name,
            _ if unresolved => return Err(self.eval_error(CANT_EVALUATE_FUNCTION, key_p)),
            other => {
                return Err(self.eval_error(
                    format!("The key must be a String, but it is a(n) {}.", other.type_name()),
                    key_p,
                ))
            }
        };
        if self.ctx.p == self.ctx.ln {
            return Err(self.syntax_error_at(
                "The key must be followed by a value because colon was used.",
                key_p,
            ));
        }

        let value_key = name.clone();
        self.scoped(
            Event::EnterHashKey(&name),
            Event::LeaveHashKey(&name),
            key_p,
            |ip, response| {
                match response {
                    None => {
                        let value = ip.fetch_expression(force, false)?;
                        ip.put(value_key, value);
                    }
                    Some(response) => {
                        let start = ip.ctx.p;
                        ip.skip_expression()?;
                        if response == Response::Fragment {
                            let fragment = ip.fragment(start, ip.ctx.p);
                            ip.put(value_key, Value::Fragment(fragment));
                        }
                    }
                }
                Ok(())
            },
        )?;

        self.skip_separator(
            terminator,
            Some(
                "Colon is for separating the key from the value, \
                 and the value was already given previously.",
            ),
        )
    }

    /// A hash entry without colon: either a key with implicit `true` value, or
    /// a hash (or function returning one) merged into the current hash.
    fn store_bare_key(
        &mut self,
        key: Value,
        from_function: bool,
        unresolved: bool,
        key_p: usize,
    ) -> Result<()> {
        if !from_function {
            if let Value::String(name) = key {
                let value_key = name.clone();
                return self.scoped(
                    Event::EnterHashKey(&name),
                    Event::LeaveHashKey(&name),
                    key_p,
                    |ip, response| {
                        if response != Some(Response::Skip) {
                            ip.put(value_key, Value::Boolean(true));
                        }
                        Ok(())
                    },
                );
            }
        }

        let entries = match convert_to_data_map(key) {
            Ok(entries) => entries,
            Err(value) => {
                let message = if !from_function {
                    format!(
                        "This expression should be either a string or a hash, but it is a(n) {}.",
                        value.type_name()
                    )
                } else if unresolved {
                    CANT_EVALUATE_FUNCTION.to_string()
                } else {
                    format!(
                        "Function doesn't evaluate to a hash, but to {}, \
                         so it can't be merged into the hash.",
                        value.type_name()
                    )
                };
                return Err(self.eval_error(message, key_p));
            }
        };
        self.merge(entries);
        Ok(())
    }

    /// Fetches an expression starting exactly at the cursor.
    ///
    /// With `hash_key`, unquoted tokens are always strings, they end at colon,
    /// and function calls are returned unresolved.
    pub(super) fn fetch_expression(&mut self, force: bool, hash_key: bool) -> Result<Value> {
        let Some(c) = self.ctx.peek() else {
            return Err(self.syntax_error("Unexpected end of the text."));
        };
        match c {
            '{' => return self.fetch_hash(force),
            '[' => return self.fetch_sequence(force),
            '"' | '\'' => return self.fetch_quoted(c),
            _ => {}
        }
        if c == 'r' {
            if let Some(q @ ('"' | '\'')) = self.ctx.char_at(self.ctx.p + 1) {
                return self.fetch_raw(q);
            }
        }
        self.fetch_unquoted(force, hash_key)
    }

    fn fetch_hash(&mut self, force: bool) -> Result<Value> {
        let start = self.ctx.p;
        self.ctx.p += 1;
        self.ctx.open_hashes.push(Hash::new());
        let pos = self.ctx.p;
        let result = self.scoped(Event::EnterHash, Event::LeaveHash, pos, |ip, response| {
            if response.is_none() {
                ip.fetch_hash_inner(Some('}'), force)?;
                return Ok(None);
            }
            ip.ctx.p = start;
            ip.skip_expression()?;
            let fragment = ip.fragment(start, ip.ctx.p);
            // Back on the closing brace, like after a normal hash.
            ip.ctx.p -= 1;
            Ok(Some(fragment))
        });
        let map = self.ctx.open_hashes.pop().unwrap_or_default();
        let fragment = result?;
        self.ctx.p += 1;
        Ok(match fragment {
            Some(fragment) => Value::Fragment(fragment),
            None => Value::Hash(map),
        })
    }

    fn fetch_sequence(&mut self, force: bool) -> Result<Value> {
        self.ctx.p += 1;
        let pos = self.ctx.p;
        let items = self.scoped(Event::EnterSequence, Event::LeaveSequence, pos, |ip, _| {
            ip.fetch_sequence_inner(Some(']'), force)
        })?;
        self.ctx.p += 1;
        Ok(Value::Sequence(items))
    }

    fn fetch_quoted(&mut self, quote: char) -> Result<Value> {
        let b = self.ctx.p;
        self.ctx.p += 1;
        let mut buf = String::new();
        let mut bidx = self.ctx.p;
        loop {
            let Some(c) = self.ctx.peek() else {
                return Err(self.missing_quote(quote, b));
            };
            if c == quote {
                buf.push_str(&self.ctx.text[bidx..self.ctx.p]);
                self.ctx.p += 1;
                return Ok(Value::String(buf));
            }
            if c != '\\' {
                self.ctx.p += c.len_utf8();
                continue;
            }

            buf.push_str(&self.ctx.text[bidx..self.ctx.p]);
            let Some(e) = self.ctx.char_at(self.ctx.p + 1) else {
                return Err(self.missing_quote(quote, b));
            };
            let unescaped = match e {
                '"' => Some('"'),
                '\'' => Some('\''),
                '\\' => Some('\\'),
                'n' => Some('\n'),
                'r' => Some('\r'),
                't' => Some('\t'),
                'f' => Some('\u{c}'),
                'b' => Some('\u{8}'),
                'g' => Some('>'),
                'l' => Some('<'),
                'a' => Some('&'),
                '{' => Some('{'),
                _ => None,
            };
            if let Some(u) = unescaped {
                buf.push(u);
                bidx = self.ctx.p + 2;
            } else if e == 'x' || e == 'u' {
                buf.push(self.fetch_hex_escape()?);
                bidx = self.ctx.p;
            } else if is_ws(e) {
                bidx = self.skip_escaped_line_break(self.ctx.p + 1)?;
            } else {
                return Err(
                    self.syntax_error(format!("Invalid escape sequence \\{e} in the string literal."))
                );
            }
            self.ctx.p = bidx;
        }
    }

    /// `\xHHHH` or `\uHHHH` with 1 to 4 hexadecimal digits; the cursor is on
    /// the backslash and is left after the last digit.
    fn fetch_hex_escape(&mut self) -> Result<char> {
        let escape_p = self.ctx.p;
        self.ctx.p += 2;
        let digits_p = self.ctx.p;
        let limit = (digits_p + 4).min(self.ctx.ln);
        let mut code = 0u32;
        while self.ctx.p < limit {
            let Some(digit) = self.ctx.peek().and_then(|c| c.to_digit(16)) else {
                break;
            };
            code = (code << 4) + digit;
            self.ctx.p += 1;
        }
        match char::from_u32(code) {
            Some(c) if self.ctx.p > digits_p => Ok(c),
            _ => Err(self.syntax_error_at(
                "Invalid hexadecimal UNICODE escape in the string literal.",
                escape_p,
            )),
        }
    }

    /// Backslash followed by whitespace: skips the whitespace up to and
    /// including exactly one line break. Returns the offset after it.
    fn skip_escaped_line_break(&self, from: usize) -> Result<usize> {
        let mut i = from;
        let mut found_nl = false;
        while let Some(c) = self.ctx.char_at(i) {
            if !is_ws(c) {
                break;
            }
            if c == '\n' || c == '\r' {
                if found_nl {
                    break;
                }
                found_nl = true;
                if c == '\r' && self.ctx.char_at(i + 1) == Some('\n') {
                    i += 1;
                }
            }
            i += c.len_utf8();
        }
        if !found_nl {
            return Err(self.syntax_error(
                "Invalid usage of escape sequence \\white-space. \
                 This escape sequence can be used only before line-break.",
            ));
        }
        Ok(i)
    }

    /// `r"..."` or `r'...'`, without any escapes.
    fn fetch_raw(&mut self, quote: char) -> Result<Value> {
        let b = self.ctx.p;
        let body = b + 2;
        match self.ctx.text[body..self.ctx.ln].find(quote) {
            Some(i) => {
                let end = body + i;
                self.ctx.p = end + 1;
                Ok(Value::String(self.ctx.text[body..end].to_string()))
            }
            None => Err(self.missing_quote(quote, b)),
        }
    }

    /// Unquoted string, boolean, number or function call.
    fn fetch_unquoted(&mut self, force: bool, hash_key: bool) -> Result<Value> {
        let b = self.ctx.p;
        self.scan_unquoted(hash_key);
        if b == self.ctx.p {
            return Err(self.syntax_error_at("Unexpected character.", b));
        }
        let s = self.ctx.text[b..self.ctx.p].to_string();

        let old_p = self.ctx.p;
        if self.skip_ws()? == Some('(') {
            self.ctx.p += 1;
            let params = self.scoped(
                Event::EnterFunctionParams(&s),
                Event::LeaveFunctionParams(&s),
                b,
                |ip, _| ip.fetch_sequence_inner(Some(')'), force),
            )?;
            self.ctx.p += 1;
            let call = FunctionCall::new(s, params);
            return if hash_key {
                Ok(Value::FunctionCall(call))
            } else {
                self.call_function(call, b)
            };
        }
        self.ctx.p = old_p;

        if force || hash_key {
            Ok(Value::String(s))
        } else {
            Ok(classify_token(s))
        }
    }
}

/// Boolean, then `i64`, then decimal, and a plain string when none fits.
fn classify_token(s: String) -> Value {
    match s.as_str() {
        "true" => return Value::Boolean(true),
        "false" => return Value::Boolean(false),
        _ => {}
    }
    if s.starts_with(|c: char| c.is_ascii_digit() || c == '+' || c == '-') {
        let numeral = s.strip_prefix('+').unwrap_or(&s);
        if let Ok(n) = numeral.parse::<i64>() {
            return Value::Integer(n);
        }
        if is_decimal_numeral(numeral) {
            if let Ok(d) = BigDecimal::from_str(numeral) {
                return Value::Decimal(d);
            }
        }
    }
    Value::String(s)
}

fn is_decimal_numeral(s: &str) -> bool {
    s.bytes().any(|b| b.is_ascii_digit())
        && s.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
}
