//! TDD interpreter.
//!
//! A single-pass recursive descent scanner that evaluates while it reads: there
//! is no intermediate syntax tree, every grammar rule returns its [`Value`]
//! directly. Function calls and structural events are reported to an
//! [`EvaluationEnvironment`], which resolves the calls and may ask for parts of
//! the text to be captured as [`Fragment`]s instead of being evaluated.

mod chars;
mod fetch;
mod skip;

use std::sync::Arc;

use crate::environment::{Event, EvaluationEnvironment, Response, SimpleEnvironment};
use crate::error::{Error, Location, Result};
use crate::fragment::Fragment;
use crate::function_call::FunctionCall;
use crate::strings::{j_quote, quote_or_name};
use crate::value::{Hash, Value};

pub(crate) use chars::is_ws;

/// Parser state of one evaluation, handed to the [`EvaluationEnvironment`]
/// callbacks.
#[derive(Debug)]
pub struct Context {
    text: Arc<str>,
    /// Cursor, a byte offset into `text`
    p: usize,
    /// End of the evaluated window (the fragment end, or the text length)
    ln: usize,
    file_name: Option<String>,
    /// Set by the last whitespace skip if it crossed a line break
    skip_ws_found_nl: bool,
    open_hashes: Vec<Hash>,
}

impl Context {
    fn new(text: Arc<str>, start: usize, end: usize, file_name: Option<String>) -> Self {
        Self {
            text,
            p: start,
            ln: end,
            file_name,
            skip_ws_found_nl: false,
            open_hashes: Vec::new(),
        }
    }

    /// Current byte offset in [`Context::text`].
    pub fn position(&self) -> usize {
        self.p
    }

    /// The whole text being evaluated.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Hashes under construction, innermost last. Includes hashes nested in
    /// sequences and function parameter lists.
    pub fn open_hashes(&self) -> &[Hash] {
        &self.open_hashes
    }

    fn char_at(&self, i: usize) -> Option<char> {
        if i < self.ln {
            self.text[i..self.ln].chars().next()
        } else {
            None
        }
    }

    fn peek(&self) -> Option<char> {
        self.char_at(self.p)
    }

    fn rest(&self) -> &str {
        &self.text[self.p..self.ln]
    }
}

struct Interpreter<'e> {
    ctx: Context,
    env: &'e mut dyn EvaluationEnvironment,
}

/// Evaluates text as a single TDD expression.
///
/// # Arguments
/// * `text` - The text to interpret
/// * `env` - Resolves function calls; [`SimpleEnvironment`] when `None`
/// * `force_string_values` - Read `true` or `123` as strings instead of a boolean or a number
/// * `file_name` - Source of the text, used in error messages only
///
/// # Errors
/// * `Error::SyntaxError` if the text is empty or has anything after the expression
pub fn eval(
    text: impl Into<Arc<str>>,
    env: Option<&mut dyn EvaluationEnvironment>,
    force_string_values: bool,
    file_name: Option<&str>,
) -> Result<Value> {
    let text = text.into();
    let ln = text.len();
    let ctx = Context::new(text, 0, ln, file_name.map(str::to_string));
    run(ctx, env, |ip| ip.eval_single(force_string_values))
}

/// Evaluates a [`Fragment`] as a single TDD expression. The expression may be
/// surrounded with whitespace.
pub fn eval_fragment(
    fragment: &Fragment,
    env: Option<&mut dyn EvaluationEnvironment>,
    force_string_values: bool,
) -> Result<Value> {
    let ctx = Context::new(
        fragment.text().clone(),
        fragment.start(),
        fragment.end(),
        fragment.file_name().map(str::to_string),
    );
    run(ctx, env, |ip| ip.eval_single(force_string_values))
}

/// Evaluates text as a list of `key: value` pairs without the enclosing braces.
///
/// # Returns
/// * `Result<Hash>` - Possibly empty map of the pairs
pub fn eval_as_hash(
    text: impl Into<Arc<str>>,
    env: Option<&mut dyn EvaluationEnvironment>,
    force_string_values: bool,
    file_name: Option<&str>,
) -> Result<Hash> {
    let text = text.into();
    let ln = text.len();
    let ctx = Context::new(text, 0, ln, file_name.map(str::to_string));
    run(ctx, env, |ip| ip.eval_top_hash(force_string_values))
}

/// Evaluates text as a list of values without the enclosing brackets.
///
/// # Returns
/// * `Result<Vec<Value>>` - Possibly empty list of the values
pub fn eval_as_sequence(
    text: impl Into<Arc<str>>,
    env: Option<&mut dyn EvaluationEnvironment>,
    force_string_values: bool,
    file_name: Option<&str>,
) -> Result<Vec<Value>> {
    let text = text.into();
    let ln = text.len();
    let ctx = Context::new(text, 0, ln, file_name.map(str::to_string));
    run(ctx, env, |ip| ip.eval_top_sequence(force_string_values))
}

fn run<T>(
    ctx: Context,
    env: Option<&mut dyn EvaluationEnvironment>,
    f: impl FnOnce(&mut Interpreter<'_>) -> Result<T>,
) -> Result<T> {
    let mut simple = SimpleEnvironment;
    let env: &mut dyn EvaluationEnvironment = match env {
        Some(env) => env,
        None => &mut simple,
    };
    let mut ip = Interpreter { ctx, env };
    f(&mut ip)
}

impl Interpreter<'_> {
    fn eval_single(&mut self, force: bool) -> Result<Value> {
        self.skip_ws()?;
        if self.ctx.p == self.ctx.ln {
            return Err(self.syntax_error("The text is empty."));
        }
        let res = self.fetch_expression(force, false)?;
        self.skip_ws()?;
        if self.ctx.p < self.ctx.ln {
            return Err(self.syntax_error("Extra character(s) after the expression."));
        }
        Ok(res)
    }

    fn eval_top_hash(&mut self, force: bool) -> Result<Hash> {
        self.ctx.open_hashes.push(Hash::new());
        let pos = self.ctx.p;
        let result = self.scoped(Event::EnterHash, Event::LeaveHash, pos, |ip, _| {
            ip.fetch_hash_inner(None, force)
        });
        let map = self.ctx.open_hashes.pop().unwrap_or_default();
        result.map(|()| map)
    }

    fn eval_top_sequence(&mut self, force: bool) -> Result<Vec<Value>> {
        let pos = self.ctx.p;
        self.scoped(Event::EnterSequence, Event::LeaveSequence, pos, |ip, _| {
            ip.fetch_sequence_inner(None, force)
        })
    }

    /// Runs `body` between an enter and a leave notification. The leave
    /// notification is sent whenever the enter notification succeeded; if
    /// both the body and the leave notification fail, the body's error wins.
    fn scoped<T>(
        &mut self,
        enter: Event<'_>,
        leave: Event<'_>,
        enter_pos: usize,
        body: impl FnOnce(&mut Self, Option<Response>) -> Result<T>,
    ) -> Result<T> {
        let response = self.notify(enter, enter_pos)?;
        let result = body(self, response);
        let leave_pos = self.ctx.p;
        let left = self.notify(leave, leave_pos);
        match (result, left) {
            (Err(e), _) => Err(e),
            (Ok(_), Err(e)) => Err(e),
            (Ok(value), Ok(_)) => Ok(value),
        }
    }

    fn notify(&mut self, event: Event<'_>, pos: usize) -> Result<Option<Response>> {
        self.env.notify(event, &self.ctx).map_err(|e| self.wrap_error(e, pos))
    }

    fn call_function(&mut self, call: FunctionCall, pos: usize) -> Result<Value> {
        let name = j_quote(call.name());
        self.env.eval_function_call(call, &self.ctx).map_err(|e| {
            self.eval_error_caused(format!("Failed to evaluate function {name}."), pos, e)
        })
    }

    fn put(&mut self, key: String, value: Value) {
        if let Some(map) = self.ctx.open_hashes.last_mut() {
            map.insert(key, value);
        }
    }

    fn merge(&mut self, entries: Hash) {
        if let Some(map) = self.ctx.open_hashes.last_mut() {
            map.extend(entries);
        }
    }

    fn fragment(&self, start: usize, end: usize) -> Fragment {
        Fragment::new(self.ctx.text.clone(), start, end, self.ctx.file_name.clone())
    }

    fn location(&self, pos: usize) -> Location {
        Location::new(self.ctx.text.clone(), pos, self.ctx.file_name.clone())
    }

    fn syntax_error<S: Into<String>>(&self, message: S) -> Error {
        self.syntax_error_at(message, self.ctx.p)
    }

    fn syntax_error_at<S: Into<String>>(&self, message: S, pos: usize) -> Error {
        Error::SyntaxError { message: message.into(), location: self.location(pos) }
    }

    fn missing_quote(&self, quote: char, pos: usize) -> Error {
        self.syntax_error_at(
            format!("The closing {} of the string is missing.", quote_or_name(quote)),
            pos,
        )
    }

    fn eval_error<S: Into<String>>(&self, message: S, pos: usize) -> Error {
        Error::EvalError { message: message.into(), location: self.location(pos), cause: None }
    }

    fn eval_error_caused<S: Into<String>>(&self, message: S, pos: usize, cause: Error) -> Error {
        Error::EvalError {
            message: message.into(),
            location: self.location(pos),
            cause: Some(Box::new(cause)),
        }
    }

    /// Errors of the interpreter pass through, anything else gets a location.
    fn wrap_error(&self, e: Error, pos: usize) -> Error {
        if e.is_tdd_error() {
            e
        } else {
            Error::WrappedError { cause: Box::new(e), location: self.location(pos) }
        }
    }
}
