//! The callback interface the interpreter uses to resolve function calls and
//! to report the structure it walks through.

use crate::error::Result;
use crate::function_call::FunctionCall;
use crate::interpreter::Context;
use crate::value::Value;

/// A structural point reached during evaluation.
///
/// Each `Enter*` event is followed by the matching `Leave*` event, even when
/// evaluating the scope fails. If handling an `Enter*` event fails there will
/// be no `Leave*` event for it.
///
/// [`Context::position`] at the time of the event:
/// * `EnterHashKey`: the first character of the value of the `key: value` pair
/// * `EnterHash`, `EnterSequence`, `EnterFunctionParams`: the first character
///   after the opening bracket
/// * `Leave*`: the closing bracket, or the end of the text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    /// Start of the value of a `key: value` pair, or of an implicit `true` key.
    EnterHashKey(&'a str),
    LeaveHashKey(&'a str),
    /// Start of the parameter list of the named function.
    EnterFunctionParams(&'a str),
    LeaveFunctionParams(&'a str),
    /// Start of a sequence. Not sent for function parameter lists.
    EnterSequence,
    LeaveSequence,
    /// Start of a hash. The hash being built is the last of
    /// [`Context::open_hashes`] until the matching `LeaveHash`.
    EnterHash,
    LeaveHash,
}

/// What [`EvaluationEnvironment::notify`] asks the interpreter to do instead
/// of the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Don't evaluate the upcoming value, store it as a
    /// [`crate::fragment::Fragment`] instead.
    ///
    /// Honored for `EnterHashKey` with an explicit value and for `EnterHash`
    /// of a braced hash. An implicit `true` value is stored as is.
    Fragment,
    /// Don't evaluate the upcoming value and don't store the `key: value`
    /// pair at all. For `EnterHash` this acts like [`Response::Fragment`].
    Skip,
}

/// Policy object that resolves function calls and observes evaluation.
pub trait EvaluationEnvironment {
    /// Evaluates a function call whose parameters are already evaluated.
    ///
    /// Returning `Value::FunctionCall` with the same call means the function
    /// stays unresolved; it will not be evaluated again.
    ///
    /// "Same" is decided by equality, not identity: a returned call with the
    /// same name and equal parameters counts as unresolved even if it was
    /// built anew. At a hash key position an unresolved call is an error, a
    /// call that differs in name or parameters is treated as the function's
    /// result (and so must be a hash to be merged).
    fn eval_function_call(&mut self, call: FunctionCall, ctx: &Context) -> Result<Value>;

    /// Notifies about an [`Event`]. `Ok(None)` means "do nothing special".
    /// Implementations must ignore events they are not interested in.
    fn notify(&mut self, _event: Event<'_>, _ctx: &Context) -> Result<Option<Response>> {
        Ok(None)
    }
}

/// Environment that leaves every function call unresolved.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleEnvironment;

impl EvaluationEnvironment for SimpleEnvironment {
    fn eval_function_call(&mut self, call: FunctionCall, _ctx: &Context) -> Result<Value> {
        Ok(Value::FunctionCall(call))
    }
}
