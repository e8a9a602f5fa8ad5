use tdd::{
    environment::{Event, EvaluationEnvironment, Response},
    error::{Error, Result},
    function_call::FunctionCall,
    interpreter::{eval, eval_as_hash, eval_fragment, Context},
    value::{Hash, Value},
};

/// Records every event and answers chosen ones with a response.
#[derive(Default)]
struct Recorder {
    events: Vec<String>,
    key_responses: Vec<(&'static str, Response)>,
    hash_response: Option<Response>,
    fail_on_sequence: bool,
}

impl EvaluationEnvironment for Recorder {
    fn eval_function_call(&mut self, call: FunctionCall, ctx: &Context) -> Result<Value> {
        match call.name() {
            "count" => {
                let open = ctx.open_hashes().last().map_or(0, Hash::len);
                Ok(Value::Integer(open as i64))
            }
            "defaults" => Ok(Value::Hash(Hash::from([("a".to_string(), Value::Integer(1))]))),
            "keep" => Ok(Value::FunctionCall(call)),
            "rebuild" => Ok(Value::FunctionCall(FunctionCall::new("rebuild", call.into_params()))),
            "rename" => Ok(Value::FunctionCall(FunctionCall::new("renamed", call.into_params()))),
            "boom" => Err(Error::DataLoaderError("boom failed".to_string())),
            name => Ok(Value::String(format!("{name}:{}", call.params().len()))),
        }
    }

    fn notify(&mut self, event: Event<'_>, ctx: &Context) -> Result<Option<Response>> {
        self.events.push(format!("{event:?}"));
        match event {
            Event::EnterSequence if self.fail_on_sequence => {
                Err(Error::DataLoaderError("no sequences".to_string()))
            }
            Event::EnterHash if ctx.position() > 0 => Ok(self.hash_response),
            Event::EnterHashKey(key) => Ok(self
                .key_responses
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, response)| *response)),
            _ => Ok(None),
        }
    }
}

fn balanced(events: &[String]) -> bool {
    let enters = events.iter().filter(|e| e.starts_with("Enter")).count();
    let leaves = events.iter().filter(|e| e.starts_with("Leave")).count();
    enters == leaves
}

#[test]
fn test_event_order() {
    let mut env = Recorder::default();
    eval_as_hash("a: [1], b: {c: 2}", Some(&mut env), false, None).unwrap();
    assert_eq!(
        env.events,
        [
            "EnterHash",
            "EnterHashKey(\"a\")",
            "EnterSequence",
            "LeaveSequence",
            "LeaveHashKey(\"a\")",
            "EnterHashKey(\"b\")",
            "EnterHash",
            "EnterHashKey(\"c\")",
            "LeaveHashKey(\"c\")",
            "LeaveHash",
            "LeaveHashKey(\"b\")",
            "LeaveHash",
        ]
    );
}

#[test]
fn test_function_params_events() {
    let mut env = Recorder::default();
    let value = eval("f(1, [2])", Some(&mut env), false, None).unwrap();
    assert_eq!(value, Value::String("f:2".to_string()));
    assert_eq!(
        env.events,
        ["EnterFunctionParams(\"f\")", "EnterSequence", "LeaveSequence", "LeaveFunctionParams(\"f\")"]
    );
}

#[test]
fn test_fragment_capture() {
    let mut env = Recorder { key_responses: vec![("x", Response::Fragment)], ..Default::default() };
    let map = eval_as_hash("x: {a:1, b:2}, y: 3", Some(&mut env), false, None).unwrap();
    let Value::Fragment(fragment) = &map["x"] else {
        panic!("Expected a fragment, got {:?}", map["x"]);
    };
    assert_eq!(fragment.as_str(), "{a:1, b:2}");
    assert_eq!(map["y"], Value::Integer(3));

    let value = eval_fragment(fragment, None, false).unwrap();
    let Value::Hash(inner) = value else {
        panic!("Expected a hash");
    };
    assert_eq!(inner["b"], Value::Integer(2));
}

#[test]
fn test_fragment_capture_does_not_call_functions() {
    let mut env = Recorder { key_responses: vec![("x", Response::Fragment)], ..Default::default() };
    let map = eval_as_hash("x: boom(1, 2), y: 1", Some(&mut env), false, None).unwrap();
    let Value::Fragment(fragment) = &map["x"] else {
        panic!("Expected a fragment, got {:?}", map["x"]);
    };
    assert_eq!(fragment.as_str(), "boom(1, 2)");
}

#[test]
fn test_skip_response() {
    let mut env = Recorder {
        key_responses: vec![("x", Response::Skip), ("flag", Response::Skip)],
        ..Default::default()
    };
    let map = eval_as_hash("x: [1, 2], flag, y: 2", Some(&mut env), false, None).unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map["y"], Value::Integer(2));
}

#[test]
fn test_fragment_response_on_implicit_true() {
    let mut env = Recorder { key_responses: vec![("flag", Response::Fragment)], ..Default::default() };
    let map = eval_as_hash("flag", Some(&mut env), false, None).unwrap();
    assert_eq!(map["flag"], Value::Boolean(true));
}

#[test]
fn test_hash_response_yields_fragment() {
    let mut env = Recorder { hash_response: Some(Response::Skip), ..Default::default() };
    let map = eval_as_hash("a: {b: [1, 2]}, c: 3", Some(&mut env), false, None).unwrap();
    let Value::Fragment(fragment) = &map["a"] else {
        panic!("Expected a fragment, got {:?}", map["a"]);
    };
    assert_eq!(fragment.as_str(), "{b: [1, 2]}");
    assert_eq!(map["c"], Value::Integer(3));
    assert!(balanced(&env.events));
}

#[test]
fn test_function_results_are_used() {
    let mut env = Recorder::default();
    let map = eval_as_hash("a: f(1, 2), g(): 5", Some(&mut env), false, None).unwrap();
    assert_eq!(map["a"], Value::String("f:2".to_string()));
    assert_eq!(map["g:0"], Value::Integer(5));
}

#[test]
fn test_function_key_is_merged() {
    let mut env = Recorder::default();
    let map = eval_as_hash("defaults(), b: 2", Some(&mut env), false, None).unwrap();
    assert_eq!(map["a"], Value::Integer(1));
    assert_eq!(map["b"], Value::Integer(2));
}

#[test]
fn test_function_key_must_give_hash() {
    let mut env = Recorder::default();
    let err = eval_as_hash("name(), b: 2", Some(&mut env), false, None).unwrap_err();
    let Error::EvalError { message, .. } = err else {
        panic!("Expected an evaluation error");
    };
    assert_eq!(
        message,
        "Function doesn't evaluate to a hash, but to string, so it can't be merged into the hash."
    );
}

#[test]
fn test_unresolved_function_value_stays_in_result() {
    let mut env = Recorder::default();
    let map = eval_as_hash("a: keep(1)", Some(&mut env), false, None).unwrap();
    assert_eq!(
        map["a"],
        Value::FunctionCall(FunctionCall::new("keep", vec![Value::Integer(1)]))
    );
}

#[test]
fn test_open_hashes_are_visible() {
    let mut env = Recorder::default();
    let map = eval_as_hash("a: 1, b: 2, n: count(), h: {x: 1, n: count()}", Some(&mut env), false, None)
        .unwrap();
    assert_eq!(map["n"], Value::Integer(2));
    assert_eq!(map["h"].as_hash().unwrap()["n"], Value::Integer(1));
}

#[test]
fn test_function_failure_is_wrapped() {
    let mut env = Recorder::default();
    let err = eval_as_hash("a: 1,\nb: boom()", Some(&mut env), false, None).unwrap_err();
    let Error::EvalError { message, location, cause } = &err else {
        panic!("Expected an evaluation error, got {err:?}");
    };
    assert_eq!(message, "Failed to evaluate function \"boom\".");
    assert_eq!(location.line_and_column(), (2, 4));
    assert!(matches!(cause.as_deref(), Some(Error::DataLoaderError(_))));
    let source = std::error::Error::source(&err).unwrap();
    assert_eq!(source.to_string(), "Data loader error: boom failed");
}

#[test]
fn test_leave_events_are_sent_on_error() {
    let mut env = Recorder::default();
    assert!(eval_as_hash("a: [1, {b: 2", Some(&mut env), false, None).is_err());
    assert!(balanced(&env.events));
    assert_eq!(env.events.last().map(String::as_str), Some("LeaveHash"));
}

#[test]
fn test_failed_enter_has_no_leave() {
    let mut env = Recorder { fail_on_sequence: true, ..Default::default() };
    let err = eval("[1]", Some(&mut env), false, None).unwrap_err();
    assert!(matches!(err, Error::WrappedError { .. }));
    assert_eq!(env.events, ["EnterSequence"]);
}

#[test]
fn test_equal_call_in_key_position_is_unresolved() {
    let mut env = Recorder::default();
    for text in ["keep(1)", "rebuild(1)", "rebuild(1): 2"] {
        let err = eval_as_hash(text, Some(&mut env), false, None).unwrap_err();
        let Error::EvalError { message, .. } = err else {
            panic!("Expected an evaluation error for {text}");
        };
        assert_eq!(
            message,
            "You can't use the function here, because it can't be evaluated in this context."
        );
    }
}

#[test]
fn test_different_call_in_key_position_is_a_result() {
    let mut env = Recorder::default();
    let err = eval_as_hash("rename(1)", Some(&mut env), false, None).unwrap_err();
    let Error::EvalError { message, .. } = err else {
        panic!("Expected an evaluation error");
    };
    assert_eq!(
        message,
        "Function doesn't evaluate to a hash, but to function call, so it can't be merged into the hash."
    );
}
