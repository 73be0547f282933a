use json_query::{json_query, Error, EvalError, Functions, JsonPath, ResultOptions};
use serde_json::{json, Value};

fn scores() -> Value {
    json!([
        {"name": "ada", "scores": [9, 8, 10], "tags": ["math", "logic"]},
        {"name": "bob", "scores": [3, 4], "tags": []},
        {"name": "cy", "scores": [], "nick": " 42 "}
    ])
}

fn values(path: &str, data: &Value) -> Value {
    json_query(data, path, ResultOptions::VALUE).unwrap_or_else(|e| panic!("query failed for '{path}': {e}"))
}

#[test]
fn aggregate_function_matrix() {
    let data = scores();
    assert_eq!(values("$[?(sum(@.scores) > 10)].name", &data), json!(["ada"]));
    assert_eq!(values("$[?(avg(@.scores) == 3.5)].name", &data), json!(["bob"]));
    assert_eq!(values("$[?(max(@.scores) == 10)].name", &data), json!(["ada"]));
    assert_eq!(values("$[?(min(@.scores) == 3)].name", &data), json!(["bob"]));
    assert_eq!(values("$[?(prod(@.scores) == 12)].name", &data), json!(["bob"]));
    assert_eq!(values("sum($[0].scores)", &data), json!([27]));
    assert_eq!(values("avg($[2].scores)", &data), json!([null]));
}

#[test]
fn string_and_shape_function_matrix() {
    let data = scores();
    assert_eq!(values("$[?(length(@.tags) >= 2)].name", &data), json!(["ada"]));
    assert_eq!(values("$[?(contains(@.tags, 'logic'))].name", &data), json!(["ada"]));
    assert_eq!(values("$[?(contains(@.name, 'o'))].name", &data), json!(["bob"]));
    assert_eq!(values("$[?(ends_with(@.name, 'y'))].name", &data), json!(["cy"]));
    assert_eq!(values("$[?(to_number(@.nick) == 42)].name", &data), json!(["cy"]));
    assert_eq!(values("keys($[2])", &data), json!([["name", "scores", "nick"]]));
    assert_eq!(values("tokenize($[0].name, 'd')", &data), json!([["a", "a"]]));
}

#[test]
fn numeric_function_matrix() {
    let data = json!([{"v": -2.5}, {"v": 3}, {"v": 1.2}]);
    assert_eq!(values("$[?(abs(@.v) > 2)].v", &data), json!([-2.5, 3]));
    assert_eq!(values("$[?(ceil(@.v) == 2)].v", &data), json!([1.2]));
    assert_eq!(values("$[?(floor(@.v) == -3)].v", &data), json!([-2.5]));
}

#[test]
fn missing_arguments_become_null() {
    let data = scores();
    // cy has no tags: length(null) is null, which is falsy.
    assert_eq!(values("$[?(length(@.tags) >= 0)].name", &data), json!(["ada", "bob"]));
    assert_eq!(values("$[?(!starts_with(@.nick, ' '))].name", &data), json!(["ada", "bob"]));
}

#[test]
fn wrongly_typed_arguments_are_errors() {
    let data = scores();
    let err = json_query(&data, "$[?(sum(@.name) > 1)]", ResultOptions::VALUE).unwrap_err();
    match err {
        Error::Eval(EvalError::InvalidArgument { function, .. }) => assert_eq!(function, "sum"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(json_query(&data, "$[?(keys(@.scores))]", ResultOptions::VALUE).is_err());
    assert!(json_query(&data, "tokenize($[0].name, '(')", ResultOptions::VALUE).is_err());
}

#[test]
fn user_function_matrix() {
    let mut functions = Functions::<Value>::new();
    functions
        .register("is_even", Some(1), |args: &[&Value]| {
            Ok(json!(args[0].as_i64().map_or(false, |n| n % 2 == 0)))
        })
        .register("first_of", None, |args: &[&Value]| {
            Ok(args.first().map_or(Value::Null, |v| (*v).clone()))
        })
        .register("length", Some(1), |_args: &[&Value]| Ok(json!(-1)));

    let path = JsonPath::compile_with("$[?(is_even(@))]", &functions).unwrap();
    assert_eq!(path.evaluate(&json!([1, 2, 3, 4]), ResultOptions::VALUE).unwrap(), json!([2, 4]));

    let path = JsonPath::compile_with("first_of($.b, $.a)", &functions).unwrap();
    assert_eq!(path.evaluate(&json!({"a": 1, "b": 2}), ResultOptions::VALUE).unwrap(), json!([2]));

    let path = JsonPath::compile_with("length($)", &functions).unwrap();
    assert_eq!(path.evaluate(&json!([1, 2]), ResultOptions::VALUE).unwrap(), json!([-1]));

    let failing = {
        let mut functions = Functions::<Value>::new();
        functions.register("boom", Some(0), |_args: &[&Value]| Err(EvalError::Function("boom".into())));
        JsonPath::compile_with("$[?(boom())]", &functions).unwrap()
    };
    assert_eq!(
        failing.evaluate(&json!([1]), ResultOptions::VALUE).unwrap_err(),
        EvalError::Function("boom".into())
    );
    // Nothing to filter, nothing to call.
    assert_eq!(failing.evaluate(&json!([]), ResultOptions::VALUE).unwrap(), json!([]));
}
