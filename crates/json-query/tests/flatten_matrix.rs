use json_query::{flatten, json_query, unflatten, ResultOptions, UnflattenError};
use serde_json::{json, Value};

fn reputons() -> Value {
    json!({
        "application": "hiking",
        "reputons": [
            {
                "rater": "HikingAsylum",
                "assertion": "advanced",
                "rated": "Marilyn C",
                "rating": 0.90
            },
            {
                "rater": "HikingAsylum",
                "assertion": "intermediate",
                "rated": "Hongmin",
                "rating": 0.75
            }
        ]
    })
}

#[test]
fn reputons_round_trip() {
    let doc = reputons();
    let flat = flatten(&doc);
    assert_eq!(
        flat,
        json!({
            "$['application']": "hiking",
            "$['reputons'][0]['rater']": "HikingAsylum",
            "$['reputons'][0]['assertion']": "advanced",
            "$['reputons'][0]['rated']": "Marilyn C",
            "$['reputons'][0]['rating']": 0.90,
            "$['reputons'][1]['rater']": "HikingAsylum",
            "$['reputons'][1]['assertion']": "intermediate",
            "$['reputons'][1]['rated']": "Hongmin",
            "$['reputons'][1]['rating']": 0.75
        })
    );
    assert_eq!(unflatten(&flat).unwrap(), doc);
}

#[test]
fn flattened_keys_are_queries_for_their_values() {
    let doc = reputons();
    let flat = flatten(&doc);
    let members = flat.as_object().unwrap();
    assert_eq!(members.len(), 9);
    for (key, value) in members {
        assert_eq!(json_query(&doc, key, ResultOptions::VALUE).unwrap(), json!([value]));
    }
}

#[test]
fn leaves_match_the_leaf_paths_of_a_query() {
    let doc = reputons();
    let flat = flatten(&doc);
    let leaf_paths = json_query(&doc, "$..*", ResultOptions::PATH | ResultOptions::SORT).unwrap();
    let mut keys: Vec<&str> = flat.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    let mut leaves: Vec<&str> = leaf_paths
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .filter(|path| !keys.iter().any(|key| key.starts_with(*path) && key != path))
        .collect();
    leaves.sort_unstable();
    assert_eq!(leaves, keys);
}

#[test]
fn nested_and_empty_shapes_round_trip() {
    for doc in [
        json!(null),
        json!("text"),
        json!([]),
        json!({}),
        json!([[1, []], {"a": {}, "b": [null, {"c": [true]}]}]),
        json!({"odd key's": {"[0]": "x", "": 1}}),
    ] {
        assert_eq!(unflatten(&flatten(&doc)).unwrap(), doc, "for {doc}");
    }
}

#[test]
fn malformed_flat_documents() {
    assert_eq!(unflatten(&json!("x")).unwrap_err(), UnflattenError::NotAnObject);
    let err = unflatten(&json!({"$['a'": 1})).unwrap_err();
    assert!(matches!(err, UnflattenError::InvalidPath { .. }));
    assert!(err.to_string().starts_with("Invalid path '$['a''"));
}
