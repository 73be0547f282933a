//! JSONPath queries over JSON documents.
//!
//! A query is compiled once into a selector tree and can then be evaluated
//! against any number of documents. Besides plain paths the query language
//! supports unions, slices, recursive descent, filters with arithmetic,
//! comparison and regex operators, computed indices and function calls.
//!
//! # Example
//!
//! ```
//! use json_query::{json_query, json_replace, ResultOptions};
//! use serde_json::json;
//!
//! let mut doc = json!({
//!     "store": {
//!         "book": [
//!             {"author": "Nigel Rees", "price": 8.95},
//!             {"author": "Evelyn Waugh", "price": 12.99}
//!         ]
//!     }
//! });
//!
//! let authors = json_query(&doc, "$.store.book[?(@.price < 10)].author", ResultOptions::VALUE).unwrap();
//! assert_eq!(authors, json!(["Nigel Rees"]));
//!
//! let paths = json_query(&doc, "$..price", ResultOptions::PATH).unwrap();
//! assert_eq!(paths, json!(["$['store']['book'][0]['price']", "$['store']['book'][1]['price']"]));
//!
//! let replaced = json_replace(&mut doc, "$..price", json!(0)).unwrap();
//! assert_eq!(replaced, 2);
//! assert_eq!(doc["store"]["book"][1]["price"], json!(0));
//! ```
//!
//! [`flatten`] turns a document into an object keyed by the normalized path
//! of every leaf, and [`unflatten`] reverses it.
//!
//! Documents are accessed through the [`Document`] trait, implemented here
//! for [`serde_json::Value`].

mod document;
pub use document::Document;

mod error;
pub use error::{Error, ErrorKind, EvalError, JsonPathError, UnflattenError};

mod location;
pub use location::{JsonLocation, PathElement};

mod flatten;
pub use flatten::{flatten, unflatten};

mod options;
pub use options::ResultOptions;

mod functions;
pub use functions::{Function, FunctionBody, Functions};

mod jsonpath;
pub use jsonpath::JsonPath;

pub mod cli;

mod expression;
mod node;
mod operators;
mod parser;
mod resources;
mod results;
mod selector;
mod token;

/// Compile `path` and evaluate it against `root`.
pub fn json_query<D: Document>(root: &D, path: &str, options: ResultOptions) -> Result<D, Error> {
    Ok(JsonPath::compile(path)?.evaluate(root, options)?)
}

/// Compile `path` and report each match to `callback`.
pub fn json_query_with<D, F>(root: &D, path: &str, options: ResultOptions, callback: F) -> Result<(), Error>
where
    D: Document,
    F: FnMut(&JsonLocation, &D),
{
    Ok(JsonPath::compile(path)?.evaluate_with(root, options, callback)?)
}

/// Replace every match of `path` with a clone of `new_value`.
pub fn json_replace<D: Document>(root: &mut D, path: &str, new_value: D) -> Result<usize, Error> {
    json_replace_with(root, path, |_, value| *value = new_value.clone())
}

/// Rewrite every match of `path` in place.
pub fn json_replace_with<D, F>(root: &mut D, path: &str, callback: F) -> Result<usize, Error>
where
    D: Document,
    F: FnMut(&JsonLocation, &mut D),
{
    Ok(JsonPath::compile(path)?.update(root, callback)?)
}

/// Remove every match of `path` from the document.
pub fn remove<D: Document>(root: &mut D, path: &str) -> Result<usize, Error> {
    Ok(JsonPath::compile(path)?.remove(root)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn free_functions_report_syntax_errors() {
        let err = json_query(&json!({}), "$.a[", ResultOptions::VALUE).unwrap_err();
        assert!(matches!(err, Error::Syntax(ref e) if e.kind == ErrorKind::UnexpectedEof));
    }

    #[test]
    fn free_functions_report_evaluation_errors() {
        let err = json_query(&json!({"a": "x"}), "$[?(abs(@.a) > 1)]", ResultOptions::VALUE).unwrap_err();
        assert!(matches!(err, Error::Eval(EvalError::InvalidArgument { .. })));
    }

    #[test]
    fn replace_and_remove() {
        let mut doc = json!({"a": [1, 2, 3], "b": {"c": 1}});
        assert_eq!(json_replace(&mut doc, "$.a[?(@ >= 2)]", json!("big")).unwrap(), 2);
        assert_eq!(doc, json!({"a": [1, "big", "big"], "b": {"c": 1}}));
        assert_eq!(remove(&mut doc, "$..c").unwrap(), 1);
        assert_eq!(doc, json!({"a": [1, "big", "big"], "b": {}}));
    }

    #[test]
    fn callback_variant() {
        let mut paths = Vec::new();
        json_query_with(&json!({"x": {"y": 1}}), "$..y", ResultOptions::VALUE, |location, _| {
            paths.push(location.to_string());
        })
        .unwrap();
        assert_eq!(paths, vec!["$['x']['y']"]);
    }
}
