//! Core logic of the `json-query` binary.
//!
//! ```text
//! json-query [--path] [--nodups] [--sort | --sort-desc] [--replace <json> | --remove] '<query>'
//! ```
//!
//! The document is read from stdin; the result is printed as pretty JSON.
//! With `--replace` or `--remove` the updated document is printed instead of
//! the matches.

use crate::{JsonPath, ResultOptions};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Query(#[from] crate::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Query,
    Replace(Value),
    Remove,
}

/// A parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub query: String,
    pub options: ResultOptions,
    pub action: Action,
}

/// Parse the arguments following the program name.
pub fn parse_args<I>(args: I) -> Result<Invocation, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut query = None;
    let mut options = ResultOptions::VALUE;
    let mut action = Action::Query;
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--path" => options |= ResultOptions::PATH,
            "--nodups" => options |= ResultOptions::NODUPS,
            "--sort" => options |= ResultOptions::SORT,
            "--sort-desc" => options |= ResultOptions::SORT_DESCENDING,
            "--remove" => action = Action::Remove,
            "--replace" => {
                let text = args
                    .next()
                    .ok_or_else(|| CliError::Usage("--replace needs a JSON value".to_string()))?;
                action = Action::Replace(serde_json::from_str(&text)?);
            }
            flag if flag.starts_with("--") => {
                return Err(CliError::Usage(format!("unknown flag: {flag}")));
            }
            _ if query.is_some() => {
                return Err(CliError::Usage("expected a single query argument".to_string()));
            }
            _ => query = Some(arg),
        }
    }
    let query = query.ok_or_else(|| CliError::Usage("First argument must be a JSONPath query.".to_string()))?;
    Ok(Invocation { query, options, action })
}

/// Run `invocation` against the JSON text `input`.
pub fn run(invocation: &Invocation, input: &str) -> Result<String, CliError> {
    let mut doc: Value = serde_json::from_str(input)?;
    let path = JsonPath::compile(&invocation.query).map_err(crate::Error::from)?;
    let output = match &invocation.action {
        Action::Query => path
            .evaluate(&doc, invocation.options)
            .map_err(crate::Error::from)?,
        Action::Replace(value) => {
            path.update(&mut doc, |_, target| *target = value.clone())
                .map_err(crate::Error::from)?;
            doc
        }
        Action::Remove => {
            path.remove(&mut doc).map_err(crate::Error::from)?;
            doc
        }
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_flags() {
        let invocation = parse_args(args(&["--path", "--sort", "$..a"])).unwrap();
        assert_eq!(invocation.query, "$..a");
        assert!(invocation.options.wants_paths());
        assert!(invocation.options.sorted());
        assert_eq!(invocation.action, Action::Query);

        let invocation = parse_args(args(&["--replace", "{\"x\":1}", "$.a"])).unwrap();
        assert_eq!(invocation.action, Action::Replace(json!({"x": 1})));
    }

    #[test]
    fn rejects_bad_command_lines() {
        assert!(matches!(parse_args(args(&[])), Err(CliError::Usage(_))));
        assert!(matches!(parse_args(args(&["--bogus", "$"])), Err(CliError::Usage(_))));
        assert!(matches!(parse_args(args(&["$", "$"])), Err(CliError::Usage(_))));
        assert!(matches!(parse_args(args(&["$", "--replace"])), Err(CliError::Usage(_))));
        assert!(matches!(parse_args(args(&["--replace", "{", "$"])), Err(CliError::Json(_))));
    }

    #[test]
    fn runs_queries_and_edits() {
        let input = r#"{"a": [1, 2, 3]}"#;
        let query = parse_args(args(&["$.a[1:]"])).unwrap();
        let out: Value = serde_json::from_str(&run(&query, input).unwrap()).unwrap();
        assert_eq!(out, json!([2, 3]));

        let remove = parse_args(args(&["--remove", "$.a[0]"])).unwrap();
        let out: Value = serde_json::from_str(&run(&remove, input).unwrap()).unwrap();
        assert_eq!(out, json!({"a": [2, 3]}));

        let replace = parse_args(args(&["--replace", "0", "$.a[*]"])).unwrap();
        let out: Value = serde_json::from_str(&run(&replace, input).unwrap()).unwrap();
        assert_eq!(out, json!({"a": [0, 0, 0]}));
    }

    #[test]
    fn reports_query_errors() {
        let query = parse_args(args(&["$.a["])).unwrap();
        let err = run(&query, "{}").unwrap_err();
        assert!(matches!(err, CliError::Query(crate::Error::Syntax(_))));
        assert!(err.to_string().contains("line 1"));
    }
}
