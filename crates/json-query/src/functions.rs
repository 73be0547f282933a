//! Built-in and user-registered functions.
//!
//! A function receives one value per argument. When an argument path matched
//! nothing the built-ins see `null` and return `null`; any other argument of
//! the wrong type is reported as an [`EvalError`].

use crate::document::Document;
use crate::error::EvalError;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type FunctionBody<D> = dyn Fn(&[&D]) -> Result<D, EvalError> + Send + Sync;

pub struct Function<D> {
    name: String,
    arity: Option<usize>,
    body: Arc<FunctionBody<D>>,
}

impl<D> Function<D> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `None` accepts any number of arguments.
    pub fn arity(&self) -> Option<usize> {
        self.arity
    }

    pub(crate) fn call(&self, args: &[&D]) -> Result<D, EvalError> {
        (self.body)(args)
    }
}

impl<D> fmt::Debug for Function<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// User functions available to a query. They shadow built-ins of the same
/// name.
///
/// ```
/// use json_query::{EvalError, Functions, JsonPath};
/// use serde_json::{json, Value};
///
/// let mut functions = Functions::new();
/// functions.register("double", Some(1), |args: &[&Value]| {
///     args[0]
///         .as_f64()
///         .map(|n| json!(n * 2.0))
///         .ok_or_else(|| EvalError::Function("double: expected a number".into()))
/// });
/// let path = JsonPath::compile_with("$[?(double(@) > 3)]", &functions).unwrap();
/// assert_eq!(path.evaluate(&json!([1, 2, 3]), Default::default()).unwrap(), json!([2, 3]));
/// ```
pub struct Functions<D> {
    table: HashMap<String, Arc<Function<D>>>,
}

impl<D: Document> Default for Functions<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Document> Functions<D> {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    pub fn register<F>(&mut self, name: &str, arity: Option<usize>, body: F) -> &mut Self
    where
        F: Fn(&[&D]) -> Result<D, EvalError> + Send + Sync + 'static,
    {
        self.table.insert(
            name.to_string(),
            Arc::new(Function {
                name: name.to_string(),
                arity,
                body: Arc::new(body),
            }),
        );
        self
    }

    pub(crate) fn resolve(&self, name: &str) -> Option<Arc<Function<D>>> {
        self.table.get(name).cloned().or_else(|| builtin(name))
    }
}

fn builtin<D: Document>(name: &str) -> Option<Arc<Function<D>>> {
    let (arity, body): (usize, fn(&[&D]) -> Result<D, EvalError>) = match name {
        "abs" => (1, abs::<D>),
        "avg" => (1, avg::<D>),
        "ceil" => (1, ceil::<D>),
        "contains" => (2, contains::<D>),
        "ends_with" => (2, ends_with::<D>),
        "floor" => (1, floor::<D>),
        "keys" => (1, keys::<D>),
        "length" => (1, length::<D>),
        "max" => (1, max::<D>),
        "min" => (1, min::<D>),
        "prod" => (1, prod::<D>),
        "starts_with" => (2, starts_with::<D>),
        "sum" => (1, sum::<D>),
        "to_number" => (1, to_number::<D>),
        "tokenize" => (2, tokenize::<D>),
        _ => return None,
    };
    Some(Arc::new(Function {
        name: name.to_string(),
        arity: Some(arity),
        body: Arc::new(body),
    }))
}

fn length<D: Document>(args: &[&D]) -> Result<D, EvalError> {
    let value = args[0];
    if value.is_null() {
        Ok(D::null())
    } else if let Some(s) = value.as_str() {
        Ok(D::from_u64(s.chars().count() as u64))
    } else if value.is_array() || value.is_object() {
        Ok(D::from_u64(value.size() as u64))
    } else {
        Err(EvalError::invalid_argument("length", "expected an array, object or string"))
    }
}

fn keys<D: Document>(args: &[&D]) -> Result<D, EvalError> {
    let value = args[0];
    if value.is_null() {
        return Ok(D::null());
    }
    if !value.is_object() {
        return Err(EvalError::invalid_argument("keys", "expected an object"));
    }
    Ok(D::from_array(
        value
            .members()
            .map(|(name, _)| D::from_string(name.to_string()))
            .collect(),
    ))
}

fn tokenize<D: Document>(args: &[&D]) -> Result<D, EvalError> {
    let (text, pattern) = (args[0], args[1]);
    if text.is_null() || pattern.is_null() {
        return Ok(D::null());
    }
    let (Some(text), Some(pattern)) = (text.as_str(), pattern.as_str()) else {
        return Err(EvalError::invalid_argument("tokenize", "expected two strings"));
    };
    let regex = Regex::new(pattern)
        .map_err(|e| EvalError::invalid_argument("tokenize", e.to_string()))?;
    Ok(D::from_array(
        regex
            .split(text)
            .map(|part| D::from_string(part.to_string()))
            .collect(),
    ))
}

/// The numbers of an array argument, or `None` when the argument is `null`.
fn numbers<'d, D: Document>(function: &str, value: &'d D) -> Result<Option<Vec<&'d D>>, EvalError> {
    if value.is_null() {
        return Ok(None);
    }
    if !value.is_array() {
        return Err(EvalError::invalid_argument(function, "expected an array of numbers"));
    }
    let items: Vec<&D> = value.elements().collect();
    if items.iter().any(|item| !item.is_number()) {
        return Err(EvalError::invalid_argument(function, "expected an array of numbers"));
    }
    Ok(Some(items))
}

fn sum<D: Document>(args: &[&D]) -> Result<D, EvalError> {
    let Some(items) = numbers("sum", args[0])? else {
        return Ok(D::null());
    };
    Ok(fold(&items, 0, 0.0, i64::checked_add, |a, b| a + b))
}

fn prod<D: Document>(args: &[&D]) -> Result<D, EvalError> {
    let Some(items) = numbers("prod", args[0])? else {
        return Ok(D::null());
    };
    if items.is_empty() {
        return Ok(D::null());
    }
    Ok(fold(&items, 1, 1.0, i64::checked_mul, |a, b| a * b))
}

/// Integer arithmetic while every item is integral and nothing overflows.
fn fold<D: Document>(
    items: &[&D],
    int_init: i64,
    float_init: f64,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> D {
    let int_result = items
        .iter()
        .try_fold(int_init, |acc, item| item.as_i64().and_then(|n| int_op(acc, n)));
    match int_result {
        Some(n) => D::from_i64(n),
        None => D::from_f64(
            items
                .iter()
                .filter_map(|item| item.as_f64())
                .fold(float_init, float_op),
        ),
    }
}

fn avg<D: Document>(args: &[&D]) -> Result<D, EvalError> {
    let Some(items) = numbers("avg", args[0])? else {
        return Ok(D::null());
    };
    if items.is_empty() {
        return Ok(D::null());
    }
    let total: f64 = items.iter().filter_map(|item| item.as_f64()).sum();
    Ok(D::from_f64(total / items.len() as f64))
}

fn min<D: Document>(args: &[&D]) -> Result<D, EvalError> {
    extreme("min", args[0], |candidate, best| candidate < best)
}

fn max<D: Document>(args: &[&D]) -> Result<D, EvalError> {
    extreme("max", args[0], |candidate, best| candidate > best)
}

fn extreme<D: Document>(function: &str, value: &D, better: fn(f64, f64) -> bool) -> Result<D, EvalError> {
    let Some(items) = numbers(function, value)? else {
        return Ok(D::null());
    };
    let mut best: Option<(&D, f64)> = None;
    for item in items {
        let Some(n) = item.as_f64() else { continue };
        match best {
            Some((_, b)) if !better(n, b) => {}
            _ => best = Some((item, n)),
        }
    }
    Ok(best.map_or_else(D::null, |(item, _)| item.clone()))
}

fn number_arg<'d, D: Document>(function: &str, value: &'d D) -> Result<Option<&'d D>, EvalError> {
    if value.is_null() {
        Ok(None)
    } else if value.is_number() {
        Ok(Some(value))
    } else {
        Err(EvalError::invalid_argument(function, "expected a number"))
    }
}

fn abs<D: Document>(args: &[&D]) -> Result<D, EvalError> {
    let Some(value) = number_arg("abs", args[0])? else {
        return Ok(D::null());
    };
    if let Some(n) = value.as_i64().and_then(i64::checked_abs) {
        return Ok(D::from_i64(n));
    }
    Ok(value.as_f64().map_or_else(D::null, |f| D::from_f64(f.abs())))
}

fn ceil<D: Document>(args: &[&D]) -> Result<D, EvalError> {
    round("ceil", args[0], f64::ceil)
}

fn floor<D: Document>(args: &[&D]) -> Result<D, EvalError> {
    round("floor", args[0], f64::floor)
}

fn round<D: Document>(function: &str, value: &D, op: fn(f64) -> f64) -> Result<D, EvalError> {
    let Some(value) = number_arg(function, value)? else {
        return Ok(D::null());
    };
    if value.as_i64().is_some() {
        return Ok(value.clone());
    }
    Ok(value.as_f64().map_or_else(D::null, |f| D::from_f64(op(f))))
}

fn to_number<D: Document>(args: &[&D]) -> Result<D, EvalError> {
    let value = args[0];
    if value.is_number() {
        return Ok(value.clone());
    }
    if value.is_null() {
        return Ok(D::null());
    }
    let Some(text) = value.as_str() else {
        return Err(EvalError::invalid_argument("to_number", "expected a number or string"));
    };
    let text = text.trim();
    if let Ok(n) = text.parse::<i64>() {
        return Ok(D::from_i64(n));
    }
    Ok(text.parse::<f64>().map_or_else(|_| D::null(), D::from_f64))
}

fn contains<D: Document>(args: &[&D]) -> Result<D, EvalError> {
    let (container, needle) = (args[0], args[1]);
    if container.is_null() {
        return Ok(D::null());
    }
    if container.is_array() {
        return Ok(D::from_bool(container.elements().any(|item| item.equals(needle))));
    }
    match (container.as_str(), needle.as_str()) {
        (Some(haystack), Some(needle)) => Ok(D::from_bool(haystack.contains(needle))),
        (Some(_), None) if needle.is_null() => Ok(D::null()),
        _ => Err(EvalError::invalid_argument("contains", "expected an array or two strings")),
    }
}

fn starts_with<D: Document>(args: &[&D]) -> Result<D, EvalError> {
    affix("starts_with", args, |s, prefix| s.starts_with(prefix))
}

fn ends_with<D: Document>(args: &[&D]) -> Result<D, EvalError> {
    affix("ends_with", args, |s, suffix| s.ends_with(suffix))
}

fn affix<D: Document>(function: &str, args: &[&D], test: fn(&str, &str) -> bool) -> Result<D, EvalError> {
    let (text, affix) = (args[0], args[1]);
    if text.is_null() || affix.is_null() {
        return Ok(D::null());
    }
    match (text.as_str(), affix.as_str()) {
        (Some(text), Some(affix)) => Ok(D::from_bool(test(text, affix))),
        _ => Err(EvalError::invalid_argument(function, "expected two strings")),
    }
}
