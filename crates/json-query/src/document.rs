//! The capabilities the evaluator needs from a document type.
//!
//! Queries never look at how a document stores its data. Anything that can
//! answer these questions, build the handful of values the evaluator
//! synthesizes (`length`, function results, operator results) and expose the
//! mutation hooks used by replace/remove can be queried.
//! [`serde_json::Value`] is supported out of the box.

use serde_json::{Number, Value};
use std::fmt;

pub trait Document: Clone + PartialEq + fmt::Debug + Sized + 'static {
    fn null() -> Self;
    fn from_bool(value: bool) -> Self;
    fn from_i64(value: i64) -> Self;
    fn from_u64(value: u64) -> Self;
    /// Non-finite floats have no JSON representation and may become `null`.
    fn from_f64(value: f64) -> Self;
    fn from_string(value: String) -> Self;
    fn from_array(items: Vec<Self>) -> Self;
    fn from_members(members: Vec<(String, Self)>) -> Self;
    /// Build a value from a JSON literal embedded in a query.
    fn from_json(value: &Value) -> Self;

    fn is_null(&self) -> bool;
    fn is_bool(&self) -> bool;
    fn is_number(&self) -> bool;
    fn is_string(&self) -> bool;
    fn is_array(&self) -> bool;
    fn is_object(&self) -> bool;

    fn is_scalar(&self) -> bool {
        !self.is_array() && !self.is_object()
    }

    fn as_bool(&self) -> Option<bool>;
    /// Integral numbers only.
    fn as_i64(&self) -> Option<i64>;
    fn as_f64(&self) -> Option<f64>;
    fn as_str(&self) -> Option<&str>;

    /// Number of elements or members; zero for scalars.
    fn size(&self) -> usize;
    fn member(&self, name: &str) -> Option<&Self>;
    fn element(&self, index: usize) -> Option<&Self>;
    /// Object members in insertion order; empty for non-objects.
    fn members(&self) -> Box<dyn Iterator<Item = (&str, &Self)> + '_>;
    /// Array elements in order; empty for non-arrays.
    fn elements(&self) -> Box<dyn Iterator<Item = &Self> + '_>;

    fn member_mut(&mut self, name: &str) -> Option<&mut Self>;
    fn element_mut(&mut self, index: usize) -> Option<&mut Self>;
    /// Removes a member, keeping the order of the others.
    fn remove_member(&mut self, name: &str) -> bool;
    fn remove_element(&mut self, index: usize) -> bool;
    /// Adds or overwrites a member. Returns `false` for non-objects.
    fn insert_member(&mut self, name: String, value: Self) -> bool;
    /// Returns `false` for non-arrays.
    fn push_element(&mut self, value: Self) -> bool;

    /// Query equality. Numbers compare by value regardless of representation.
    fn equals(&self, other: &Self) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) if self.is_number() && other.is_number() => a == b,
            _ => self == other,
        }
    }
}

impl Document for Value {
    fn null() -> Self {
        Value::Null
    }

    fn from_bool(value: bool) -> Self {
        Value::Bool(value)
    }

    fn from_i64(value: i64) -> Self {
        Value::Number(value.into())
    }

    fn from_u64(value: u64) -> Self {
        Value::Number(value.into())
    }

    fn from_f64(value: f64) -> Self {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }

    fn from_string(value: String) -> Self {
        Value::String(value)
    }

    fn from_array(items: Vec<Self>) -> Self {
        Value::Array(items)
    }

    fn from_members(members: Vec<(String, Self)>) -> Self {
        Value::Object(members.into_iter().collect())
    }

    fn from_json(value: &Value) -> Self {
        value.clone()
    }

    fn is_null(&self) -> bool {
        Value::is_null(self)
    }

    fn is_bool(&self) -> bool {
        Value::is_boolean(self)
    }

    fn is_number(&self) -> bool {
        Value::is_number(self)
    }

    fn is_string(&self) -> bool {
        Value::is_string(self)
    }

    fn is_array(&self) -> bool {
        Value::is_array(self)
    }

    fn is_object(&self) -> bool {
        Value::is_object(self)
    }

    fn as_bool(&self) -> Option<bool> {
        Value::as_bool(self)
    }

    fn as_i64(&self) -> Option<i64> {
        Value::as_i64(self)
    }

    fn as_f64(&self) -> Option<f64> {
        Value::as_f64(self)
    }

    fn as_str(&self) -> Option<&str> {
        Value::as_str(self)
    }

    fn size(&self) -> usize {
        match self {
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            _ => 0,
        }
    }

    fn member(&self, name: &str) -> Option<&Self> {
        match self {
            Value::Object(map) => map.get(name),
            _ => None,
        }
    }

    fn element(&self, index: usize) -> Option<&Self> {
        match self {
            Value::Array(items) => items.get(index),
            _ => None,
        }
    }

    fn members(&self) -> Box<dyn Iterator<Item = (&str, &Self)> + '_> {
        match self {
            Value::Object(map) => Box::new(map.iter().map(|(k, v)| (k.as_str(), v))),
            _ => Box::new(std::iter::empty()),
        }
    }

    fn elements(&self) -> Box<dyn Iterator<Item = &Self> + '_> {
        match self {
            Value::Array(items) => Box::new(items.iter()),
            _ => Box::new(std::iter::empty()),
        }
    }

    fn member_mut(&mut self, name: &str) -> Option<&mut Self> {
        match self {
            Value::Object(map) => map.get_mut(name),
            _ => None,
        }
    }

    fn element_mut(&mut self, index: usize) -> Option<&mut Self> {
        match self {
            Value::Array(items) => items.get_mut(index),
            _ => None,
        }
    }

    fn remove_member(&mut self, name: &str) -> bool {
        match self {
            Value::Object(map) => map.shift_remove(name).is_some(),
            _ => false,
        }
    }

    fn remove_element(&mut self, index: usize) -> bool {
        match self {
            Value::Array(items) if index < items.len() => {
                items.remove(index);
                true
            }
            _ => false,
        }
    }

    fn insert_member(&mut self, name: String, value: Self) -> bool {
        match self {
            Value::Object(map) => {
                map.insert(name, value);
                true
            }
            _ => false,
        }
    }

    fn push_element(&mut self, value: Self) -> bool {
        match self {
            Value::Array(items) => {
                items.push(value);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn members_keep_insertion_order() {
        let doc = json!({"z": 1, "a": 2, "m": 3});
        let keys: Vec<&str> = doc.members().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn numeric_equality_ignores_representation() {
        assert!(json!(1).equals(&json!(1.0)));
        assert!(!json!(1).equals(&json!("1")));
        assert!(json!({"a": [1]}).equals(&json!({"a": [1]})));
    }

    #[test]
    fn remove_member_preserves_order() {
        let mut doc = json!({"a": 1, "b": 2, "c": 3});
        assert!(doc.remove_member("a"));
        assert!(!doc.remove_member("a"));
        let keys: Vec<&str> = doc.members().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[test]
    fn non_finite_float_becomes_null() {
        assert_eq!(<Value as Document>::from_f64(f64::NAN), Value::Null);
        assert_eq!(<Value as Document>::from_f64(1.5), json!(1.5));
    }

    #[test]
    fn builds_objects_and_grows_containers() {
        let mut doc = <Value as Document>::from_members(vec![("b".to_string(), json!(1))]);
        assert!(doc.insert_member("a".to_string(), json!([])));
        assert!(doc.member_mut("a").map_or(false, |a| a.push_element(json!(2))));
        assert!(!json!(3).push_element(json!(4)));
        assert!(!json!([]).insert_member("x".to_string(), json!(5)));
        assert_eq!(doc, json!({"b": 1, "a": [2]}));
    }

    #[test]
    fn size_of_scalars_is_zero() {
        assert_eq!(json!("abc").size(), 0);
        assert_eq!(json!([1, 2]).size(), 2);
    }
}
