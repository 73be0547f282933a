//! Unary and binary operators of filter expressions.

use crate::document::Document;
use regex::Regex;
use std::cmp::Ordering;

/// Prefix `!` and `-`, and the postfix regex match `=~ /re/`.
#[derive(Debug, Clone)]
pub(crate) enum UnaryOperator {
    Not,
    Negate,
    RegexMatch(Regex),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOperator {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Plus,
    Minus,
    Mult,
    Div,
}

/// An operator waiting on the reducer's operator stack.
#[derive(Debug, Clone)]
pub(crate) enum Operator {
    Unary(UnaryOperator),
    Binary(BinaryOperator),
}

impl Operator {
    /// Lower binds tighter.
    pub(crate) fn precedence(&self) -> u8 {
        match self {
            Operator::Unary(UnaryOperator::Not | UnaryOperator::Negate) => 1,
            Operator::Unary(UnaryOperator::RegexMatch(_)) => 2,
            Operator::Binary(op) => match op {
                BinaryOperator::Mult | BinaryOperator::Div => 3,
                BinaryOperator::Plus | BinaryOperator::Minus => 4,
                BinaryOperator::Lt | BinaryOperator::Lte | BinaryOperator::Gt | BinaryOperator::Gte => 5,
                BinaryOperator::Eq | BinaryOperator::Ne => 6,
                BinaryOperator::And => 7,
                BinaryOperator::Or => 8,
            },
        }
    }

    pub(crate) fn is_right_associative(&self) -> bool {
        matches!(self, Operator::Unary(UnaryOperator::Not | UnaryOperator::Negate))
    }
}

/// `false`, `null`, zero, and empty strings, arrays and objects.
pub(crate) fn is_false<D: Document>(value: &D) -> bool {
    if value.is_null() {
        return true;
    }
    if let Some(b) = value.as_bool() {
        return !b;
    }
    if value.is_number() {
        return value.as_f64() == Some(0.0);
    }
    if let Some(s) = value.as_str() {
        return s.is_empty();
    }
    (value.is_array() || value.is_object()) && value.size() == 0
}

impl UnaryOperator {
    pub(crate) fn apply<D: Document>(&self, value: &D) -> D {
        match self {
            UnaryOperator::Not => D::from_bool(is_false(value)),
            UnaryOperator::Negate => {
                if let Some(n) = value.as_i64() {
                    match n.checked_neg() {
                        Some(neg) => D::from_i64(neg),
                        None => D::from_f64(-(n as f64)),
                    }
                } else if let (true, Some(f)) = (value.is_number(), value.as_f64()) {
                    D::from_f64(-f)
                } else {
                    D::null()
                }
            }
            UnaryOperator::RegexMatch(regex) => match value.as_str() {
                Some(s) => D::from_bool(regex.is_match(s)),
                None => D::from_bool(false),
            },
        }
    }
}

/// Result of `&&` / `||`: these yield one of their operands.
pub(crate) enum LogicalResult {
    Lhs,
    Rhs,
}

impl BinaryOperator {
    pub(crate) fn logical<D: Document>(&self, lhs: &D) -> Option<LogicalResult> {
        match self {
            BinaryOperator::And if is_false(lhs) => Some(LogicalResult::Lhs),
            BinaryOperator::And => Some(LogicalResult::Rhs),
            BinaryOperator::Or if is_false(lhs) => Some(LogicalResult::Rhs),
            BinaryOperator::Or => Some(LogicalResult::Lhs),
            _ => None,
        }
    }

    /// Non-logical operators. Incomparable or non-numeric operands give `null`.
    pub(crate) fn apply<D: Document>(&self, lhs: &D, rhs: &D) -> D {
        match self {
            BinaryOperator::Eq => D::from_bool(lhs.equals(rhs)),
            BinaryOperator::Ne => D::from_bool(!lhs.equals(rhs)),
            BinaryOperator::Lt => compare(lhs, rhs, |o| o == Ordering::Less),
            BinaryOperator::Lte => compare(lhs, rhs, |o| o != Ordering::Greater),
            BinaryOperator::Gt => compare(lhs, rhs, |o| o == Ordering::Greater),
            BinaryOperator::Gte => compare(lhs, rhs, |o| o != Ordering::Less),
            BinaryOperator::Plus => arithmetic(lhs, rhs, i64::checked_add, |a, b| a + b),
            BinaryOperator::Minus => arithmetic(lhs, rhs, i64::checked_sub, |a, b| a - b),
            BinaryOperator::Mult => arithmetic(lhs, rhs, i64::checked_mul, |a, b| a * b),
            BinaryOperator::Div => divide(lhs, rhs),
            BinaryOperator::And | BinaryOperator::Or => match self.logical(lhs) {
                Some(LogicalResult::Lhs) => lhs.clone(),
                _ => rhs.clone(),
            },
        }
    }
}

fn compare<D: Document>(lhs: &D, rhs: &D, test: impl Fn(Ordering) -> bool) -> D {
    let ordering = if lhs.is_number() && rhs.is_number() {
        match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        }
    } else {
        match (lhs.as_str(), rhs.as_str()) {
            (Some(a), Some(b)) => Some(a.cmp(b)),
            _ => None,
        }
    };
    match ordering {
        Some(ordering) => D::from_bool(test(ordering)),
        None => D::null(),
    }
}

fn arithmetic<D: Document>(
    lhs: &D,
    rhs: &D,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> D {
    if !lhs.is_number() || !rhs.is_number() {
        return D::null();
    }
    if let (Some(a), Some(b)) = (lhs.as_i64(), rhs.as_i64()) {
        if let Some(n) = int_op(a, b) {
            return D::from_i64(n);
        }
    }
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(a), Some(b)) => D::from_f64(float_op(a, b)),
        _ => D::null(),
    }
}

fn divide<D: Document>(lhs: &D, rhs: &D) -> D {
    if !lhs.is_number() || !rhs.is_number() {
        return D::null();
    }
    if let (Some(a), Some(b)) = (lhs.as_i64(), rhs.as_i64()) {
        if b != 0 && a.checked_rem(b) == Some(0) {
            if let Some(n) = a.checked_div(b) {
                return D::from_i64(n);
            }
        }
    }
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(_), Some(b)) if b == 0.0 => D::null(),
        (Some(a), Some(b)) => D::from_f64(a / b),
        _ => D::null(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn falsy_values() {
        for v in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!([]), json!({})] {
            assert!(is_false(&v), "{v} should be falsy");
        }
        for v in [json!(true), json!(1), json!(-0.5), json!("x"), json!([0]), json!({"a": null})] {
            assert!(!is_false(&v), "{v} should be truthy");
        }
    }

    #[test]
    fn comparisons() {
        assert_eq!(BinaryOperator::Lt.apply(&json!(1), &json!(2.5)), json!(true));
        assert_eq!(BinaryOperator::Gte.apply(&json!("b"), &json!("a")), json!(true));
        assert_eq!(BinaryOperator::Lt.apply(&json!("1"), &json!(2)), Value::Null);
        assert_eq!(BinaryOperator::Eq.apply(&json!(2), &json!(2.0)), json!(true));
        assert_eq!(BinaryOperator::Ne.apply(&json!("2"), &json!(2)), json!(true));
    }

    #[test]
    fn arithmetic_keeps_integers_when_exact() {
        assert_eq!(BinaryOperator::Plus.apply(&json!(2), &json!(3)), json!(5));
        assert_eq!(BinaryOperator::Minus.apply(&json!(2), &json!(0.5)), json!(1.5));
        assert_eq!(BinaryOperator::Div.apply(&json!(6), &json!(3)), json!(2));
        assert_eq!(BinaryOperator::Div.apply(&json!(7), &json!(2)), json!(3.5));
        assert_eq!(BinaryOperator::Div.apply(&json!(7), &json!(0)), Value::Null);
        assert_eq!(BinaryOperator::Mult.apply(&json!("a"), &json!(2)), Value::Null);
    }

    #[test]
    fn logical_operators_return_operands() {
        assert_eq!(BinaryOperator::And.apply(&json!(0), &json!("x")), json!(0));
        assert_eq!(BinaryOperator::And.apply(&json!(1), &json!("x")), json!("x"));
        assert_eq!(BinaryOperator::Or.apply(&json!(null), &json!("x")), json!("x"));
        assert_eq!(BinaryOperator::Or.apply(&json!(2), &json!("x")), json!(2));
    }

    #[test]
    fn unary_operators() {
        assert_eq!(UnaryOperator::Not.apply(&json!([])), json!(true));
        assert_eq!(UnaryOperator::Negate.apply(&json!(3)), json!(-3));
        assert_eq!(UnaryOperator::Negate.apply(&json!("3")), Value::Null);
        let regex = UnaryOperator::RegexMatch(Regex::new("^Ev").unwrap());
        assert_eq!(regex.apply(&json!("Evelyn")), json!(true));
        assert_eq!(regex.apply(&json!(5)), json!(false));
    }

    #[test]
    fn precedence_order() {
        let not = Operator::Unary(UnaryOperator::Not);
        let mult = Operator::Binary(BinaryOperator::Mult);
        let or = Operator::Binary(BinaryOperator::Or);
        assert!(not.precedence() < mult.precedence());
        assert!(mult.precedence() < or.precedence());
        assert!(not.is_right_associative());
        assert!(!mult.is_right_associative());
    }
}
