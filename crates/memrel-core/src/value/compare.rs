use crate::value::Value;
use std::cmp::Ordering;

/// Strict equality used by `=`, `<>`, `IN`, join keys and composite keys.
///
/// Same-kind values compare by value; `Int` and `Float` compare by magnitude.
/// Every other cross-kind pair is unequal. `Null` equals only `Null`.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn strict_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Int(_), Value::Float(_)) | (Value::Float(_), Value::Int(_)) => {
            left.as_f64() == right.as_f64()
        }
        (Value::Text(a), Value::Text(b)) => a == b,
        (Value::Date(a), Value::Date(b)) => a == b,
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| strict_eq(a, b))
        }
        _ => false,
    }
}

/// Strict comparator for orderable values of the same family.
///
/// Returns `None` for `Null`, lists, and mismatched kinds. Predicate range
/// operators treat `None` as a non-match.
#[must_use]
pub fn strict_order_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => Some(a.total_cmp(b)),
        (Value::Int(_), Value::Float(_)) | (Value::Float(_), Value::Int(_)) => {
            let (a, b) = (left.as_f64()?, right.as_f64()?);
            Some(a.total_cmp(&b))
        }
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Sort comparator.
///
/// Extends `strict_order_cmp` with a null rule: nulls are equal to each other
/// and order before every non-null value. Returns `None` when the pair has no
/// defined ordering; the sorter turns that into a type error.
#[must_use]
pub fn sort_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, Value::List(_)) | (Value::List(_), Value::Null) => None,
        (Value::Null, _) => Some(Ordering::Less),
        (_, Value::Null) => Some(Ordering::Greater),
        _ => strict_order_cmp(left, right),
    }
}
