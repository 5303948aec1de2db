use crate::{
    db::{
        query::predicate::{Condition, Operator, PredicateNode},
        store::Record,
    },
    value::{Value, strict_eq, strict_order_cmp},
};
use regex::Regex;
use std::cmp::Ordering;

///
/// Evaluate a predicate sequence against a single row.
///
/// Pure: the row is never mutated and repeated calls agree.
///
/// Short-circuit rules:
/// - running result false + WHERE/AND-family node → false
/// - running result true + OR-family node → true
///
/// An empty sequence keeps every row.
///
#[must_use]
pub fn evaluate(row: &Record, nodes: &[PredicateNode]) -> bool {
    eval_sequence(row, nodes, true)
}

fn eval_sequence(row: &Record, nodes: &[PredicateNode], mut stays: bool) -> bool {
    for node in nodes {
        let chain = node.chain();
        if !stays && chain.is_and_family() {
            return false;
        }
        if stays && chain.is_or_family() {
            return true;
        }

        stays = match node {
            PredicateNode::Group { nodes, .. } => eval_sequence(row, nodes, stays),
            PredicateNode::Leaf(condition) => {
                let evaluated = eval_condition(row, condition);
                if condition.chain.is_negated() {
                    !evaluated
                } else {
                    evaluated
                }
            }
        };
    }

    stays
}

///
/// Evaluate one leaf comparison, before chain negation.
///
/// A field absent from the row is distinct from a null field: it is never
/// equal to anything, never IS NULL, and fails every range test.
///
fn eval_condition(row: &Record, condition: &Condition) -> bool {
    let Condition {
        operator,
        property,
        value,
        ..
    } = condition;
    let actual = row.get(property);

    match operator {
        Operator::Lt => compare(actual, value).is_some_and(Ordering::is_lt),
        Operator::Lte => compare(actual, value).is_some_and(Ordering::is_le),
        Operator::Gt => compare(actual, value).is_some_and(Ordering::is_gt),
        Operator::Gte => compare(actual, value).is_some_and(Ordering::is_ge),

        Operator::Eq => actual.is_some_and(|actual| strict_eq(actual, value)),
        Operator::Ne => !actual.is_some_and(|actual| strict_eq(actual, value)),

        Operator::Between => between(actual, value),
        Operator::In => in_list(actual, value),

        Operator::Is => actual.is_some_and(Value::is_null),
        Operator::IsNot => !actual.is_some_and(Value::is_null),

        Operator::Like => like(actual, value),

        // NOTE: Unknown operators exclude the row; strict validation rejects them earlier.
        Operator::Unrecognized(_) => false,
    }
}

// Range comparison; a null operand never matches.
fn compare(actual: Option<&Value>, expected: &Value) -> Option<Ordering> {
    if expected.is_null() {
        return None;
    }

    strict_order_cmp(actual?, expected)
}

fn between(actual: Option<&Value>, bounds: &Value) -> bool {
    let Some([low, high]) = bounds.as_list() else {
        return false;
    };

    compare(actual, low).is_some_and(Ordering::is_ge)
        && compare(actual, high).is_some_and(Ordering::is_le)
}

fn in_list(actual: Option<&Value>, list: &Value) -> bool {
    let (Some(actual), Some(items)) = (actual, list.as_list()) else {
        return false;
    };

    items.iter().any(|item| strict_eq(actual, item))
}

fn like(actual: Option<&Value>, pattern: &Value) -> bool {
    let (Some(text), Some(pattern)) = (actual.and_then(Value::as_text), pattern.as_text()) else {
        return false;
    };

    like_regex(pattern).is_some_and(|re| re.is_match(text))
}

/// Compile a LIKE pattern: `%` matches any run of characters, everything
/// else is literal. The pattern may match anywhere in the value.
pub(crate) fn like_regex(pattern: &str) -> Option<Regex> {
    let body = pattern
        .split('%')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");

    Regex::new(&format!("(?s){body}")).ok()
}
