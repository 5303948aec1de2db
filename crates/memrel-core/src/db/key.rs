use crate::{db::store::Record, value::Value};
use chrono::{DateTime, Utc};

///
/// KeyAtom
///
/// Hashable canonical form of one `Value`.
///
/// Canonicalization agrees with `strict_eq`: integral floats collapse onto
/// `Int`, so `1` and `1.0` produce the same atom.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) enum KeyAtom {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    Text(String),
    Date(DateTime<Utc>),
    List(Vec<Self>),
}

impl KeyAtom {
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::float_cmp)]
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(v) => Self::Bool(*v),
            Value::Int(v) => Self::Int(*v),
            Value::Float(v) => {
                let truncated = v.trunc();
                if truncated == *v && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
                    Self::Int(truncated as i64)
                } else {
                    Self::Float(v.to_bits())
                }
            }
            Value::Text(v) => Self::Text(v.clone()),
            Value::Date(v) => Self::Date(*v),
            Value::List(items) => Self::List(items.iter().map(Self::from_value).collect()),
        }
    }
}

///
/// CompositeKey
///
/// Canonical tuple of values read from a record, used for grouping
/// partitions and composite uniqueness checks. Missing fields read as null.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) struct CompositeKey(Vec<KeyAtom>);

impl CompositeKey {
    pub(crate) fn from_record<'a>(
        record: &Record,
        columns: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self(
            columns
                .into_iter()
                .map(|column| KeyAtom::from_value(record.get(column).unwrap_or(&Value::Null)))
                .collect(),
        )
    }
}
