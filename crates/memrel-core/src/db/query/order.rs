use crate::{
    db::store::Record,
    error::Error,
    value::{Value, ValueKind, sort_cmp},
};
use std::{cmp::Ordering, fmt, str::FromStr};

///
/// Direction
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(Self::Asc),
            "DESC" => Ok(Self::Desc),
            _ => Err(format!("unknown sort direction '{s}'")),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        })
    }
}

///
/// OrderBy
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderBy {
    pub alias: String,
    pub direction: Direction,
}

impl OrderBy {
    #[must_use]
    pub fn new(alias: impl Into<String>, direction: Direction) -> Self {
        Self {
            alias: alias.into(),
            direction,
        }
    }

    #[must_use]
    pub fn asc(alias: impl Into<String>) -> Self {
        Self::new(alias, Direction::Asc)
    }

    #[must_use]
    pub fn desc(alias: impl Into<String>) -> Self {
        Self::new(alias, Direction::Desc)
    }
}

/// Stable multi-key sort.
///
/// Every key column is checked before any row moves: a column holding a
/// list, or two non-null values of incompatible kinds, fails the whole sort
/// with `UnsupportedComparisonType` and leaves `rows` untouched.
pub(crate) fn sort(rows: &mut [Record], order: &[OrderBy]) -> Result<(), Error> {
    if order.is_empty() || rows.len() < 2 {
        return Ok(());
    }

    for spec in order {
        validate_column(rows, &spec.alias)?;
    }

    rows.sort_by(|a, b| compare_rows(a, b, order));

    Ok(())
}

fn field<'a>(row: &'a Record, alias: &str) -> &'a Value {
    row.get(alias).unwrap_or(&Value::Null)
}

// Null sorts with everything; Int and Float share one numeric family.
fn validate_column(rows: &[Record], alias: &str) -> Result<(), Error> {
    let mut seen: Option<&Value> = None;

    for row in rows {
        let value = field(row, alias);
        if value.kind() == ValueKind::List {
            return Err(Error::unsupported_comparison(
                alias,
                ValueKind::List,
                seen.map_or(ValueKind::Null, Value::kind),
            ));
        }
        if value.is_null() {
            continue;
        }

        match seen {
            None => seen = Some(value),
            Some(first) => {
                if sort_cmp(first, value).is_none() {
                    return Err(Error::unsupported_comparison(
                        alias,
                        first.kind(),
                        value.kind(),
                    ));
                }
            }
        }
    }

    Ok(())
}

// DESC swaps the operands before the shared comparator.
fn compare_rows(a: &Record, b: &Record, order: &[OrderBy]) -> Ordering {
    for spec in order {
        let (left, right) = match spec.direction {
            Direction::Asc => (a, b),
            Direction::Desc => (b, a),
        };

        let ordering = sort_cmp(field(left, &spec.alias), field(right, &spec.alias))
            .unwrap_or(Ordering::Equal);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}
