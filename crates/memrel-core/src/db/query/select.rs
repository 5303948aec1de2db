use std::{fmt, str::FromStr};

/// Alias of the row-count sentinel, and of the per-group count column.
pub const COUNT_ALIAS: &str = "$$count";

///
/// Aggregate
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Aggregate {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

impl Aggregate {
    /// Name of the grouped-row field holding this aggregate of `source`.
    #[must_use]
    pub fn field_name(self, source: &str) -> String {
        match self {
            Self::Sum => format!("$sum_{source}"),
            Self::Avg => format!("$avg_{source}"),
            Self::Min => format!("$min_{source}"),
            Self::Max => format!("$max_{source}"),
            Self::Count => COUNT_ALIAS.to_string(),
        }
    }

    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Count => "COUNT",
        }
    }
}

impl FromStr for Aggregate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUM" => Ok(Self::Sum),
            "AVG" => Ok(Self::Avg),
            "MIN" => Ok(Self::Min),
            "MAX" => Ok(Self::Max),
            "COUNT" => Ok(Self::Count),
            _ => Err(format!("unknown aggregate '{s}'")),
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

///
/// SelectColumn
///
/// One requested output column. `table` is the table alias the column is
/// scoped to (the base alias or a join alias) and `column` the source field.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectColumn {
    pub table: String,
    pub column: String,
    pub alias: String,
    pub aggregate: Option<Aggregate>,
}

impl SelectColumn {
    /// Select `table.column` under its own name.
    #[must_use]
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        let column = column.into();

        Self {
            table: table.into(),
            alias: column.clone(),
            column,
            aggregate: None,
        }
    }

    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    #[must_use]
    pub const fn aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = Some(aggregate);
        self
    }
}

///
/// Select
///
/// `Columns` with an empty list keeps every field of every row.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Select {
    Columns(Vec<SelectColumn>),
    Count,
}

impl Select {
    #[must_use]
    pub fn columns(columns: impl IntoIterator<Item = SelectColumn>) -> Self {
        Self::Columns(columns.into_iter().collect())
    }

    /// Every field of every row.
    #[must_use]
    pub const fn all() -> Self {
        Self::Columns(Vec::new())
    }

    /// True for the row-count sentinel, including a column list whose first
    /// alias is `$$count`.
    #[must_use]
    pub fn is_count(&self) -> bool {
        match self {
            Self::Count => true,
            Self::Columns(columns) => columns.first().is_some_and(|c| c.alias == COUNT_ALIAS),
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[SelectColumn] {
        match self {
            Self::Columns(columns) => columns,
            Self::Count => &[],
        }
    }

    #[must_use]
    pub fn has_aggregates(&self) -> bool {
        self.entries().iter().any(|c| c.aggregate.is_some())
    }
}

impl Default for Select {
    fn default() -> Self {
        Self::all()
    }
}
