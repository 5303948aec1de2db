use crate::value::{Value, ValueKind};
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Structured engine error with a stable classification.
/// Every fallible engine call returns this type; the structured payload lives
/// in `detail`.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct Error {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
    pub detail: ErrorDetail,
}

impl Error {
    /// Construct an error whose message is rendered from its detail.
    pub(crate) fn new(class: ErrorClass, origin: ErrorOrigin, detail: ErrorDetail) -> Self {
        Self {
            class,
            origin,
            message: detail.to_string(),
            detail,
        }
    }

    /// Construct a uniqueness conflict for a composite primary/unique key.
    pub(crate) fn unique_violation(
        table: impl Into<String>,
        columns: Vec<String>,
        key: Vec<Value>,
    ) -> Self {
        Self::new(
            ErrorClass::Conflict,
            ErrorOrigin::Mutation,
            ErrorDetail::UniqueConstraintViolation {
                table: table.into(),
                columns,
                key,
            },
        )
    }

    /// Construct a not-null violation for one column.
    pub(crate) fn not_null_violation(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::Constraint,
            ErrorOrigin::Mutation,
            ErrorDetail::NotNullViolation {
                table: table.into(),
                column: column.into(),
            },
        )
    }

    /// Construct a sort-time type error.
    pub(crate) fn unsupported_comparison(
        column: impl Into<String>,
        left: ValueKind,
        right: ValueKind,
    ) -> Self {
        Self::new(
            ErrorClass::Unsupported,
            ErrorOrigin::Sort,
            ErrorDetail::UnsupportedComparisonType {
                column: column.into(),
                left,
                right,
            },
        )
    }

    /// Construct a strict-mode predicate validation failure.
    pub(crate) fn malformed_predicate(property: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvalidInput,
            ErrorOrigin::Predicate,
            ErrorDetail::MalformedPredicate {
                property: property.into(),
                reason: reason.into(),
            },
        )
    }

    pub(crate) fn unknown_table(origin: ErrorOrigin, table: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::NotFound,
            origin,
            ErrorDetail::UnknownTable {
                table: table.into(),
            },
        )
    }

    pub(crate) fn unknown_column(
        origin: ErrorOrigin,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorClass::NotFound,
            origin,
            ErrorDetail::UnknownColumn {
                table: table.into(),
                column: column.into(),
            },
        )
    }

    pub(crate) fn arity_mismatch(table: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::new(
            ErrorClass::InvalidInput,
            ErrorOrigin::Mutation,
            ErrorDetail::ArityMismatch {
                table: table.into(),
                expected,
                found,
            },
        )
    }

    pub(crate) fn duplicate_table(table: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Schema,
            ErrorDetail::DuplicateTable {
                table: table.into(),
            },
        )
    }

    pub(crate) fn transaction_active(active: u64) -> Self {
        Self::new(
            ErrorClass::Conflict,
            ErrorOrigin::Transaction,
            ErrorDetail::TransactionActive { active },
        )
    }

    pub(crate) fn transaction_mismatch(active: Option<u64>, found: u64) -> Self {
        Self::new(
            ErrorClass::InvalidInput,
            ErrorOrigin::Transaction,
            ErrorDetail::TransactionMismatch { active, found },
        )
    }

    pub(crate) fn invalid_seed(
        table: impl Into<String>,
        column: Option<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorClass::InvalidInput,
            ErrorOrigin::Bootstrap,
            ErrorDetail::InvalidSeed {
                table: table.into(),
                column,
                reason: reason.into(),
            },
        )
    }

    #[must_use]
    pub const fn is_unique_violation(&self) -> bool {
        matches!(self.detail, ErrorDetail::UniqueConstraintViolation { .. })
    }

    #[must_use]
    pub const fn is_not_null_violation(&self) -> bool {
        matches!(self.detail, ErrorDetail::NotNullViolation { .. })
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorDetail
///
/// Structured, origin-specific payload carried by [`Error`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("unique constraint violation on {table} ({}): key {}", columns.join(", "), render_key(key))]
    UniqueConstraintViolation {
        table: String,
        columns: Vec<String>,
        key: Vec<Value>,
    },

    #[error("not-null violation: {table}.{column} received null")]
    NotNullViolation { table: String, column: String },

    #[error("unsupported comparison on '{column}': {left} vs {right}")]
    UnsupportedComparisonType {
        column: String,
        left: ValueKind,
        right: ValueKind,
    },

    #[error("malformed predicate on '{property}': {reason}")]
    MalformedPredicate { property: String, reason: String },

    #[error("unknown table: '{table}'")]
    UnknownTable { table: String },

    #[error("unknown column: '{table}.{column}'")]
    UnknownColumn { table: String, column: String },

    #[error("value arity mismatch on {table}: expected {expected} values, found {found}")]
    ArityMismatch {
        table: String,
        expected: usize,
        found: usize,
    },

    #[error("table registered twice: '{table}'")]
    DuplicateTable { table: String },

    #[error("transaction {active} is already active")]
    TransactionActive { active: u64 },

    #[error("transaction handle {found} does not match active transaction {}", render_active(*active))]
    TransactionMismatch { active: Option<u64>, found: u64 },

    #[error("invalid seed for {table}{}: {reason}", column.as_ref().map(|c| format!(".{c}")).unwrap_or_default())]
    InvalidSeed {
        table: String,
        column: Option<String>,
        reason: String,
    },
}

fn render_key(key: &[Value]) -> String {
    let parts: Vec<String> = key.iter().map(ToString::to_string).collect();
    format!("({})", parts.join(", "))
}

fn render_active(active: Option<u64>) -> String {
    active.map_or_else(|| "(none)".to_string(), |id| id.to_string())
}

///
/// ErrorClass
/// Error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Conflict,
    Constraint,
    Unsupported,
    NotFound,
    InvalidInput,
    InvariantViolation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Conflict => "conflict",
            Self::Constraint => "constraint",
            Self::Unsupported => "unsupported",
            Self::NotFound => "not_found",
            Self::InvalidInput => "invalid_input",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Origin taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Query,
    Predicate,
    Sort,
    Mutation,
    Schema,
    Transaction,
    Bootstrap,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Query => "query",
            Self::Predicate => "predicate",
            Self::Sort => "sort",
            Self::Mutation => "mutation",
            Self::Schema => "schema",
            Self::Transaction => "transaction",
            Self::Bootstrap => "bootstrap",
        };
        write!(f, "{label}")
    }
}
