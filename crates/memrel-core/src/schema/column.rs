use crate::value::Value;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

///
/// DataType
///
/// Declared column type. Seeds may spell these with SQL-ish names; see
/// `DataType::from_name`.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Boolean,
    Int,
    Float,
    Date,
}

impl DataType {
    /// Resolve an engine or SQL-style type name.
    ///
    /// Accepts the engine names plus `text`, `varchar(n)`, `bool`,
    /// `integer`, `bigint`, `decimal(p,s)`, `numeric`, `real`, `double`,
    /// `datetime` and `timestamp`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        let base = lower.split('(').next().unwrap_or_default().trim();

        match base {
            "string" | "text" | "varchar" | "char" => Some(Self::String),
            "boolean" | "bool" => Some(Self::Boolean),
            "int" | "integer" | "bigint" | "smallint" => Some(Self::Int),
            "float" | "decimal" | "numeric" | "real" | "double" => Some(Self::Float),
            "date" | "datetime" | "timestamp" => Some(Self::Date),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Int => "int",
            Self::Float => "float",
            Self::Date => "date",
        }
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unsupported datatype '{s}'"))
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

///
/// ColumnDefault
///
/// Producer for the value an insert assigns to an unsupplied column.
///

#[derive(Clone, Debug, PartialEq)]
pub enum ColumnDefault {
    Value(Value),
    CurrentTimestamp,
}

impl ColumnDefault {
    #[must_use]
    pub fn produce(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::CurrentTimestamp => Value::Date(Utc::now()),
        }
    }
}

///
/// ColumnSpec
///
/// Un-normalized column declaration handed to the schema registry.
/// `nullable` and `unique` are optional; normalization fills them in.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnSpec {
    pub datatype: DataType,
    pub primary: bool,
    pub identity: bool,
    pub nullable: Option<bool>,
    pub unique: Option<bool>,
    pub default: Option<ColumnDefault>,
}

impl ColumnSpec {
    #[must_use]
    pub const fn new(datatype: DataType) -> Self {
        Self {
            datatype,
            primary: false,
            identity: false,
            nullable: None,
            unique: None,
            default: None,
        }
    }

    #[must_use]
    pub const fn string() -> Self {
        Self::new(DataType::String)
    }

    #[must_use]
    pub const fn boolean() -> Self {
        Self::new(DataType::Boolean)
    }

    #[must_use]
    pub const fn int() -> Self {
        Self::new(DataType::Int)
    }

    #[must_use]
    pub const fn float() -> Self {
        Self::new(DataType::Float)
    }

    #[must_use]
    pub const fn date() -> Self {
        Self::new(DataType::Date)
    }

    #[must_use]
    pub const fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    #[must_use]
    pub const fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    #[must_use]
    pub const fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    #[must_use]
    pub const fn not_null(self) -> Self {
        self.nullable(false)
    }

    #[must_use]
    pub const fn unique(mut self, unique: bool) -> Self {
        self.unique = Some(unique);
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(ColumnDefault::Value(value.into()));
        self
    }

    #[must_use]
    pub fn default_now(mut self) -> Self {
        self.default = Some(ColumnDefault::CurrentTimestamp);
        self
    }
}

///
/// ColumnDefinition
///
/// Normalized, immutable column metadata.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnDefinition {
    pub table: String,
    pub field: String,
    pub datatype: DataType,
    pub is_primary: bool,
    pub is_identity: bool,
    pub is_nullable: bool,
    pub is_unique: bool,
    pub default: Option<ColumnDefault>,
}

impl ColumnDefinition {
    /// Normalize one declaration.
    ///
    /// `is_unique` defaults to `is_primary`; `is_nullable` defaults to
    /// `!is_primary`.
    pub(crate) fn normalize(table: &str, field: &str, spec: ColumnSpec) -> Self {
        Self {
            table: table.to_string(),
            field: field.to_string(),
            datatype: spec.datatype,
            is_primary: spec.primary,
            is_identity: spec.identity,
            is_nullable: spec.nullable.unwrap_or(!spec.primary),
            is_unique: spec.unique.unwrap_or(spec.primary),
            default: spec.default,
        }
    }

    /// True when the column participates in the composite unique key.
    #[must_use]
    pub const fn is_key(&self) -> bool {
        self.is_primary || self.is_unique
    }

    /// Value an insert assigns when the caller does not supply this column.
    #[must_use]
    pub fn default_value(&self) -> Value {
        self.default
            .as_ref()
            .map_or(Value::Null, ColumnDefault::produce)
    }
}
