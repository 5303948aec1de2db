//! Schema registry: normalized, immutable per-table column metadata.
//!
//! Columns keep their declaration order; that order is the field layout of
//! every record an insert materializes.

mod column;


use crate::error::{Error, ErrorOrigin};
use std::collections::BTreeMap;

// re-exports
pub use column::{ColumnDefault, ColumnDefinition, ColumnSpec, DataType};

///
/// TableSchema
///

#[derive(Clone, Debug, PartialEq)]
pub struct TableSchema {
    name: String,
    columns: Vec<ColumnDefinition>,
}

impl TableSchema {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, field: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.field == field)
    }

    /// Resolve a column or fail with an `UnknownColumn` error.
    pub(crate) fn require_column(
        &self,
        field: &str,
        origin: ErrorOrigin,
    ) -> Result<&ColumnDefinition, Error> {
        self.column(field)
            .ok_or_else(|| Error::unknown_column(origin, &self.name, field))
    }

    /// Columns of the composite unique key (primary ∪ unique).
    pub fn key_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|c| c.is_key())
    }

    pub fn primary_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|c| c.is_primary)
    }
}

///
/// Schema
///
/// Table name → normalized column metadata.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schema {
    tables: BTreeMap<String, TableSchema>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize and register one table.
    pub fn register_table<N, F>(
        &mut self,
        name: N,
        columns: impl IntoIterator<Item = (F, ColumnSpec)>,
    ) -> Result<&TableSchema, Error>
    where
        N: Into<String>,
        F: Into<String>,
    {
        let name = name.into();
        if self.tables.contains_key(&name) {
            return Err(Error::duplicate_table(name));
        }

        let mut normalized: Vec<ColumnDefinition> = Vec::new();
        for (field, spec) in columns {
            let field = field.into();
            if normalized.iter().any(|c| c.field == field) {
                return Err(Error::invalid_seed(
                    &name,
                    Some(field),
                    "column declared twice",
                ));
            }
            normalized.push(ColumnDefinition::normalize(&name, &field, spec));
        }

        tracing::debug!(table = %name, columns = normalized.len(), "registered table schema");

        let table = TableSchema {
            name: name.clone(),
            columns: normalized,
        };

        Ok(self.tables.entry(name).or_insert(table))
    }

    /// Builder-style `register_table`.
    pub fn with_table<N, F>(
        mut self,
        name: N,
        columns: impl IntoIterator<Item = (F, ColumnSpec)>,
    ) -> Result<Self, Error>
    where
        N: Into<String>,
        F: Into<String>,
    {
        self.register_table(name, columns)?;
        Ok(self)
    }

    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    /// Resolve a table or fail with an `UnknownTable` error.
    pub(crate) fn require_table(&self, name: &str, origin: ErrorOrigin) -> Result<&TableSchema, Error> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::unknown_table(origin, name))
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
