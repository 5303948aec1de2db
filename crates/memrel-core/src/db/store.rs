use crate::value::Value;
use derive_more::IntoIterator;
use serde::{Serialize, Serializer, ser::SerializeMap};
use std::{collections::BTreeMap, sync::Arc};

///
/// Record
///
/// One row: an ordered sequence of named fields.
/// Field order is insertion order; names are unique within a record.
///

#[derive(Clone, Debug, Default, IntoIterator, PartialEq)]
pub struct Record {
    #[into_iterator(owned, ref)]
    fields: Vec<(String, Value)>,
}

impl Record {
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find_map(|(field, value)| (field == name).then_some(value))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(field, _)| field == name)
    }

    /// Overwrite an existing field in place, or append it.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Builder-style `set`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(field, _)| field.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(field, value)| (field.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (name, value) in iter {
            record.set(name, value);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

///
/// Data
///
/// Table name → rows in insertion order.
///
/// Tables sit behind `Arc` so a transaction snapshot shares every table with
/// the live store until its first write; `rows_mut` copies on write.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Data {
    tables: BTreeMap<String, Arc<Vec<Record>>>,
}

impl Data {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install (or replace) a table's rows.
    pub fn insert_table(&mut self, name: impl Into<String>, rows: Vec<Record>) {
        self.tables.insert(name.into(), Arc::new(rows));
    }

    /// Builder-style `insert_table`.
    #[must_use]
    pub fn with_table(mut self, name: impl Into<String>, rows: Vec<Record>) -> Self {
        self.insert_table(name, rows);
        self
    }

    #[must_use]
    pub fn table(&self, name: &str) -> Option<&[Record]> {
        self.tables.get(name).map(|rows| rows.as_slice())
    }

    /// Mutable rows for a table, detaching it from any shared snapshot first.
    /// An absent table is created empty.
    pub(crate) fn rows_mut(&mut self, name: &str) -> &mut Vec<Record> {
        Arc::make_mut(self.tables.entry(name.to_string()).or_default())
    }

    pub(crate) fn shared_table(&self, name: &str) -> Option<Arc<Vec<Record>>> {
        self.tables.get(name).cloned()
    }

    pub(crate) fn replace_shared(&mut self, name: &str, rows: Arc<Vec<Record>>) {
        self.tables.insert(name.to_string(), rows);
    }

    /// Ensure every registered table has a (possibly empty) row set.
    pub(crate) fn ensure_table(&mut self, name: &str) {
        self.tables.entry(name.to_string()).or_default();
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Row count of a table, or `None` if the table is absent.
    #[must_use]
    pub fn row_count(&self, name: &str) -> Option<usize> {
        self.tables.get(name).map(|rows| rows.len())
    }
}
