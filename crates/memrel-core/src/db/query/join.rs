//! Join expansion: flattens a base row set across dependent tables.
//!
//! Joins are equality joins applied in declaration order. An accumulated row
//! with no match is kept unmodified, so row count never decreases.

use crate::{
    db::{
        query::select::SelectColumn,
        store::{Data, Record},
    },
    error::{Error, ErrorOrigin},
    schema::Schema,
    value::strict_eq,
};

///
/// JoinDescriptor
///
/// `accumulated.<referer_key> = <real_name>.<reference_key>`, with matched
/// fields scoped under `alias`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JoinDescriptor {
    pub real_name: String,
    pub alias: String,
    pub referer_key: String,
    pub reference_key: String,
}

impl JoinDescriptor {
    #[must_use]
    pub fn new(
        real_name: impl Into<String>,
        alias: impl Into<String>,
        referer_key: impl Into<String>,
        reference_key: impl Into<String>,
    ) -> Self {
        Self {
            real_name: real_name.into(),
            alias: alias.into(),
            referer_key: referer_key.into(),
            reference_key: reference_key.into(),
        }
    }
}

///
/// FieldNames
///
/// Resolves the name a source field carries once it enters the result set.
/// A non-aggregate select entry `{table, column}` renames the field to its
/// alias; otherwise base fields keep their bare name and join fields become
/// `"<alias>.<field>"`.
///

pub(crate) struct FieldNames<'a> {
    base_alias: &'a str,
    select: &'a [SelectColumn],
}

impl<'a> FieldNames<'a> {
    pub(crate) const fn new(base_alias: &'a str, select: &'a [SelectColumn]) -> Self {
        Self { base_alias, select }
    }

    pub(crate) fn resolve(&self, table: &str, field: &str) -> String {
        if let Some(entry) = self
            .select
            .iter()
            .find(|e| e.aggregate.is_none() && e.table == table && e.column == field)
        {
            return entry.alias.clone();
        }

        if table == self.base_alias {
            field.to_string()
        } else {
            format!("{table}.{field}")
        }
    }

    fn scope(&self, table: &str, record: &Record) -> Record {
        record
            .iter()
            .map(|(field, value)| (self.resolve(table, field), value.clone()))
            .collect()
    }
}

/// Scope the base rows and apply every join in order.
pub(crate) fn expand(
    schema: &Schema,
    data: &Data,
    names: &FieldNames<'_>,
    base: &[Record],
    joins: &[JoinDescriptor],
) -> Result<Vec<Record>, Error> {
    let mut rows: Vec<Record> = base
        .iter()
        .map(|record| names.scope(names.base_alias, record))
        .collect();

    for join in joins {
        schema.require_table(&join.real_name, ErrorOrigin::Query)?;
        let target = data.table(&join.real_name).unwrap_or_default();
        let before = rows.len();

        rows = join_step(rows, target, join, names);

        tracing::trace!(
            join = %join.alias,
            table = %join.real_name,
            before,
            after = rows.len(),
            "join expanded"
        );
    }

    Ok(rows)
}

// Null keys never match.
fn join_step(
    rows: Vec<Record>,
    target: &[Record],
    join: &JoinDescriptor,
    names: &FieldNames<'_>,
) -> Vec<Record> {
    let mut out = Vec::with_capacity(rows.len());

    for row in rows {
        let matches: Vec<&Record> = match row.get(&join.referer_key) {
            Some(key) if !key.is_null() => target
                .iter()
                .filter(|candidate| {
                    candidate
                        .get(&join.reference_key)
                        .is_some_and(|value| strict_eq(value, key))
                })
                .collect(),
            _ => Vec::new(),
        };

        if matches.is_empty() {
            out.push(row);
            continue;
        }

        for matched in matches {
            let mut merged = row.clone();
            for (field, value) in matched.iter() {
                merged.set(names.resolve(&join.alias, field), value.clone());
            }
            out.push(merged);
        }
    }

    out
}
