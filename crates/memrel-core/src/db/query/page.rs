use crate::{
    db::{
        query::{
            join::FieldNames,
            select::{COUNT_ALIAS, Select},
        },
        store::Record,
    },
    value::Value,
};

/// Apply offset/limit pagination in place.
///
/// Offset alone keeps `[offset, end)`; limit alone keeps `[0, limit)`; both
/// keep `[offset, offset + limit)`. Windows clamp to the row count.
pub(crate) fn paginate(rows: &mut Vec<Record>, offset: Option<usize>, limit: Option<usize>) {
    let total = rows.len();
    let start = offset.unwrap_or(0).min(total);
    let end = limit.map_or(total, |limit| start.saturating_add(limit).min(total));

    // Truncate to window end, then drop leading rows.
    rows.truncate(end);
    rows.drain(..start);
}

/// Map surviving rows to the requested output shape.
///
/// The count sentinel collapses the result to a single `{ $$count: n }`.
/// An aggregate entry reads the grouped field for its resolved source column.
pub(crate) fn project(rows: Vec<Record>, select: &Select, names: &FieldNames<'_>) -> Vec<Record> {
    if select.is_count() {
        let count = i64::try_from(rows.len()).unwrap_or(i64::MAX);
        return vec![Record::new().with(COUNT_ALIAS, count)];
    }

    let entries = select.entries();
    if entries.is_empty() {
        return rows;
    }

    let sources: Vec<String> = entries
        .iter()
        .map(|entry| match entry.aggregate {
            None => entry.alias.clone(),
            Some(aggregate) => aggregate.field_name(&names.resolve(&entry.table, &entry.column)),
        })
        .collect();

    rows.iter()
        .map(|row| {
            entries
                .iter()
                .zip(&sources)
                .map(|(entry, source)| {
                    (
                        entry.alias.as_str(),
                        row.get(source).cloned().unwrap_or(Value::Null),
                    )
                })
                .collect()
        })
        .collect()
}
