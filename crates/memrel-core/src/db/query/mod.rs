//! Read path: join expansion → filter → group → sort → paginate → project.

mod group;
mod join;
mod order;
mod page;
pub mod predicate;
mod select;

#[cfg(test)]
mod tests;

use crate::{
    config::DbConfig,
    db::store::{Data, Record},
    error::{Error, ErrorOrigin},
    obs::sink::{self, ExecKind, MetricsEvent, Span},
    schema::Schema,
};
use join::FieldNames;

// re-exports
pub use join::JoinDescriptor;
pub use order::{Direction, OrderBy};
pub use predicate::Predicate;
pub use select::{Aggregate, COUNT_ALIAS, Select, SelectColumn};

///
/// TableRef
///
/// A registered table and the alias its fields are scoped under.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableRef {
    pub real_name: String,
    pub alias: String,
}

impl TableRef {
    #[must_use]
    pub fn new(real_name: impl Into<String>) -> Self {
        let real_name = real_name.into();

        Self {
            alias: real_name.clone(),
            real_name,
        }
    }

    #[must_use]
    pub fn aliased(real_name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            real_name: real_name.into(),
            alias: alias.into(),
        }
    }
}

///
/// Query
///
/// Fully described read request. Every stage after join expansion
/// addresses fields by their resolved names (select alias, bare base name,
/// or `"<join alias>.<field>"`).
///
///   Query::table("Car")
///       .filter(Predicate::where_("Color", Operator::Eq, "Red"))
///       .order_by(OrderBy::desc("Year"))
///       .limit(5)
///

#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub from: TableRef,
    pub joins: Vec<JoinDescriptor>,
    pub predicate: Predicate,
    pub group_by: Option<Vec<String>>,
    pub order_by: Option<Vec<OrderBy>>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    pub select: Select,
}

impl Query {
    /// Select every row and field of `table`.
    #[must_use]
    pub fn table(table: impl Into<String>) -> Self {
        Self::scoped(TableRef::new(table))
    }

    /// Like `table`, with the base fields scoped under `alias`.
    #[must_use]
    pub fn table_as(table: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::scoped(TableRef::aliased(table, alias))
    }

    fn scoped(from: TableRef) -> Self {
        Self {
            from,
            joins: Vec::new(),
            predicate: Predicate::all(),
            group_by: None,
            order_by: None,
            offset: None,
            limit: None,
            select: Select::all(),
        }
    }

    #[must_use]
    pub fn join(mut self, join: JoinDescriptor) -> Self {
        self.joins.push(join);
        self
    }

    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = predicate;
        self
    }

    #[must_use]
    pub fn group_by<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Append one sort key; earlier keys take precedence.
    #[must_use]
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.get_or_insert_with(Vec::new).push(order);
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn select(mut self, select: Select) -> Self {
        self.select = select;
        self
    }

    /// Group keys to partition by, if grouping applies.
    ///
    /// Aggregate select entries without an explicit GROUP BY aggregate the
    /// whole filtered set as one partition.
    fn partition_keys(&self) -> Option<&[String]> {
        match &self.group_by {
            Some(keys) => Some(keys.as_slice()),
            None if self.select.has_aggregates() => Some(&[][..]),
            None => None,
        }
    }
}

///
/// QueryExecutor
///

pub(crate) struct QueryExecutor<'a> {
    schema: &'a Schema,
    data: &'a Data,
    config: DbConfig,
}

impl<'a> QueryExecutor<'a> {
    pub(crate) const fn new(schema: &'a Schema, data: &'a Data, config: DbConfig) -> Self {
        Self {
            schema,
            data,
            config,
        }
    }

    pub(crate) fn execute(&self, query: &Query) -> Result<Vec<Record>, Error> {
        let base_table = query.from.real_name.as_str();
        let mut span = Span::new(ExecKind::Query, base_table);

        if self.config.strict_predicates {
            predicate::validate(query.predicate.nodes())?;
        }

        self.schema.require_table(base_table, ErrorOrigin::Query)?;
        let base = self.data.table(base_table).unwrap_or_default();
        self.debug_log_plan(query, base.len());

        // Phase 1: scope + join expansion
        let names = FieldNames::new(&query.from.alias, query.select.entries());
        let rows = join::expand(self.schema, self.data, &names, base, &query.joins)?;
        sink::record(MetricsEvent::RowsScanned {
            table: base_table,
            rows_scanned: sink::rows(rows.len()),
        });

        // Phase 2: filter
        let nodes = query.predicate.nodes();
        let mut rows: Vec<Record> = rows
            .into_iter()
            .filter(|row| predicate::evaluate(row, nodes))
            .collect();
        tracing::trace!(table = base_table, rows = rows.len(), "filtered");

        // Phase 3: group
        if let Some(keys) = query.partition_keys() {
            rows = group::group(rows, keys);
            tracing::trace!(table = base_table, groups = rows.len(), "grouped");
        }

        // Phase 4: sort
        if let Some(order) = &query.order_by {
            order::sort(&mut rows, order).inspect_err(|err| {
                tracing::warn!(table = base_table, error = %err, "sort rejected");
            })?;
        }

        // Phase 5: window + shape
        page::paginate(&mut rows, query.offset, query.limit);
        let rows = page::project(rows, &query.select, &names);

        span.set_rows(sink::rows(rows.len()));
        tracing::debug!(table = base_table, rows = rows.len(), "query finished");

        Ok(rows)
    }

    fn debug_log(&self, s: impl Into<String>) {
        if self.config.debug {
            tracing::info!("[debug] {}", s.into());
        }
    }

    fn debug_log_plan(&self, query: &Query, base_rows: usize) {
        if !self.config.debug {
            return;
        }

        self.debug_log(format!(
            "Executing query on {} as {} ({base_rows} base rows)",
            query.from.real_name, query.from.alias
        ));
        for join in &query.joins {
            self.debug_log(format!(
                "Join: {} as {} on {} = {}",
                join.real_name, join.alias, join.referer_key, join.reference_key
            ));
        }
        self.debug_log(format!(
            "Predicate nodes={} group_by={:?} order_by={} offset={:?} limit={:?} count={}",
            query.predicate.nodes().len(),
            query.group_by,
            query.order_by.as_ref().map_or(0, Vec::len),
            query.offset,
            query.limit,
            query.select.is_count(),
        ));
    }
}
