pub mod bootstrap;
mod key;
pub mod mutation;
pub mod query;
pub mod store;
mod transaction;


use crate::{
    config::DbConfig,
    db::{
        mutation::{MutationExecutor, Update},
        query::{Predicate, Query, QueryExecutor},
        store::{Data, Record},
        transaction::ActiveTransaction,
    },
    error::{Error, ErrorOrigin},
    obs::sink::{self, MetricsEvent, TransactionPhase},
    schema::{Schema, TableSchema},
    value::Value,
};

// re-exports
pub use transaction::TransactionId;

///
/// Database
///
/// Owns a schema and the live data store, plus at most one open transaction.
///
/// While a transaction is open every read and write goes to its snapshot;
/// the live store only changes on commit.
///

#[derive(Debug)]
pub struct Database {
    schema: Schema,
    live: Data,
    config: DbConfig,
    active: Option<ActiveTransaction>,
    next_transaction: u64,
}

impl Database {
    /// Pair a schema with pre-populated data.
    ///
    /// Every data table must be registered in the schema; schema tables with
    /// no data start empty.
    pub fn new(schema: Schema, data: Data) -> Result<Self, Error> {
        Self::with_config(schema, data, DbConfig::default())
    }

    pub fn with_config(schema: Schema, mut data: Data, config: DbConfig) -> Result<Self, Error> {
        if let Some(unknown) = data.table_names().find(|t| schema.table(t).is_none()) {
            return Err(Error::unknown_table(ErrorOrigin::Schema, unknown));
        }
        for table in schema.table_names() {
            data.ensure_table(table);
        }

        tracing::debug!(tables = schema.len(), "database opened");

        Ok(Self {
            schema,
            live: data,
            config,
            active: None,
            next_transaction: 0,
        })
    }

    #[must_use]
    pub const fn config(&self) -> DbConfig {
        self.config
    }

    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Data visible to the caller: the open snapshot if any, else the live store.
    #[must_use]
    pub fn data(&self) -> &Data {
        self.active.as_ref().map_or(&self.live, |tx| &tx.data)
    }

    #[must_use]
    pub fn rows(&self, table: &str) -> Option<&[Record]> {
        self.data().table(table)
    }

    /// Column metadata for `table`.
    pub fn describe(&self, table: &str) -> Result<&TableSchema, Error> {
        self.schema.require_table(table, ErrorOrigin::Schema)
    }

    //
    // Reads
    //

    pub fn query(&self, query: &Query) -> Result<Vec<Record>, Error> {
        QueryExecutor::new(&self.schema, self.data(), self.config).execute(query)
    }

    //
    // Writes
    //

    /// Insert value tuples; returns the assigned identities in order.
    pub fn insert<S: AsRef<str>>(
        &mut self,
        table: &str,
        columns: &[S],
        rows: Vec<Vec<Value>>,
    ) -> Result<Vec<i64>, Error> {
        let columns: Vec<&str> = columns.iter().map(AsRef::as_ref).collect();

        self.mutate(table, |exec| exec.insert(table, &columns, rows))
    }

    pub fn update(&mut self, table: &str, update: &Update) -> Result<usize, Error> {
        self.mutate(table, |exec| exec.update(table, update))
    }

    pub fn delete(&mut self, table: &str, predicate: &Predicate) -> Result<usize, Error> {
        self.mutate(table, |exec| exec.delete(table, predicate))
    }

    /// Clear `table`; returns the prior row count.
    pub fn truncate(&mut self, table: &str) -> Result<usize, Error> {
        self.mutate(table, |exec| exec.truncate(table))
    }

    // Route a mutation to the open snapshot or the live store.
    fn mutate<T>(
        &mut self,
        table: &str,
        f: impl FnOnce(&mut MutationExecutor<'_>) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let data = match self.active.as_mut() {
            Some(tx) => &mut tx.data,
            None => &mut self.live,
        };
        let out = f(&mut MutationExecutor::new(&self.schema, data, self.config))?;

        if let Some(tx) = self.active.as_mut() {
            tx.touch(table);
        }

        Ok(out)
    }

    //
    // Transactions
    //

    /// Open a snapshot of the live store.
    pub fn begin_transaction(&mut self) -> Result<TransactionId, Error> {
        if let Some(tx) = &self.active {
            return Err(Error::transaction_active(tx.id.get()));
        }

        self.next_transaction += 1;
        let id = TransactionId::from(self.next_transaction);
        self.active = Some(ActiveTransaction::begin(id, self.live.clone()));

        sink::record(MetricsEvent::Transaction {
            phase: TransactionPhase::Begin,
            id: id.get(),
        });
        tracing::debug!(%id, "transaction begun");

        Ok(id)
    }

    /// Merge the snapshot's written tables into the live store.
    pub fn commit(&mut self, id: TransactionId) -> Result<(), Error> {
        let tx = self.take_active(id)?;
        let merged = tx.merge_into(&mut self.live);

        sink::record(MetricsEvent::Transaction {
            phase: TransactionPhase::Commit,
            id: id.get(),
        });
        tracing::debug!(%id, tables = merged, "transaction committed");

        Ok(())
    }

    /// Discard the snapshot.
    pub fn rollback(&mut self, id: TransactionId) -> Result<(), Error> {
        self.take_active(id)?;

        sink::record(MetricsEvent::Transaction {
            phase: TransactionPhase::Rollback,
            id: id.get(),
        });
        tracing::debug!(%id, "transaction rolled back");

        Ok(())
    }

    #[must_use]
    pub fn active_transaction(&self) -> Option<TransactionId> {
        self.active.as_ref().map(|tx| tx.id)
    }

    #[must_use]
    pub const fn in_transaction(&self) -> bool {
        self.active.is_some()
    }

    fn take_active(&mut self, id: TransactionId) -> Result<ActiveTransaction, Error> {
        match self.active.take() {
            Some(tx) if tx.id == id => Ok(tx),
            other => {
                let active = other.as_ref().map(|tx| tx.id.get());
                self.active = other;

                Err(Error::transaction_mismatch(active, id.get()))
            }
        }
    }
}
