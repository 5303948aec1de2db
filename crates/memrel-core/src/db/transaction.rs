use crate::db::store::Data;
use derive_more::{Display, From, Into};
use std::collections::BTreeSet;

///
/// TransactionId
///
/// Opaque handle returned by `begin_transaction`; commit and rollback must
/// present the handle of the active transaction.
///

#[derive(Clone, Copy, Debug, Display, Eq, From, Hash, Into, Ord, PartialEq, PartialOrd)]
#[display("tx#{_0}")]
pub struct TransactionId(u64);

impl TransactionId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

///
/// ActiveTransaction
///
/// Snapshot owned by the open transaction plus the set of tables it wrote.
/// The snapshot shares table storage with the live store until a write
/// forces a private copy.
///

#[derive(Debug)]
pub(crate) struct ActiveTransaction {
    pub(crate) id: TransactionId,
    pub(crate) data: Data,
    touched: BTreeSet<String>,
}

impl ActiveTransaction {
    pub(crate) const fn begin(id: TransactionId, data: Data) -> Self {
        Self {
            id,
            data,
            touched: BTreeSet::new(),
        }
    }

    pub(crate) fn touch(&mut self, table: &str) {
        if !self.touched.contains(table) {
            self.touched.insert(table.to_string());
        }
    }

    /// Move every written table into `live`; untouched tables pass through.
    pub(crate) fn merge_into(self, live: &mut Data) -> usize {
        let mut merged = 0;
        for table in &self.touched {
            if let Some(rows) = self.data.shared_table(table) {
                live.replace_shared(table, rows);
                merged += 1;
            }
        }

        merged
    }
}
