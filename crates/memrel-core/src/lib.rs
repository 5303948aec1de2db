//! Core runtime for memrel: an in-memory relational engine with predicate
//! filtering, joins, grouping, sorting, constrained mutation and snapshot
//! transactions. The ergonomics are exported via the `prelude`.

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod obs;
pub mod schema;
pub mod value;

// re-exports
pub use error::Error;

///
/// Prelude
///
/// Domain vocabulary for building schemas, queries and mutations.
///

pub mod prelude {
    pub use crate::{
        config::DbConfig,
        db::{
            Database, TransactionId,
            mutation::Update,
            query::{
                Aggregate, Direction, JoinDescriptor, OrderBy, Predicate, Query, Select,
                SelectColumn,
                predicate::{Chain, Operator},
            },
            store::{Data, Record},
        },
        schema::{ColumnSpec, DataType, Schema},
        value::Value,
    };
}
