//! JSON seed loading.
//!
//! Schema document: `{ table: { column: { datatype, isPrimary?, isIdentity?,
//! isNullable?, isUnique?, default? } } }`.
//! Data document: `{ table: [ { column: value } ] }`.
//!
//! Column and row order follow the documents.

use crate::{
    config::DbConfig,
    db::{
        Database,
        store::{Data, Record},
    },
    error::{Error, ErrorOrigin},
    schema::{ColumnDefinition, ColumnSpec, DataType, Schema},
    value::Value,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value as Json};

const SCHEMA_DOCUMENT: &str = "$schema";
const DATA_DOCUMENT: &str = "$data";

/// Default-producer names that resolve to the insert-time clock.
const TIMESTAMP_DEFAULTS: [&str; 3] = ["CURRENT_TIMESTAMP", "now", "now()"];

///
/// ColumnDocument
///

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColumnDocument {
    datatype: String,
    #[serde(default)]
    is_primary: bool,
    #[serde(default)]
    is_identity: bool,
    is_nullable: Option<bool>,
    is_unique: Option<bool>,
    default: Option<Json>,
}

impl Database {
    /// Build a database from a schema document and a data document.
    pub fn from_json(schema: &str, data: &str) -> Result<Self, Error> {
        Self::from_json_with_config(schema, data, DbConfig::default())
    }

    pub fn from_json_with_config(schema: &str, data: &str, config: DbConfig) -> Result<Self, Error> {
        let schema = schema_from_json(schema)?;
        let data = data_from_json(&schema, data)?;

        Self::with_config(schema, data, config)
    }
}

/// Parse a schema document.
pub fn schema_from_json(json: &str) -> Result<Schema, Error> {
    let document: Map<String, Json> = parse(SCHEMA_DOCUMENT, json)?;
    let mut schema = Schema::new();

    for (table, columns) in document {
        let Json::Object(columns) = columns else {
            return Err(Error::invalid_seed(table, None, "expected an object of columns"));
        };

        let mut specs = Vec::with_capacity(columns.len());
        for (field, column) in columns {
            let column: ColumnDocument = serde_json::from_value(column)
                .map_err(|err| Error::invalid_seed(&table, Some(field.clone()), err.to_string()))?;
            let spec = column_spec(&table, &field, column)?;
            specs.push((field, spec));
        }

        schema.register_table(table, specs)?;
    }

    Ok(schema)
}

/// Parse a data document against `schema`, converting each value by its
/// column's datatype.
pub fn data_from_json(schema: &Schema, json: &str) -> Result<Data, Error> {
    let document: Map<String, Json> = parse(DATA_DOCUMENT, json)?;
    let mut data = Data::new();

    for (table, rows) in document {
        let table_schema = schema.require_table(&table, ErrorOrigin::Bootstrap)?;
        let Json::Array(rows) = rows else {
            return Err(Error::invalid_seed(table, None, "expected an array of rows"));
        };

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let Json::Object(fields) = row else {
                return Err(Error::invalid_seed(table, None, "expected a row object"));
            };

            let mut record = Record::with_capacity(fields.len());
            for (field, json) in fields {
                let column = table_schema.require_column(&field, ErrorOrigin::Bootstrap)?;
                let value = convert(column, &json)?;
                record.set(field, value);
            }
            records.push(record);
        }

        tracing::debug!(table = %table, rows = records.len(), "seeded table");
        data.insert_table(table, records);
    }

    Ok(data)
}

fn parse(document: &str, json: &str) -> Result<Map<String, Json>, Error> {
    serde_json::from_str(json).map_err(|err| Error::invalid_seed(document, None, err.to_string()))
}

fn column_spec(table: &str, field: &str, column: ColumnDocument) -> Result<ColumnSpec, Error> {
    let datatype = DataType::from_name(&column.datatype).ok_or_else(|| {
        Error::invalid_seed(
            table,
            Some(field.to_string()),
            format!("unsupported datatype '{}'", column.datatype),
        )
    })?;

    let mut spec = ColumnSpec::new(datatype);
    spec.primary = column.is_primary;
    spec.identity = column.is_identity;
    spec.nullable = column.is_nullable;
    spec.unique = column.is_unique;

    spec = match column.default {
        None | Some(Json::Null) => spec,
        Some(Json::String(s)) if TIMESTAMP_DEFAULTS.contains(&s.as_str()) => spec.default_now(),
        Some(json) => {
            let value = convert_as(table, field, datatype, &json)?;
            spec.default_value(value)
        }
    };

    Ok(spec)
}

fn convert(column: &ColumnDefinition, json: &Json) -> Result<Value, Error> {
    convert_as(&column.table, &column.field, column.datatype, json)
}

// Convert one JSON scalar to the column's value kind.
fn convert_as(table: &str, field: &str, datatype: DataType, json: &Json) -> Result<Value, Error> {
    let value = match (datatype, json) {
        (_, Json::Null) => Some(Value::Null),
        (DataType::String, Json::String(s)) => Some(Value::Text(s.clone())),
        (DataType::Boolean, Json::Bool(b)) => Some(Value::Bool(*b)),
        (DataType::Int, Json::Number(n)) => n.as_i64().map(Value::Int),
        (DataType::Float, Json::Number(n)) => n.as_f64().map(Value::Float),
        (DataType::Date, Json::String(s)) => parse_date(s).map(Value::Date),
        _ => None,
    };

    value.ok_or_else(|| {
        Error::invalid_seed(
            table,
            Some(field.to_string()),
            format!("expected {datatype}, found {json}"),
        )
    })
}

/// RFC 3339, else a naive `YYYY-MM-DD[THH:MM:SS]` read as UTC.
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
