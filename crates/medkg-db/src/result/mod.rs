//! Conversion of Cozo rows into the orchestrator's value types.

use cozo::{DataValue, NamedRows, Num};
use medkg_core::{QueryResult, QueryResultRow};

use crate::error::DbError;

pub(crate) fn get_pos(v: &[String], field: &str) -> Result<usize, DbError> {
    v.iter()
        .position(|s| s == field)
        .ok_or_else(|| DbError::Cozo(format!("Could not locate field {} in NamedRows", field)))
}

/// Optional string column: null decodes to `None`, anything else must be a string.
pub(crate) fn to_opt_string(v: &DataValue, column: &str) -> Result<Option<String>, DbError> {
    match v {
        DataValue::Null => Ok(None),
        DataValue::Str(s) => Ok(Some(s.to_string())),
        other => Err(DbError::Decode {
            column: column.to_string(),
            message: format!("expected string, found {other:?}"),
        }),
    }
}

pub(crate) fn to_opt_int(v: &DataValue, column: &str) -> Result<Option<i64>, DbError> {
    match v {
        DataValue::Null => Ok(None),
        DataValue::Num(Num::Int(i)) => Ok(Some(*i)),
        other => Err(DbError::Decode {
            column: column.to_string(),
            message: format!("expected integer, found {other:?}"),
        }),
    }
}

pub(crate) fn to_f32(v: &DataValue, column: &str) -> Result<f32, DbError> {
    match v {
        DataValue::Num(Num::Float(f)) => Ok(*f as f32),
        DataValue::Num(Num::Int(i)) => Ok(*i as f32),
        other => Err(DbError::Decode {
            column: column.to_string(),
            message: format!("expected number, found {other:?}"),
        }),
    }
}

/// JSON rendering of a single Cozo value.
///
/// Scalars and lists map directly. Non-finite floats become `null`. Values with no natural
/// JSON form (bytes, vectors, uuids, validity) fall back to their debug rendering.
pub fn value_to_json(v: &DataValue) -> serde_json::Value {
    use serde_json::Value;
    match v {
        DataValue::Null => Value::Null,
        DataValue::Bool(b) => Value::Bool(*b),
        DataValue::Num(Num::Int(i)) => Value::from(*i),
        DataValue::Num(Num::Float(f)) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        DataValue::Str(s) => Value::String(s.to_string()),
        DataValue::List(items) => Value::Array(items.iter().map(value_to_json).collect()),
        DataValue::Set(items) => Value::Array(items.iter().map(value_to_json).collect()),
        other => Value::String(format!("{other:?}")),
    }
}

/// Header-ordered JSON rows for a query result. Duplicate header names keep the last value.
pub fn to_query_result(named_rows: NamedRows) -> QueryResult {
    let NamedRows { headers, rows, .. } = named_rows;
    let rows = rows
        .iter()
        .map(|row| {
            headers
                .iter()
                .zip(row.iter())
                .map(|(h, v)| (h.clone(), value_to_json(v)))
                .collect::<QueryResultRow>()
        })
        .collect();
    QueryResult { headers, rows }
}
