use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use sqlx::MySqlPool;

use crate::error::AppError;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, PartialEq)]
pub enum SqlValue {
    String(String),
    I64(i64),
    Decimal(Decimal),
    Bool(bool),
    Date(NaiveDate),
    Null,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Build a partial UPDATE from a JSON object
/// ===============================
///
/// Only keys listed in `allowed_columns` may appear; column names are never
/// taken verbatim from the request otherwise.
pub fn build_update_sql(
    table: &str,
    payload: &Map<String, Value>,
    allowed_columns: &[&str],
    id_column: &str,
    id_value: u64,
) -> Result<SqlUpdate, AppError> {
    if payload.is_empty() {
        return Err(AppError::validation("No fields provided for update"));
    }

    if let Some(unknown) = payload.keys().find(|k| !allowed_columns.contains(&k.as_str())) {
        return Err(AppError::validation(format!("Field '{unknown}' cannot be updated")));
    }

    let set_clause = payload
        .keys()
        .map(|k| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values = Vec::with_capacity(payload.len() + 1);

    // Convert JSON values → SqlValue
    for value in payload.values() {
        match value {
            Value::String(s) => {
                if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    values.push(SqlValue::Date(d));
                } else {
                    values.push(SqlValue::String(s.clone()));
                }
            }
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    values.push(SqlValue::I64(i));
                } else {
                    let d = Decimal::from_str(&n.to_string())
                        .map_err(|_| AppError::validation(format!("Invalid number {n}")))?;
                    values.push(SqlValue::Decimal(d));
                }
            }
            Value::Bool(b) => values.push(SqlValue::Bool(*b)),
            Value::Null => values.push(SqlValue::Null),
            _ => return Err(AppError::validation("Unsupported JSON value type")),
        }
    }

    // WHERE id = ?
    values.push(SqlValue::I64(id_value as i64));

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::Decimal(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

/// Extracts the JSON object of an update body.
pub fn as_object(payload: Value) -> Result<Map<String, Value>, AppError> {
    match payload {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::validation("Payload must be a JSON object")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        as_object(value).unwrap()
    }

    #[test]
    fn builds_one_placeholder_per_field_plus_id() {
        let payload = object(json!({ "name": "Ana", "active": false }));
        let update =
            build_update_sql("employees", &payload, &["name", "active"], "id", 4).unwrap();

        assert!(update.sql.starts_with("UPDATE employees SET "));
        assert!(update.sql.contains("name = ?"));
        assert!(update.sql.contains("active = ?"));
        assert!(update.sql.ends_with(" WHERE id = ?"));
        assert_eq!(update.values.len(), 3);
        assert!(update.values.contains(&SqlValue::Bool(false)));
        assert!(update.values.contains(&SqlValue::String("Ana".to_string())));
        assert_eq!(update.values.last(), Some(&SqlValue::I64(4)));
    }

    #[test]
    fn rejects_columns_outside_the_whitelist() {
        let payload = object(json!({ "id": 9 }));
        let err = build_update_sql("clients", &payload, &["name"], "id", 1).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn rejects_empty_payloads() {
        let err = build_update_sql("clients", &Map::new(), &["name"], "id", 1).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn dates_and_fractional_numbers_get_typed_values() {
        let payload = object(json!({ "date": "2026-03-02", "unit_price": 4.75 }));
        let update =
            build_update_sql("carreta_washes", &payload, &["date", "unit_price"], "id", 2)
                .unwrap();

        assert!(update.values.contains(&SqlValue::Date(
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
        )));
        assert!(update.values.contains(&SqlValue::Decimal(Decimal::new(475, 2))));
    }

    #[test]
    fn non_objects_are_rejected() {
        assert!(as_object(json!([1, 2])).is_err());
    }
}
