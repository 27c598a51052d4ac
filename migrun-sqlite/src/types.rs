//! Type conversion utilities for SQLite.

use rusqlite::types::Value as SqliteValue;

use migrun_core::Value;

/// Convert a statement parameter to a SQLite value.
///
/// SQLite has no boolean storage class; booleans are stored as `0`/`1`.
pub fn to_sqlite(value: &Value) -> SqliteValue {
    match value {
        Value::Null => SqliteValue::Null,
        Value::Bool(b) => SqliteValue::Integer(i64::from(*b)),
        Value::Int(i) => SqliteValue::Integer(*i),
        Value::Text(s) => SqliteValue::Text(s.clone()),
    }
}

/// Convert a parameter list.
pub fn to_sqlite_params(values: &[Value]) -> Vec<SqliteValue> {
    values.iter().map(to_sqlite).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_sqlite() {
        assert_eq!(to_sqlite(&Value::Null), SqliteValue::Null);
        assert_eq!(to_sqlite(&Value::Bool(true)), SqliteValue::Integer(1));
        assert_eq!(to_sqlite(&Value::Bool(false)), SqliteValue::Integer(0));
        assert_eq!(to_sqlite(&Value::Int(-4)), SqliteValue::Integer(-4));
        assert_eq!(
            to_sqlite(&Value::Text("a".into())),
            SqliteValue::Text("a".into())
        );
    }

    #[test]
    fn test_to_sqlite_params_keeps_order() {
        let params = to_sqlite_params(&[Value::Int(20240101), Value::Bool(true)]);
        assert_eq!(
            params,
            vec![SqliteValue::Integer(20240101), SqliteValue::Integer(1)]
        );
    }
}
