use rusqlite::types::Value;

use crate::driver::DriverError;
use crate::types::FieldValue;

/// Convert an engine value to a SQLite value for binding.
#[must_use]
pub fn to_sqlite_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Int(i) => Value::Integer(*i),
        FieldValue::Float(f) => Value::Real(*f),
        FieldValue::Text(s) => Value::Text(s.clone()),
        FieldValue::Bool(b) => Value::Integer(i64::from(*b)),
        FieldValue::Timestamp(dt) => {
            let formatted = dt.format("%F %T%.f").to_string();
            Value::Text(formatted)
        }
        FieldValue::Null => Value::Null,
        FieldValue::Json(jsval) => Value::Text(jsval.to_string()),
        FieldValue::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

/// Read one cell out of a result row.
pub fn extract_value(row: &rusqlite::Row<'_>, idx: usize) -> Result<FieldValue, DriverError> {
    match row.get_ref(idx) {
        Err(e) => Err(to_driver_error(&e)),
        Ok(rusqlite::types::ValueRef::Null) => Ok(FieldValue::Null),
        Ok(rusqlite::types::ValueRef::Integer(i)) => Ok(FieldValue::Int(i)),
        Ok(rusqlite::types::ValueRef::Real(f)) => Ok(FieldValue::Float(f)),
        Ok(rusqlite::types::ValueRef::Text(bytes)) => {
            let s = String::from_utf8_lossy(bytes).into_owned();
            Ok(FieldValue::Text(s))
        }
        Ok(rusqlite::types::ValueRef::Blob(b)) => Ok(FieldValue::Blob(b.to_vec())),
    }
}

/// Map a rusqlite error to the uniform driver error, keeping the extended
/// result code when one exists.
pub fn to_driver_error(err: &rusqlite::Error) -> DriverError {
    let code = match err {
        rusqlite::Error::SqliteFailure(inner, _) => inner.extended_code,
        _ => 1,
    };
    DriverError::new(code, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn scalars_map_to_native_sqlite_types() {
        assert_eq!(to_sqlite_value(&FieldValue::Int(5)), Value::Integer(5));
        assert_eq!(to_sqlite_value(&FieldValue::Bool(true)), Value::Integer(1));
        assert_eq!(to_sqlite_value(&FieldValue::Null), Value::Null);
        assert_eq!(
            to_sqlite_value(&FieldValue::Text("x".into())),
            Value::Text("x".into())
        );
    }

    #[test]
    fn timestamps_and_json_bind_as_text() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(
            to_sqlite_value(&FieldValue::Timestamp(dt)),
            Value::Text("2024-03-01 10:30:00".into())
        );
        assert_eq!(
            to_sqlite_value(&FieldValue::Json(json!({"k": 1}))),
            Value::Text("{\"k\":1}".into())
        );
    }
}
