//! Per-tag parameter coercion.
//!
//! Applied position by position after the arity check and before binding.
//! Escaping goes through [`ClientConnection::escape_text`], so a live
//! connection is required by the time this runs.

use serde_json::Value as JsonValue;

use crate::descriptor::TypeTag;
use crate::driver::ClientConnection;
use crate::sanitize;
use crate::types::FieldValue;

/// Coerce one full parameter row. Tag and value slices are the same length
/// by the time the executor calls this.
pub fn coerce_row<C: ClientConnection>(
    conn: &C,
    tags: &[TypeTag],
    values: &[FieldValue],
) -> Vec<FieldValue> {
    tags.iter()
        .zip(values)
        .map(|(tag, value)| apply_tag(conn, *tag, value))
        .collect()
}

/// Coerce a single value under a single tag.
pub fn apply_tag<C: ClientConnection>(conn: &C, tag: TypeTag, value: &FieldValue) -> FieldValue {
    match tag {
        TypeTag::Int => FieldValue::Int(to_i64(value)),
        TypeTag::Double => FieldValue::Float(to_f64(value)),
        TypeTag::RawText => match value {
            FieldValue::Text(s) => FieldValue::Text(sanitize::strip_slashes(s)),
            other => other.clone(),
        },
        TypeTag::RichText => match value {
            FieldValue::Text(s) => FieldValue::Text(conn.escape_text(&sanitize::scrub_rich_text(s))),
            // Nested values take the plain escape policy, not the scrub.
            FieldValue::Json(v) => FieldValue::Json(escape_json(conn, v)),
            other => other.clone(),
        },
        TypeTag::Escaped => escape_value(conn, value),
    }
}

fn escape_value<C: ClientConnection>(conn: &C, value: &FieldValue) -> FieldValue {
    match value {
        FieldValue::Text(s) => FieldValue::Text(conn.escape_text(s)),
        FieldValue::Json(v) => FieldValue::Json(escape_json(conn, v)),
        other => other.clone(),
    }
}

fn escape_json<C: ClientConnection>(conn: &C, value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::String(s) => JsonValue::String(conn.escape_text(s)),
        JsonValue::Array(items) => {
            JsonValue::Array(items.iter().map(|v| escape_json(conn, v)).collect())
        }
        JsonValue::Object(map) => JsonValue::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), escape_json(conn, v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Integral coercion: leading digit prefix for text, truncation for floats,
/// 0/1 for bools, epoch seconds for timestamps, emptiness for composites.
fn to_i64(value: &FieldValue) -> i64 {
    match value {
        FieldValue::Int(i) => *i,
        FieldValue::Float(f) => *f as i64,
        FieldValue::Text(s) => leading_i64(s),
        FieldValue::Bool(b) => i64::from(*b),
        FieldValue::Timestamp(ts) => ts.and_utc().timestamp(),
        FieldValue::Null => 0,
        FieldValue::Json(v) => json_to_i64(v),
        FieldValue::Blob(_) => 0,
    }
}

fn to_f64(value: &FieldValue) -> f64 {
    match value {
        FieldValue::Int(i) => *i as f64,
        FieldValue::Float(f) => *f,
        FieldValue::Text(s) => leading_f64(s),
        FieldValue::Bool(b) => f64::from(u8::from(*b)),
        FieldValue::Timestamp(ts) => ts.and_utc().timestamp() as f64,
        FieldValue::Null => 0.0,
        FieldValue::Json(v) => json_to_f64(v),
        FieldValue::Blob(_) => 0.0,
    }
}

fn json_to_i64(value: &JsonValue) -> i64 {
    match value {
        JsonValue::Null => 0,
        JsonValue::Bool(b) => i64::from(*b),
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        JsonValue::String(s) => leading_i64(s),
        JsonValue::Array(a) => i64::from(!a.is_empty()),
        JsonValue::Object(o) => i64::from(!o.is_empty()),
    }
}

fn json_to_f64(value: &JsonValue) -> f64 {
    match value {
        JsonValue::Null => 0.0,
        JsonValue::Bool(b) => f64::from(u8::from(*b)),
        JsonValue::Number(n) => n.as_f64().unwrap_or(0.0),
        JsonValue::String(s) => leading_f64(s),
        JsonValue::Array(a) => f64::from(u8::from(!a.is_empty())),
        JsonValue::Object(o) => f64::from(u8::from(!o.is_empty())),
    }
}

/// Parse the longest leading integer prefix; no prefix parses as 0 and an
/// overflowing prefix saturates.
fn leading_i64(text: &str) -> i64 {
    let trimmed = text.trim_start();
    let (sign, digits_start) = match trimmed.as_bytes().first() {
        Some(b'+') => (1i64, 1),
        Some(b'-') => (-1i64, 1),
        _ => (1i64, 0),
    };
    let digit_count = trimmed[digits_start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digit_count == 0 {
        return 0;
    }
    match trimmed[digits_start..digits_start + digit_count].parse::<i64>() {
        Ok(n) => sign * n,
        Err(_) => {
            if sign < 0 {
                i64::MIN
            } else {
                i64::MAX
            }
        }
    }
}

/// Parse the longest leading float prefix: optional sign, digits, optional
/// fraction, optional exponent. No prefix parses as 0.0.
fn leading_f64(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_digits = bytes[end..].iter().take_while(|b| b.is_ascii_digit()).count();
    end += int_digits;
    let mut have_digits = int_digits > 0;
    if bytes.get(end) == Some(&b'.') {
        let frac_digits = bytes[end + 1..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if frac_digits > 0 || have_digits {
            end += 1 + frac_digits;
            have_digits = have_digits || frac_digits > 0;
        }
    }
    if !have_digits {
        return 0.0;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = bytes[exp_end..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }
    trimmed[..end].parse::<f64>().unwrap_or(0.0)
}
