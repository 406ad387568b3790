use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::descriptor::ParamDescriptor;
use crate::error::TagSqlError;
use crate::results::ResultSet;

/// Values that can be bound as query parameters or read back from a row.
///
/// One enum serves both directions so the coercion table and the drivers do
/// not need separate parameter and cell types:
/// ```rust
/// use tagsql::prelude::*;
///
/// let params = vec![
///     FieldValue::Int(1),
///     FieldValue::Text("alice".into()),
///     FieldValue::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value; the composite form the escape policy recurses into
    Json(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl FieldValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let FieldValue::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let FieldValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let FieldValue::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let FieldValue::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            // Try "YYYY-MM-DD HH:MM:SS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt);
            }
            // Try "YYYY-MM-DD HH:MM:SS.SSS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S.%3f") {
                return Some(dt);
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let FieldValue::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let FieldValue::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }
}

/// Statement classes the dispatcher cares about.
///
/// Classification looks only at the first whitespace-delimited token,
/// case-insensitively. A statement opening with a comment or a CTE therefore
/// classifies as [`StatementKind::Other`] and runs on the empty-success path;
/// callers that need rows from such statements should unwrap them first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Insert,
    Update,
    Delete,
    Select,
    Show,
    Other,
}

impl StatementKind {
    #[must_use]
    pub fn classify(sql: &str) -> Self {
        let Some(verb) = sql.split_whitespace().next() else {
            return Self::Other;
        };
        match verb.to_ascii_lowercase().as_str() {
            "insert" => Self::Insert,
            "update" => Self::Update,
            "delete" => Self::Delete,
            "select" => Self::Select,
            "show" => Self::Show,
            _ => Self::Other,
        }
    }
}

/// A SQL template plus its tagged parameters, immutable once submitted.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub sql: String,
    pub params: ParamDescriptor,
    /// Treat the payload as row groups for a repeated insert.
    pub multi_row_insert: bool,
}

impl QueryRequest {
    pub fn new(sql: impl Into<String>, params: ParamDescriptor) -> Self {
        Self {
            sql: sql.into(),
            params,
            multi_row_insert: false,
        }
    }

    /// Convenience constructor for a statement with no bound parameters.
    pub fn without_params(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: ParamDescriptor::none(),
            multi_row_insert: false,
        }
    }

    /// Convenience constructor for a repeated insert over row groups.
    pub fn multi_insert(sql: impl Into<String>, params: ParamDescriptor) -> Self {
        Self {
            sql: sql.into(),
            params,
            multi_row_insert: true,
        }
    }
}

/// What a successful dispatch produced, shaped by the statement verb.
#[derive(Debug)]
pub enum QueryOutcome {
    /// Materialized rows from a select/show statement.
    Rows(ResultSet),
    /// Rows touched by an update/delete statement.
    Affected(u64),
    /// Generated id from an insert statement (0 when the table has none).
    InsertId(u64),
    /// Per-row generated ids from a multi-row insert; failures stay inline
    /// so ids of already-committed rows remain observable.
    Batch(Vec<Result<u64, TagSqlError>>),
    /// Empty success for any other verb.
    Done,
}

impl QueryOutcome {
    #[must_use]
    pub fn as_rows(&self) -> Option<&ResultSet> {
        if let QueryOutcome::Rows(rs) = self {
            Some(rs)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_affected(&self) -> Option<u64> {
        if let QueryOutcome::Affected(n) = self {
            Some(*n)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_insert_id(&self) -> Option<u64> {
        if let QueryOutcome::InsertId(id) = self {
            Some(*id)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_batch(&self) -> Option<&[Result<u64, TagSqlError>]> {
        if let QueryOutcome::Batch(entries) = self {
            Some(entries)
        } else {
            None
        }
    }
}
