//! The capability seam between the engine and a concrete database driver.
//!
//! The engine is generic over these traits and calls nothing else. A driver
//! supplies three things: a [`Connector`] that dials, a [`ClientConnection`]
//! that prepares statements and escapes text, and a [`StatementHandle`] that
//! owns one prepared statement for the duration of one dispatch.

use thiserror::Error;

use crate::config::DbConfig;
use crate::sanitize;
use crate::types::FieldValue;

/// Uniform driver failure: a numeric code plus the driver's message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{code}] {message}")]
pub struct DriverError {
    pub code: i32,
    pub message: String,
}

impl DriverError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Dials a connection from a [`DbConfig`].
pub trait Connector {
    type Conn: ClientConnection;

    /// Establish a connection. The session treats a failure here as fatal.
    fn establish(&self, config: &DbConfig) -> Result<Self::Conn, DriverError>;
}

/// An established connection that can prepare statements.
pub trait ClientConnection {
    type Statement<'conn>: StatementHandle
    where
        Self: 'conn;

    fn prepare(&self, sql: &str) -> Result<Self::Statement<'_>, DriverError>;

    /// Escape text for inclusion in a parameter. The default applies
    /// MySQL-style backslash escaping; drivers with a server-side escape
    /// function override this.
    fn escape_text(&self, raw: &str) -> String {
        sanitize::add_slashes(raw)
    }

    /// SQL listing table names, one per row, name in the first column.
    fn list_tables_sql(&self) -> String {
        "SHOW TABLES".to_string()
    }

    /// SQL listing the columns of `table`, name in the first column. The
    /// caller validates `table` before interpolation.
    fn list_columns_sql(&self, table: &str) -> String {
        format!("SHOW COLUMNS FROM {table}")
    }
}

/// One prepared statement, exclusively owned by one dispatch.
///
/// `bind` and `execute` may be called repeatedly on the same handle (the
/// batch path re-binds row after row without re-preparing). The handle is
/// released on every exit path: explicitly via [`StatementHandle::close`] on
/// success, through `Drop` otherwise.
pub trait StatementHandle {
    /// Placeholder count the driver parsed out of the SQL template.
    fn expected_param_count(&self) -> usize;

    /// Bind one full row of parameters, replacing any previous binding.
    fn bind(&mut self, values: &[FieldValue]) -> Result<(), DriverError>;

    fn execute(&mut self) -> Result<(), DriverError>;

    /// Rows touched by the most recent execute of a mutating statement.
    fn affected_rows(&self) -> u64;

    /// Generated id from the most recent insert, 0 when none was produced.
    fn last_insert_id(&self) -> u64;

    /// Column labels of the pending result, in statement order, duplicates
    /// preserved as the driver reports them.
    fn describe_columns(&self) -> Result<Vec<String>, DriverError>;

    /// Next result row as owned values, `None` once exhausted.
    fn fetch_next(&mut self) -> Result<Option<Vec<FieldValue>>, DriverError>;

    /// Release the statement. Drivers with nothing to do keep the default.
    fn close(self) -> Result<(), DriverError>
    where
        Self: Sized,
    {
        Ok(())
    }
}
