use rusqlite::Connection as RusqliteConnection;

use super::params::to_driver_error;
use super::statement::SqliteStatement;
use crate::config::DbConfig;
use crate::driver::{ClientConnection, Connector, DriverError};

/// Connector opening a SQLite database. Only [`DbConfig::dbname`] is read;
/// it is the database path, with `:memory:` giving a throwaway database.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteConnector;

impl Connector for SqliteConnector {
    type Conn = SqliteClient;

    fn establish(&self, config: &DbConfig) -> Result<SqliteClient, DriverError> {
        let conn = RusqliteConnection::open(&config.dbname).map_err(|e| to_driver_error(&e))?;
        Ok(SqliteClient { conn })
    }
}

/// An open SQLite database.
pub struct SqliteClient {
    pub(crate) conn: RusqliteConnection,
}

impl SqliteClient {
    /// Open a client directly from a path, without going through a session.
    ///
    /// # Errors
    ///
    /// Returns the driver's error when the database cannot be opened.
    pub fn open(path: &str) -> Result<Self, DriverError> {
        let conn = RusqliteConnection::open(path).map_err(|e| to_driver_error(&e))?;
        Ok(Self { conn })
    }

    /// Direct access to the underlying rusqlite connection.
    #[must_use]
    pub fn raw(&self) -> &RusqliteConnection {
        &self.conn
    }
}

impl ClientConnection for SqliteClient {
    type Statement<'conn>
        = SqliteStatement<'conn>
    where
        Self: 'conn;

    fn prepare(&self, sql: &str) -> Result<SqliteStatement<'_>, DriverError> {
        let stmt = self.conn.prepare(sql).map_err(|e| to_driver_error(&e))?;
        Ok(SqliteStatement::new(stmt, &self.conn))
    }

    fn list_tables_sql(&self) -> String {
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
            .to_string()
    }

    fn list_columns_sql(&self, table: &str) -> String {
        format!("SELECT name FROM pragma_table_info('{table}')")
    }
}
