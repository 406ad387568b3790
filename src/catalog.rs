//! Catalog conveniences over [`SqlSession`]: table and column listings.
//!
//! The SQL dialect comes from the driver through
//! [`crate::driver::ClientConnection::list_tables_sql`] and
//! [`list_columns_sql`](crate::driver::ClientConnection::list_columns_sql);
//! both queries put the name in the first column, which is all the pluck
//! relies on.

use std::sync::LazyLock;

use regex::Regex;

use crate::driver::{ClientConnection, Connector};
use crate::error::TagSqlError;
use crate::session::SqlSession;
use crate::types::{QueryOutcome, QueryRequest};

static TABLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("table name pattern"));

impl<C: Connector> SqlSession<C> {
    /// List table names via the driver's catalog query.
    ///
    /// # Errors
    ///
    /// See [`SqlSession::query`].
    pub fn show_tables(&mut self) -> Result<Vec<String>, TagSqlError> {
        let sql = self.connect().list_tables_sql();
        self.pluck_first_column(QueryRequest::without_params(sql))
    }

    /// List the column names of one table.
    ///
    /// The name is interpolated into catalog SQL, so it is validated
    /// against a strict identifier pattern first.
    ///
    /// # Errors
    ///
    /// [`TagSqlError::Config`] for a name that fails validation, otherwise
    /// see [`SqlSession::query`].
    pub fn show_columns_from(&mut self, table: &str) -> Result<Vec<String>, TagSqlError> {
        let table = table.trim();
        if !TABLE_NAME.is_match(table) {
            return Err(TagSqlError::Config(format!("invalid table name '{table}'")));
        }
        let sql = self.connect().list_columns_sql(table);
        self.pluck_first_column(QueryRequest::without_params(sql))
    }

    /// Column names for several tables, one list per table, same order.
    ///
    /// # Errors
    ///
    /// Fails on the first table that fails; earlier results are dropped.
    pub fn show_columns_from_many(
        &mut self,
        tables: &[&str],
    ) -> Result<Vec<Vec<String>>, TagSqlError> {
        tables
            .iter()
            .map(|table| self.show_columns_from(table))
            .collect()
    }

    fn pluck_first_column(&mut self, request: QueryRequest) -> Result<Vec<String>, TagSqlError> {
        match self.query(request)? {
            QueryOutcome::Rows(rs) => Ok(rs
                .iter()
                .filter_map(|row| row.get_by_index(0))
                .filter_map(|value| value.as_text().map(str::to_string))
                .collect()),
            _ => Ok(Vec::new()),
        }
    }
}
