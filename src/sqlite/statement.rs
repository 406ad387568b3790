use std::collections::VecDeque;

use rusqlite::{Connection as RusqliteConnection, Statement};

use super::params::{extract_value, to_driver_error, to_sqlite_value};
use crate::driver::{DriverError, StatementHandle};
use crate::types::FieldValue;

/// One prepared SQLite statement.
///
/// Statements with result columns run to completion inside `execute` and
/// buffer their rows, which keeps the fetch surface cursor-shaped without
/// holding a rusqlite `Rows` borrow across trait calls. Mutating statements
/// go through the raw execute path and record their counters.
pub struct SqliteStatement<'conn> {
    stmt: Statement<'conn>,
    conn: &'conn RusqliteConnection,
    buffered: VecDeque<Vec<FieldValue>>,
    affected: u64,
    insert_id: u64,
}

impl<'conn> SqliteStatement<'conn> {
    pub(crate) fn new(stmt: Statement<'conn>, conn: &'conn RusqliteConnection) -> Self {
        Self {
            stmt,
            conn,
            buffered: VecDeque::new(),
            affected: 0,
            insert_id: 0,
        }
    }
}

impl StatementHandle for SqliteStatement<'_> {
    fn expected_param_count(&self) -> usize {
        self.stmt.parameter_count()
    }

    fn bind(&mut self, values: &[FieldValue]) -> Result<(), DriverError> {
        for (i, value) in values.iter().enumerate() {
            self.stmt
                .raw_bind_parameter(i + 1, to_sqlite_value(value))
                .map_err(|e| to_driver_error(&e))?;
        }
        Ok(())
    }

    fn execute(&mut self) -> Result<(), DriverError> {
        self.buffered.clear();
        let column_count = self.stmt.column_count();
        if column_count > 0 {
            let Self { stmt, buffered, .. } = self;
            let mut rows = stmt.raw_query();
            while let Some(row) = rows.next().map_err(|e| to_driver_error(&e))? {
                let mut values = Vec::with_capacity(column_count);
                for idx in 0..column_count {
                    values.push(extract_value(row, idx)?);
                }
                buffered.push_back(values);
            }
        } else {
            let changed = self.stmt.raw_execute().map_err(|e| to_driver_error(&e))?;
            self.affected = changed as u64;
            self.insert_id = u64::try_from(self.conn.last_insert_rowid()).unwrap_or(0);
        }
        Ok(())
    }

    fn affected_rows(&self) -> u64 {
        self.affected
    }

    fn last_insert_id(&self) -> u64 {
        self.insert_id
    }

    fn describe_columns(&self) -> Result<Vec<String>, DriverError> {
        Ok(self
            .stmt
            .column_names()
            .iter()
            .map(|s| (*s).to_string())
            .collect())
    }

    fn fetch_next(&mut self) -> Result<Option<Vec<FieldValue>>, DriverError> {
        Ok(self.buffered.pop_front())
    }

    fn close(self) -> Result<(), DriverError> {
        let Self { stmt, .. } = self;
        stmt.finalize().map_err(|e| to_driver_error(&e))
    }
}
