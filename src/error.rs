use thiserror::Error;

use crate::driver::DriverError;

/// Errors surfaced by the query engine.
///
/// Every variant is statement-scoped: the session stays usable after any of
/// these, and telemetry for the failed call is still recorded. The only
/// non-recoverable condition in the crate is connection establishment, which
/// panics in [`crate::session::SqlSession`] instead of returning here.
#[derive(Debug, Error)]
pub enum TagSqlError {
    /// The driver rejected the SQL template at prepare time.
    #[error("prepare failed: {0}")]
    Prepare(DriverError),

    /// Local arity check failed; the driver was never invoked.
    #[error("parameter mismatch: placeholders={placeholders}, params={params}, types={types}")]
    BindArity {
        /// Placeholder count reported by the prepared statement.
        placeholders: usize,
        /// Values supplied by the caller (row-group count for batches).
        params: usize,
        /// Type tags supplied by the caller.
        types: usize,
    },

    /// The driver rejected the bound parameter row.
    #[error("bind rejected: {0}")]
    Bind(DriverError),

    /// The driver reported a failure while executing the statement.
    #[error("execution failed: {0}")]
    Execute(DriverError),

    /// The driver rejected the result-buffer shape or failed mid-fetch.
    #[error("result binding failed: {0}")]
    BindResult(DriverError),

    /// A batch row's width disagreed with the first row's width.
    #[error("row {row} has {got} values, expected {expected}")]
    RowWidth {
        /// 1-based position of the offending row.
        row: usize,
        expected: usize,
        got: usize,
    },

    /// Configuration problem: bad config file, invalid catalog name, or a
    /// statement whose duplicate columns exhaust the rename candidates.
    #[error("configuration error: {0}")]
    Config(String),
}
