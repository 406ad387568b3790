// SQLite adapter - maps the driver traits onto rusqlite
//
// Split into sub-modules:
// - connection: connector and established client
// - params: value conversion between engine and SQLite types
// - statement: the prepared-statement handle

pub mod connection;
pub mod params;
pub mod statement;

pub use connection::{SqliteClient, SqliteConnector};
pub use statement::SqliteStatement;
