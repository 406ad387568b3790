//! Lightweight prepared-statement runner.
//!
//! A SQL template plus a type-tagged parameter descriptor goes in; a
//! verb-shaped outcome comes out. Parameters are coerced per tag (integer,
//! float, raw text, scrubbed rich text, or escape-only), arity is validated
//! locally before the driver sees anything, and select results materialize
//! into owned row mappings whose duplicate column names are renamed so
//! joined projections stay addressable.
//!
//! ```rust
//! use tagsql::prelude::*;
//!
//! # #[cfg(feature = "sqlite")]
//! # fn demo() -> Result<(), TagSqlError> {
//! let config = DbConfig::new("", "", "", ":memory:");
//! let mut session = SqlSession::new(SqliteConnector, config);
//!
//! session.run("CREATE TABLE t (id INTEGER PRIMARY KEY, a INT, b TEXT)", ParamDescriptor::none())?;
//! let outcome = session.run(
//!     "INSERT INTO t (a, b) VALUES (?, ?)",
//!     ParamDescriptor::row("is", vec![FieldValue::Text("7".into()), FieldValue::Text("hello".into())]),
//! )?;
//! assert!(outcome.as_insert_id().unwrap() > 0);
//! # Ok(()) }
//! # #[cfg(feature = "sqlite")]
//! # demo().unwrap();
//! ```
//!
//! Sessions are synchronous and single-threaded; one connection, one call
//! at a time, with per-call telemetry on the session.

mod batch;
mod catalog;
mod executor;

pub mod coerce;
pub mod config;
pub mod descriptor;
pub mod driver;
pub mod error;
pub mod prelude;
pub mod results;
pub mod sanitize;
pub mod session;
pub mod telemetry;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use error::TagSqlError;
