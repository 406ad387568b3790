//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and traits
//! to make it easier to get started with the library.

pub use crate::config::{ConfigField, DbConfig};
pub use crate::descriptor::{ParamDescriptor, ParamPayload, TypeTag};
pub use crate::driver::{ClientConnection, Connector, DriverError, StatementHandle};
pub use crate::error::TagSqlError;
pub use crate::results::{ResultSet, Row};
pub use crate::session::SqlSession;
pub use crate::telemetry::QueryTelemetry;
pub use crate::types::{FieldValue, QueryOutcome, QueryRequest, StatementKind};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteClient, SqliteConnector};

#[cfg(feature = "test-utils")]
pub use crate::test_utils::{MemoryConnection, MemoryConnector};
