use std::time::Instant;

use tracing::debug;

use crate::config::DbConfig;
use crate::descriptor::ParamDescriptor;
use crate::driver::Connector;
use crate::error::TagSqlError;
use crate::executor;
use crate::telemetry::QueryTelemetry;
use crate::types::{FieldValue, QueryOutcome, QueryRequest};

/// A database session: one lazily-established connection plus the
/// telemetry of the most recent call.
///
/// The session is a single-threaded, synchronous object; queries block the
/// caller until the round trip completes, and the telemetry record is plain
/// mutable state. Connection establishment is the one fatal operation in
/// the crate: if the connector cannot dial, the session panics rather than
/// limping along without a database. Every statement-scoped failure is an
/// ordinary [`TagSqlError`] and leaves the session usable.
pub struct SqlSession<C: Connector> {
    connector: C,
    config: DbConfig,
    conn: Option<C::Conn>,
    telemetry: QueryTelemetry,
}

impl<C: Connector> SqlSession<C> {
    pub fn new(connector: C, config: DbConfig) -> Self {
        Self {
            connector,
            config,
            conn: None,
            telemetry: QueryTelemetry::default(),
        }
    }

    /// Establish the connection now instead of on first use.
    ///
    /// # Panics
    ///
    /// Panics when the driver cannot establish a connection.
    pub fn connect(&mut self) -> &mut C::Conn {
        let Self {
            connector,
            config,
            conn,
            ..
        } = self;
        conn.get_or_insert_with(|| establish_or_die(connector, config))
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Drop the connection. The next query re-establishes lazily.
    pub fn close(&mut self) {
        self.conn = None;
    }

    /// Run one request through the engine.
    ///
    /// Telemetry is reset and repopulated whether the call succeeds or
    /// fails; the duration covers the full dispatch.
    ///
    /// # Errors
    ///
    /// Any [`TagSqlError`]: prepare/bind/execute rejections from the
    /// driver, or local arity and materialization failures.
    ///
    /// # Panics
    ///
    /// Panics when no connection exists yet and establishing one fails.
    pub fn query(&mut self, request: QueryRequest) -> Result<QueryOutcome, TagSqlError> {
        self.telemetry.begin(&request.sql, &request.params);
        let started = Instant::now();
        let Self {
            connector,
            config,
            conn,
            telemetry,
        } = self;
        let conn = conn.get_or_insert_with(|| establish_or_die(connector, config));
        let result = executor::run(&*conn, telemetry, &request);
        self.telemetry.finish(started);
        result
    }

    /// Run a single statement: the common entry point.
    ///
    /// # Errors
    ///
    /// See [`SqlSession::query`].
    pub fn run(
        &mut self,
        sql: impl Into<String>,
        params: ParamDescriptor,
    ) -> Result<QueryOutcome, TagSqlError> {
        self.query(QueryRequest::new(sql, params))
    }

    /// Run a repeated insert over row groups sharing one tag string.
    ///
    /// The outcome is [`QueryOutcome::Batch`] with one entry per attempted
    /// row.
    ///
    /// # Errors
    ///
    /// See [`SqlSession::query`].
    pub fn run_multi_insert(
        &mut self,
        sql: impl Into<String>,
        tags: impl Into<String>,
        rows: Vec<Vec<FieldValue>>,
    ) -> Result<QueryOutcome, TagSqlError> {
        self.query(QueryRequest::multi_insert(
            sql,
            ParamDescriptor::rows(tags, rows),
        ))
    }

    /// Diagnostics for the most recent call.
    #[must_use]
    pub fn telemetry(&self) -> &QueryTelemetry {
        &self.telemetry
    }

    #[must_use]
    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Mutable config access; changes apply to the next establishment.
    pub fn config_mut(&mut self) -> &mut DbConfig {
        &mut self.config
    }
}

fn establish_or_die<C: Connector>(connector: &C, config: &DbConfig) -> C::Conn {
    match connector.establish(config) {
        Ok(conn) => {
            debug!(host = %config.host, dbname = %config.dbname, "connection established");
            conn
        }
        Err(e) => panic!("database connection failed: {e}"),
    }
}
