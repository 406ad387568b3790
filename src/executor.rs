//! The statement execution engine.
//!
//! One call here is one statement lifecycle: prepare, arity check, coerce,
//! bind, execute, verb dispatch, release. Arity is checked locally against
//! the prepared statement's placeholder count, so an ill-formed descriptor
//! never reaches the driver's bind or execute machinery.

use tracing::{debug, warn};

use crate::batch;
use crate::coerce;
use crate::descriptor::ParamPayload;
use crate::driver::{ClientConnection, StatementHandle};
use crate::error::TagSqlError;
use crate::results;
use crate::telemetry::QueryTelemetry;
use crate::types::{QueryOutcome, QueryRequest, StatementKind};

pub(crate) fn run<C: ClientConnection>(
    conn: &C,
    telemetry: &mut QueryTelemetry,
    request: &QueryRequest,
) -> Result<QueryOutcome, TagSqlError> {
    let kind = StatementKind::classify(&request.sql);
    debug!(sql = %request.sql, ?kind, "preparing statement");

    let mut stmt = conn.prepare(&request.sql).map_err(|e| {
        warn!(error = %e, "prepare rejected");
        TagSqlError::Prepare(e)
    })?;
    let placeholders = stmt.expected_param_count();
    telemetry.note_param_count(placeholders);

    let result = dispatch(conn, &mut stmt, kind, request, placeholders);
    release(stmt);

    match result {
        Ok(outcome) => {
            telemetry.note_outcome(&outcome);
            Ok(outcome)
        }
        Err(e) => {
            warn!(error = %e, "statement failed");
            Err(e)
        }
    }
}

fn dispatch<C: ClientConnection>(
    conn: &C,
    stmt: &mut C::Statement<'_>,
    kind: StatementKind,
    request: &QueryRequest,
    placeholders: usize,
) -> Result<QueryOutcome, TagSqlError> {
    // No placeholders: execute directly, ignoring any descriptor.
    if placeholders == 0 {
        return execute_classified(stmt, kind);
    }

    let parsed = request.params.parse().ok_or(TagSqlError::BindArity {
        placeholders,
        params: request.params.payload.count(),
        types: 0,
    })?;

    if request.multi_row_insert && kind == StatementKind::Insert {
        let ParamPayload::Rows(groups) = &request.params.payload else {
            return Err(TagSqlError::BindArity {
                placeholders,
                params: parsed.value_count,
                types: parsed.format_count,
            });
        };
        return batch::run_batch(conn, stmt, &parsed, groups, placeholders)
            .map(QueryOutcome::Batch);
    }

    let ParamPayload::Row(values) = &request.params.payload else {
        return Err(TagSqlError::BindArity {
            placeholders,
            params: parsed.value_count,
            types: parsed.format_count,
        });
    };
    if parsed.format_count != placeholders || parsed.value_count != placeholders {
        return Err(TagSqlError::BindArity {
            placeholders,
            params: parsed.value_count,
            types: parsed.format_count,
        });
    }

    let coerced = coerce::coerce_row(conn, &parsed.type_tags, values);
    stmt.bind(&coerced).map_err(TagSqlError::Bind)?;
    execute_classified(stmt, kind)
}

/// Execute a bound statement and shape the outcome by verb.
fn execute_classified<S: StatementHandle>(
    stmt: &mut S,
    kind: StatementKind,
) -> Result<QueryOutcome, TagSqlError> {
    stmt.execute().map_err(TagSqlError::Execute)?;
    match kind {
        StatementKind::Insert => Ok(QueryOutcome::InsertId(stmt.last_insert_id())),
        StatementKind::Update | StatementKind::Delete => {
            Ok(QueryOutcome::Affected(stmt.affected_rows()))
        }
        StatementKind::Select | StatementKind::Show => {
            Ok(QueryOutcome::Rows(results::materialize(stmt)?))
        }
        StatementKind::Other => Ok(QueryOutcome::Done),
    }
}

fn release<S: StatementHandle>(stmt: S) {
    if let Err(e) = stmt.close() {
        debug!(error = %e, "statement close reported an error");
    }
}
