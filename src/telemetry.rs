use std::time::Instant;

use crate::descriptor::ParamDescriptor;
use crate::types::QueryOutcome;

/// Diagnostics about the most recent call on a session.
///
/// Reset and repopulated on every dispatch, success or failure, so a
/// failed call leaves its own trace rather than the previous call's. Held
/// per session and mutated in place; sessions are single-threaded, and so
/// is this record.
#[derive(Debug, Clone, Default)]
pub struct QueryTelemetry {
    /// SQL template of the most recent call.
    pub last_sql: String,
    /// Parameter descriptor of the most recent call, as supplied.
    pub last_params: Option<ParamDescriptor>,
    /// Wall-clock duration of the most recent call, in microseconds.
    pub last_duration_micros: u64,
    /// Rows touched, when the call was an update/delete.
    pub last_affected_rows: u64,
    /// Generated id, when the call was an insert (last committed row for a
    /// batch).
    pub last_insert_id: u64,
    /// Rows materialized, when the call was a select/show.
    pub last_row_count: usize,
    /// Placeholder count reported by the prepared statement.
    pub last_param_count: usize,
}

impl QueryTelemetry {
    pub(crate) fn begin(&mut self, sql: &str, params: &ParamDescriptor) {
        *self = Self {
            last_sql: sql.to_string(),
            last_params: Some(params.clone()),
            ..Self::default()
        };
    }

    pub(crate) fn note_param_count(&mut self, count: usize) {
        self.last_param_count = count;
    }

    pub(crate) fn note_outcome(&mut self, outcome: &QueryOutcome) {
        match outcome {
            QueryOutcome::Rows(rs) => self.last_row_count = rs.len(),
            QueryOutcome::Affected(n) => self.last_affected_rows = *n,
            QueryOutcome::InsertId(id) => self.last_insert_id = *id,
            QueryOutcome::Batch(entries) => {
                for entry in entries {
                    if let Ok(id) = entry {
                        self.last_insert_id = *id;
                    }
                }
            }
            QueryOutcome::Done => {}
        }
    }

    pub(crate) fn finish(&mut self, started: Instant) {
        self.last_duration_micros =
            u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    }
}
