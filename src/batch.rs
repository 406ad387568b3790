//! Multi-row insert orchestration.
//!
//! One prepared statement, re-bound and re-executed row by row. The batch
//! is not atomic: each row commits on its own, and the outcome vector keeps
//! every per-row result in order so callers can see exactly which rows made
//! it in before a failure.

use tracing::warn;

use crate::coerce;
use crate::descriptor::ParsedDescriptor;
use crate::driver::{ClientConnection, StatementHandle};
use crate::error::TagSqlError;
use crate::types::FieldValue;

/// Run the row groups through an already-prepared insert statement.
///
/// A width mismatch or a driver bind rejection mid-sequence records an
/// inline error entry and leaves the remaining rows unattempted; a driver
/// execute failure records its entry and the batch moves on to the next
/// row. The whole call fails only when the first row cannot pass the same
/// arity gate a single-row call would face.
pub(crate) fn run_batch<C: ClientConnection>(
    conn: &C,
    stmt: &mut C::Statement<'_>,
    parsed: &ParsedDescriptor,
    groups: &[Vec<FieldValue>],
    placeholders: usize,
) -> Result<Vec<Result<u64, TagSqlError>>, TagSqlError> {
    let Some(first) = groups.first() else {
        return Err(TagSqlError::BindArity {
            placeholders,
            params: 0,
            types: parsed.format_count,
        });
    };
    if parsed.format_count != placeholders || first.len() != placeholders {
        return Err(TagSqlError::BindArity {
            placeholders,
            params: first.len(),
            types: parsed.format_count,
        });
    }

    let width = first.len();
    let mut outcomes: Vec<Result<u64, TagSqlError>> = Vec::with_capacity(groups.len());
    for (idx, row) in groups.iter().enumerate() {
        if row.len() != width {
            warn!(row = idx + 1, expected = width, got = row.len(), "batch row width mismatch");
            outcomes.push(Err(TagSqlError::RowWidth {
                row: idx + 1,
                expected: width,
                got: row.len(),
            }));
            break;
        }
        let coerced = coerce::coerce_row(conn, &parsed.type_tags, row);
        if let Err(e) = stmt.bind(&coerced) {
            warn!(row = idx + 1, error = %e, "batch bind rejected");
            outcomes.push(Err(TagSqlError::Bind(e)));
            break;
        }
        match stmt.execute() {
            Ok(()) => outcomes.push(Ok(stmt.last_insert_id())),
            Err(e) => {
                warn!(row = idx + 1, error = %e, "batch row failed to execute");
                outcomes.push(Err(TagSqlError::Execute(e)));
            }
        }
    }
    Ok(outcomes)
}
