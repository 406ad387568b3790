use super::labels::resolve_labels;
use super::result_set::ResultSet;
use crate::driver::{DriverError, StatementHandle};
use crate::error::TagSqlError;
use crate::sanitize::strip_slashes;
use crate::types::FieldValue;

/// Copy the pending result out of a statement handle.
///
/// Every row is an owned copy, so the result set stays valid after the
/// handle is released. Text cells are un-escaped exactly once here, the
/// inverse of the escape applied when the value went in. A cursor with zero
/// rows materializes as an empty set with resolved labels, not an error;
/// any driver failure discards the partial rows by propagating out.
pub(crate) fn materialize<S: StatementHandle>(stmt: &mut S) -> Result<ResultSet, TagSqlError> {
    let raw_labels = stmt.describe_columns().map_err(TagSqlError::BindResult)?;
    let labels = resolve_labels(&raw_labels)?;
    let mut result_set = ResultSet::new(labels);

    while let Some(values) = stmt.fetch_next().map_err(TagSqlError::BindResult)? {
        if values.len() != result_set.width() {
            return Err(TagSqlError::BindResult(DriverError::new(
                0,
                format!(
                    "driver returned {} values for {} columns",
                    values.len(),
                    result_set.width()
                ),
            )));
        }
        let unescaped = values
            .into_iter()
            .map(|value| match value {
                FieldValue::Text(s) => FieldValue::Text(strip_slashes(&s)),
                other => other,
            })
            .collect();
        result_set.add_values(unescaped);
    }

    Ok(result_set)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hand-wound statement handle: canned labels and rows, optional
    /// injected failures.
    struct CannedStatement {
        labels: Vec<String>,
        rows: Vec<Vec<FieldValue>>,
        cursor: usize,
        fail_describe: bool,
        fail_fetch_at: Option<usize>,
    }

    impl CannedStatement {
        fn new(labels: &[&str], rows: Vec<Vec<FieldValue>>) -> Self {
            Self {
                labels: labels.iter().map(|s| (*s).to_string()).collect(),
                rows,
                cursor: 0,
                fail_describe: false,
                fail_fetch_at: None,
            }
        }
    }

    impl StatementHandle for CannedStatement {
        fn expected_param_count(&self) -> usize {
            0
        }
        fn bind(&mut self, _values: &[FieldValue]) -> Result<(), DriverError> {
            Ok(())
        }
        fn execute(&mut self) -> Result<(), DriverError> {
            Ok(())
        }
        fn affected_rows(&self) -> u64 {
            0
        }
        fn last_insert_id(&self) -> u64 {
            0
        }
        fn describe_columns(&self) -> Result<Vec<String>, DriverError> {
            if self.fail_describe {
                return Err(DriverError::new(2014, "metadata unavailable"));
            }
            Ok(self.labels.clone())
        }
        fn fetch_next(&mut self) -> Result<Option<Vec<FieldValue>>, DriverError> {
            if self.fail_fetch_at == Some(self.cursor) {
                return Err(DriverError::new(2013, "lost mid-fetch"));
            }
            let row = self.rows.get(self.cursor).cloned();
            self.cursor += 1;
            Ok(row)
        }
    }

    #[test]
    fn copies_rows_and_unescapes_text() {
        let mut stmt = CannedStatement::new(
            &["id", "note"],
            vec![
                vec![FieldValue::Int(1), FieldValue::Text("O\\'Brien".into())],
                vec![FieldValue::Int(2), FieldValue::Null],
            ],
        );
        let rs = materialize(&mut stmt).unwrap();
        assert_eq!(rs.len(), 2);
        assert_eq!(
            rs.rows()[0].get("note"),
            Some(&FieldValue::Text("O'Brien".into()))
        );
    }

    #[test]
    fn duplicate_labels_rename_in_the_mapping() {
        let mut stmt = CannedStatement::new(
            &["id", "name", "id"],
            vec![vec![
                FieldValue::Int(1),
                FieldValue::Text("a".into()),
                FieldValue::Int(9),
            ]],
        );
        let rs = materialize(&mut stmt).unwrap();
        assert_eq!(rs.labels(), &["id", "name", "id_2"]);
        assert_eq!(rs.rows()[0].get("id_2"), Some(&FieldValue::Int(9)));
    }

    #[test]
    fn zero_rows_is_an_empty_set_not_an_error() {
        let mut stmt = CannedStatement::new(&["a"], Vec::new());
        let rs = materialize(&mut stmt).unwrap();
        assert!(rs.is_empty());
        assert_eq!(rs.labels(), &["a"]);
    }

    #[test]
    fn describe_failure_maps_to_bind_result() {
        let mut stmt = CannedStatement::new(&["a"], Vec::new());
        stmt.fail_describe = true;
        let err = materialize(&mut stmt).unwrap_err();
        assert!(matches!(err, TagSqlError::BindResult(_)));
    }

    #[test]
    fn fetch_failure_discards_partial_rows() {
        let mut stmt = CannedStatement::new(
            &["a"],
            vec![vec![FieldValue::Int(1)], vec![FieldValue::Int(2)]],
        );
        stmt.fail_fetch_at = Some(1);
        let err = materialize(&mut stmt).unwrap_err();
        assert!(matches!(err, TagSqlError::BindResult(_)));
    }

    #[test]
    fn short_row_from_driver_is_rejected() {
        let mut stmt = CannedStatement::new(&["a", "b"], vec![vec![FieldValue::Int(1)]]);
        let err = materialize(&mut stmt).unwrap_err();
        assert!(matches!(err, TagSqlError::BindResult(_)));
    }
}
