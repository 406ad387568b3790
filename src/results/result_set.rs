use std::collections::HashMap;
use std::sync::Arc;

use super::row::Row;
use crate::types::FieldValue;

/// An ordered collection of materialized rows.
///
/// Labels are resolved once (duplicates already renamed) and shared with
/// every row through an `Arc`, along with a label-to-index map built a
/// single time here rather than per row.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    rows: Vec<Row>,
    labels: Arc<Vec<String>>,
    label_index: Arc<HashMap<String, usize>>,
}

impl ResultSet {
    /// Create an empty result set over the given resolved labels.
    #[must_use]
    pub fn new(labels: Vec<String>) -> Self {
        let label_index = Arc::new(
            labels
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), i))
                .collect::<HashMap<_, _>>(),
        );
        Self {
            rows: Vec::new(),
            labels: Arc::new(labels),
            label_index,
        }
    }

    /// Append a row. The value count must match the label count; the
    /// materializer checks that before calling.
    pub fn add_values(&mut self, values: Vec<FieldValue>) {
        self.rows.push(Row {
            labels: Arc::clone(&self.labels),
            values,
            label_index: Arc::clone(&self.label_index),
        });
    }

    /// Resolved column labels, in statement order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Column count.
    #[must_use]
    pub fn width(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
