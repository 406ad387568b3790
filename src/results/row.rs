use std::collections::HashMap;
use std::sync::Arc;

use crate::types::FieldValue;

/// A single materialized row.
///
/// Labels and the label index are shared across every row of a result set,
/// so a row is one `Vec` of values plus two `Arc` pointers.
#[derive(Debug, Clone)]
pub struct Row {
    /// Resolved column labels for this row (shared across the result set).
    pub labels: Arc<Vec<String>>,
    /// The values for this row, in statement column order.
    pub values: Vec<FieldValue>,
    // Label-to-index map shared across the result set.
    #[doc(hidden)]
    pub(crate) label_index: Arc<HashMap<String, usize>>,
}

impl Row {
    /// Build a standalone row. Rows inside a [`super::ResultSet`] are built
    /// by the set so the index map is shared; this constructor is for rows
    /// assembled by hand, mostly in tests.
    #[must_use]
    pub fn new(labels: Arc<Vec<String>>, values: Vec<FieldValue>) -> Self {
        let label_index = Arc::new(
            labels
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), i))
                .collect::<HashMap<_, _>>(),
        );
        Self {
            labels,
            values,
            label_index,
        }
    }

    /// Get the index of a column by label, falling back to a linear scan
    /// when the label is not in the shared index.
    #[must_use]
    pub fn column_index(&self, label: &str) -> Option<usize> {
        if let Some(&idx) = self.label_index.get(label) {
            return Some(idx);
        }
        self.labels.iter().position(|col| col == label)
    }

    /// Get a value by column label, `None` when the label is unknown.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&FieldValue> {
        let index_opt = self.column_index(label);
        if let Some(idx) = index_opt {
            self.values.get(idx)
        } else {
            None
        }
    }

    /// Get a value by position, `None` when out of bounds.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&FieldValue> {
        self.values.get(index)
    }
}
