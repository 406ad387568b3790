// Result materialization - turns a driver cursor into owned row mappings
//
// Split into sub-modules:
// - row: a single row with label-based access
// - result_set: the ordered row collection with shared labels
// - labels: duplicate-column label resolution
// - materialize: the copy-out loop over a statement handle

pub mod labels;
pub mod materialize;
pub mod result_set;
pub mod row;

pub use result_set::ResultSet;
pub use row::Row;

pub(crate) use materialize::materialize;
