// In-memory driver for tests and benches. Enabled with the `test-utils` feature.

pub mod memory;

pub use memory::{FailurePoint, MemoryConnection, MemoryConnector, MemoryStatement};
