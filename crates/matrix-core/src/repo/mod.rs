pub mod types;
pub use types::{InMemoryTupleRepository, StageSlot, TupleInstance, TupleRepository};
