pub mod memory_store;
pub mod pg_store;

pub use memory_store::*;
pub use pg_store::*;
