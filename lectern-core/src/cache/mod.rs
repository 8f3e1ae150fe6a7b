//! Cache implementations.

pub mod memory_cache;

pub use memory_cache::{DEFAULT_MAX_ENTRIES, MemoryRouteCache};
