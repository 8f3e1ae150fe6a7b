//! Core traits for Lectern.
//!
//! Every collaborator the engine talks to sits behind one of these traits so
//! it can be injected at construction time and replaced in tests.

pub mod cache;
pub mod completion;
pub mod embedder;
pub mod retriever;
pub mod scorer;
pub mod storage;

pub use cache::*;
pub use completion::*;
pub use embedder::*;
pub use retriever::*;
pub use scorer::*;
pub use storage::*;
