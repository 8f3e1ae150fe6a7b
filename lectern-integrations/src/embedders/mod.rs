//! Embedder implementations.

pub mod hashing;

pub use hashing::{DEFAULT_HASHING_DIMENSION, HashingEmbedder};
