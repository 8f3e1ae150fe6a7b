//! Text and vector utilities shared across crates.

pub mod similarity;
pub mod text;

pub use similarity::{cosine_similarity, dot_product, magnitude};
pub use text::{jaccard_similarity, tokenize};
