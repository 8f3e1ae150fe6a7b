//! Postprocessing applied to retrieved results.

pub mod mmr;

pub use mmr::{DEFAULT_MMR_LAMBDA, MmrDiversifier};
