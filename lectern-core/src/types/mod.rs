//! Core data types for Lectern.

pub mod grounding;
pub mod hierarchy;
pub mod material;
pub mod retrieval;
pub mod routing;

pub use grounding::*;
pub use hierarchy::*;
pub use material::*;
pub use retrieval::*;
pub use routing::*;
