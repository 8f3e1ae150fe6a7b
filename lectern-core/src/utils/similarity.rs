//! Vector similarity helpers.

use crate::{LecternError, Result};

/// Dot product of two vectors of equal length.
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    ensure_same_dimension(a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| x * y).sum())
}

/// Euclidean norm of a vector.
pub fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity in `[-1.0, 1.0]`.
///
/// Returns 0 when either vector has zero magnitude and an error when the
/// vectors differ in length.
///
/// ```rust
/// use lectern_core::utils::similarity::cosine_similarity;
///
/// assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 0.0]).unwrap(), 0.0);
/// assert!(cosine_similarity(&[1.0, 0.0], &[1.0]).is_err());
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    let dot = dot_product(a, b)?;
    let norm_a = magnitude(a);
    let norm_b = magnitude(b);

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

fn ensure_same_dimension(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() == b.len() {
        Ok(())
    } else {
        Err(LecternError::dimension_mismatch(a.len(), b.len()))
    }
}
