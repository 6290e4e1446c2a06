//! Vector index abstraction for EduAI.
//!
//! Positions in an index are the insertion order of the vectors, which is how
//! search hits map back to documents.

mod flat;

pub use flat::FlatIndex;

use crate::error::Result;

/// A search hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Insertion position of the matched vector.
    pub index: usize,
    /// Squared Euclidean distance to the query (lower is closer).
    pub distance: f32,
}

/// Trait for k-nearest-neighbor indexes.
pub trait VectorIndex: Send + Sync {
    /// Append vectors; they take the next positions in order.
    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()>;

    /// The `k` nearest vectors in ascending distance order.
    ///
    /// `k` larger than the index returns every vector.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;

    /// Number of stored vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimension every stored vector has.
    fn dimensions(&self) -> usize;
}

/// Squared Euclidean distance between two equal-length vectors.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squared_l2() {
        assert_eq!(squared_l2(&[1.0, 2.0], &[1.0, 2.0]), 0.0);
        assert!((squared_l2(&[0.0, 0.0], &[3.0, 4.0]) - 25.0).abs() < 1e-6);
    }
}
