//! Exact brute-force index.
//!
//! Suitable for the few hundred documents a course load produces.

use super::{squared_l2, Neighbor, VectorIndex};
use crate::error::{EduError, Result};
use std::cmp::Ordering;

/// Flat L2 index storing vectors contiguously.
pub struct FlatIndex {
    dimensions: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Create an empty index for vectors of `dimensions` components.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            data: Vec::new(),
        }
    }

    fn vector(&self, i: usize) -> &[f32] {
        &self.data[i * self.dimensions..(i + 1) * self.dimensions]
    }

    fn check_dimensions(&self, len: usize) -> Result<()> {
        if len != self.dimensions {
            return Err(EduError::VectorStore(format!(
                "Vector has {} dimensions, index expects {}",
                len, self.dimensions
            )));
        }
        Ok(())
    }
}

impl VectorIndex for FlatIndex {
    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        // Validate first so a bad batch leaves the index untouched
        for v in vectors {
            self.check_dimensions(v.len())?;
        }
        self.data.reserve(vectors.len() * self.dimensions);
        for v in vectors {
            self.data.extend_from_slice(v);
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.check_dimensions(query.len())?;

        let mut hits: Vec<Neighbor> = (0..self.len())
            .map(|index| Neighbor {
                index,
                distance: squared_l2(query, self.vector(index)),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then(a.index.cmp(&b.index))
        });
        hits.truncate(k.min(self.len()));

        Ok(hits)
    }

    fn len(&self) -> usize {
        if self.dimensions == 0 {
            0
        } else {
            self.data.len() / self.dimensions
        }
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(vectors: &[Vec<f32>]) -> FlatIndex {
        let mut index = FlatIndex::new(3);
        index.add(vectors).unwrap();
        index
    }

    #[test]
    fn test_search_orders_by_distance() {
        let index = index_of(&[
            vec![0.0, 0.0, 0.0],
            vec![5.0, 5.0, 5.0],
            vec![1.0, 0.0, 0.0],
        ]);

        let hits = index.search(&[0.9, 0.0, 0.0], 3).unwrap();
        let order: Vec<_> = hits.iter().map(|h| h.index).collect();
        assert_eq!(order, vec![2, 0, 1]);
        assert!(hits[0].distance <= hits[1].distance);
        assert!(hits[1].distance <= hits[2].distance);
        assert!((hits[0].distance - 0.01).abs() < 1e-5);
    }

    #[test]
    fn test_k_is_clamped_to_corpus_size() {
        let index = index_of(&[vec![0.0, 0.0, 1.0], vec![0.0, 1.0, 0.0]]);
        let hits = index.search(&[0.0, 0.0, 0.0], 10).unwrap();
        assert_eq!(hits.len(), 2);

        let empty = FlatIndex::new(3);
        assert!(empty.search(&[0.0, 0.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_each_vector_finds_itself_first() {
        let vectors = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
            vec![1.0, 1.0, 1.0],
        ];
        let index = index_of(&vectors);
        assert_eq!(index.len(), vectors.len());

        for (i, v) in vectors.iter().enumerate() {
            let hits = index.search(v, 1).unwrap();
            assert_eq!(hits[0].index, i);
            assert_eq!(hits[0].distance, 0.0);
        }
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let mut index = index_of(&[vec![1.0, 0.0, 0.0]]);
        assert!(index.add(&[vec![1.0, 2.0, 3.0], vec![1.0]]).is_err());
        // The bad batch was not partially applied
        assert_eq!(index.len(), 1);
        assert!(index.search(&[1.0, 0.0], 1).is_err());
    }
}
