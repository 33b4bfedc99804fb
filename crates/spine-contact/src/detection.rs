//! Node-to-node KD-tree contact detection (spec.md §4.11).

use crate::error::{ContactError, Result};
use kdtree::distance::squared_euclidean;
use kdtree::KdTree;
use nalgebra::Vector3;

/// One contact pair: local index into body A's surface set, local index
/// into body B's surface set, and the gap distance.
#[derive(Debug, Clone, Copy)]
pub struct ContactPair {
    pub index_a: usize,
    pub index_b: usize,
    pub distance: f64,
}

/// For every surface node of A, finds the nearest surface node of B and
/// keeps the pair if `distance < gap_tolerance`.
pub fn detect(
    surface_a: &[Vector3<f64>],
    surface_b: &[Vector3<f64>],
    gap_tolerance: f64,
) -> Result<Vec<ContactPair>> {
    if surface_b.is_empty() {
        return Err(ContactError::EmptySurface { body: "b".to_string() });
    }

    let mut tree: KdTree<f64, usize, [f64; 3]> = KdTree::new(3);
    for (i, p) in surface_b.iter().enumerate() {
        tree.add([p.x, p.y, p.z], i)
            .map_err(|e| ContactError::KdTree(format!("{e:?}")))?;
    }

    let mut pairs = Vec::new();
    for (i, p) in surface_a.iter().enumerate() {
        let nearest = tree
            .nearest(&[p.x, p.y, p.z], 1, &squared_euclidean)
            .map_err(|e| ContactError::KdTree(format!("{e:?}")))?;
        if let Some(&(sq_dist, &j)) = nearest.first() {
            let distance = sq_dist.sqrt();
            if distance < gap_tolerance {
                pairs.push(ContactPair { index_a: i, index_b: j, distance });
            }
        }
    }
    if pairs.is_empty() && !surface_a.is_empty() {
        log::warn!("contact detection found no pairs within gap_tolerance={gap_tolerance}; surfaces may not be close enough to interact");
    }
    Ok(pairs)
}

/// Outer-shell auto-default surface subset: nodes that are extremal along
/// any axis (spec.md §4.11 "Auto parameters").
pub fn auto_surface_subset(positions: &[Vector3<f64>]) -> Vec<usize> {
    if positions.is_empty() {
        return Vec::new();
    }
    let mut min = positions[0];
    let mut max = positions[0];
    for p in positions {
        for d in 0..3 {
            min[d] = min[d].min(p[d]);
            max[d] = max[d].max(p[d]);
        }
    }
    let tol = 1e-9 * (max - min).norm().max(1.0);
    positions
        .iter()
        .enumerate()
        .filter(|(_, p)| {
            (0..3).any(|d| (p[d] - min[d]).abs() < tol || (p[d] - max[d]).abs() < tol)
        })
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_coincident_pair_within_tolerance() {
        let a = vec![Vector3::new(0.0, 0.0, 0.0)];
        let b = vec![Vector3::new(0.0, 0.0, 0.05), Vector3::new(5.0, 0.0, 0.0)];
        let pairs = detect(&a, &b, 0.1).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].index_b, 0);
    }

    #[test]
    fn rejects_pairs_beyond_gap_tolerance() {
        let a = vec![Vector3::new(0.0, 0.0, 0.0)];
        let b = vec![Vector3::new(1.0, 0.0, 0.0)];
        let pairs = detect(&a, &b, 0.1).unwrap();
        assert!(pairs.is_empty());
    }
}
