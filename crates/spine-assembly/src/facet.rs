//! Facet-joint detection: a projection prefilter followed by the same
//! KD-tree node-to-node matcher `spine_contact` uses for generic contact
//! (spec.md §4.15 step 5, §6). Facet surfaces articulate along roughly one
//! anatomical axis, so candidates are first narrowed to the band around
//! that axis before paying for the full 3-D tree query.

use crate::error::Result;
use nalgebra::{Unit, Vector3};
use spine_contact::{detect, ContactPair};

/// Matches `surface_a` against `surface_b` restricted to the axis band
/// `[min(surface_a) - max_axis_offset, max(surface_a) + max_axis_offset]`
/// along `axis`, then runs the standard gap-tolerance KD-tree match.
/// Index fields on the returned pairs are already remapped back to
/// `surface_b`'s original indices.
pub fn detect_facet_joints(
    surface_a: &[Vector3<f64>],
    surface_b: &[Vector3<f64>],
    axis: Unit<Vector3<f64>>,
    max_axis_offset: f64,
    gap_tolerance: f64,
) -> Result<Vec<ContactPair>> {
    if surface_a.is_empty() || surface_b.is_empty() {
        return Ok(Vec::new());
    }

    let axis_coord = |p: &Vector3<f64>| p.dot(&axis);
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in surface_a {
        let c = axis_coord(p);
        lo = lo.min(c);
        hi = hi.max(c);
    }
    lo -= max_axis_offset;
    hi += max_axis_offset;

    let mut b_indices = Vec::new();
    let mut b_filtered = Vec::new();
    for (idx, p) in surface_b.iter().enumerate() {
        let c = axis_coord(p);
        if c >= lo && c <= hi {
            b_indices.push(idx);
            b_filtered.push(*p);
        }
    }
    if b_filtered.is_empty() {
        return Ok(Vec::new());
    }

    let pairs = detect(surface_a, &b_filtered, gap_tolerance)?;
    Ok(pairs
        .into_iter()
        .map(|p| ContactPair { index_a: p.index_a, index_b: b_indices[p.index_b], distance: p.distance })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facets_outside_the_axis_band_are_never_matched() {
        let axis = Unit::new_normalize(Vector3::new(0.0, 1.0, 0.0));
        let surface_a = vec![Vector3::new(0.0, 0.0, 0.0)];
        let surface_b = vec![Vector3::new(0.0, 0.0, 0.001), Vector3::new(0.0, 10.0, 0.0)];
        let pairs = detect_facet_joints(&surface_a, &surface_b, axis, 0.1, 0.01).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].index_b, 0);
    }

    #[test]
    fn empty_surfaces_produce_no_pairs() {
        let axis = Unit::new_normalize(Vector3::new(0.0, 1.0, 0.0));
        let pairs = detect_facet_joints(&[], &[Vector3::new(0.0, 0.0, 0.0)], axis, 0.1, 0.01).unwrap();
        assert!(pairs.is_empty());
    }
}
