//! Contact definitions and auto-parameter defaults (spec.md §3
//! `ContactDefinition`, §4.11 "Auto parameters").

use nalgebra::Vector3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactMethod {
    Penalty,
    Tied,
}

#[derive(Debug, Clone)]
pub struct ContactDefinition {
    pub body_a: usize,
    pub body_b: usize,
    pub method: ContactMethod,
    pub penalty: f64,
    pub gap_tolerance: f64,
    pub surface_a: Option<Vec<usize>>,
    pub surface_b: Option<Vec<usize>>,
    pub mu_s: f64,
    pub mu_d: f64,
}

impl ContactDefinition {
    /// `penalty = max(E_a, E_b) / min(spacing_a, spacing_b)` when unset.
    pub fn auto_penalty(e_a: f64, e_b: f64, spacing_a: f64, spacing_b: f64) -> f64 {
        e_a.max(e_b) / spacing_a.min(spacing_b)
    }

    /// `gap_tolerance = 1.5 * max(spacing_a, spacing_b)` when unset.
    pub fn auto_gap_tolerance(spacing_a: f64, spacing_b: f64) -> f64 {
        1.5 * spacing_a.max(spacing_b)
    }
}

/// A tied pair's cached reference offset, computed once at scene build time
/// (spec.md §4.11 "Tied contact").
#[derive(Debug, Clone, Copy)]
pub struct TiedPair {
    pub index_a: usize,
    pub index_b: usize,
    pub r0: Vector3<f64>,
}

/// Precomputes tied-pair reference offsets from a one-time detection pass.
pub fn cache_tied_pairs(
    surface_a: &[Vector3<f64>],
    surface_b: &[Vector3<f64>],
    gap_tolerance: f64,
) -> crate::error::Result<Vec<TiedPair>> {
    let pairs = crate::detection::detect(surface_a, surface_b, gap_tolerance)?;
    Ok(pairs
        .into_iter()
        .map(|p| TiedPair {
            index_a: p.index_a,
            index_b: p.index_b,
            r0: surface_a[p.index_a] - surface_b[p.index_b],
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_penalty_uses_stiffer_body_and_finer_spacing() {
        let p = ContactDefinition::auto_penalty(1e9, 1e8, 0.01, 0.02);
        assert_eq!(p, 1e9 / 0.01);
    }

    #[test]
    fn auto_gap_tolerance_uses_coarser_spacing() {
        let g = ContactDefinition::auto_gap_tolerance(0.01, 0.02);
        assert!((g - 0.03).abs() < 1e-12);
    }
}
