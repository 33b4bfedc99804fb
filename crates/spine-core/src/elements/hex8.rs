//! Trilinear 8-node hexahedron (CalculiX C3D8 node ordering), 2x2x2 Gauss rule.

use super::GaussPoint;
use nalgebra::DMatrix;

const GP_1D: f64 = 0.577_350_269_189_625_8; // 1/sqrt(3)

/// Natural (xi, eta, zeta) signs for the 8 corner nodes, CalculiX ordering.
const NODE_SIGNS: [(f64, f64, f64); 8] = [
    (-1.0, -1.0, -1.0),
    (1.0, -1.0, -1.0),
    (1.0, 1.0, -1.0),
    (-1.0, 1.0, -1.0),
    (-1.0, -1.0, 1.0),
    (1.0, -1.0, 1.0),
    (1.0, 1.0, 1.0),
    (-1.0, 1.0, 1.0),
];

pub fn gauss_points() -> Vec<GaussPoint> {
    let mut pts = Vec::with_capacity(8);
    for &sz in &[-GP_1D, GP_1D] {
        for &sy in &[-GP_1D, GP_1D] {
            for &sx in &[-GP_1D, GP_1D] {
                pts.push(GaussPoint::new(sx, sy, sz, 1.0));
            }
        }
    }
    pts
}

pub fn shape_functions(gp: GaussPoint) -> Vec<f64> {
    NODE_SIGNS
        .iter()
        .map(|&(xi_a, eta_a, zeta_a)| {
            0.125 * (1.0 + xi_a * gp.xi) * (1.0 + eta_a * gp.eta) * (1.0 + zeta_a * gp.zeta)
        })
        .collect()
}

pub fn shape_derivatives_param(gp: GaussPoint) -> DMatrix<f64> {
    let mut dn = DMatrix::<f64>::zeros(8, 3);
    for (a, &(xi_a, eta_a, zeta_a)) in NODE_SIGNS.iter().enumerate() {
        dn[(a, 0)] = 0.125 * xi_a * (1.0 + eta_a * gp.eta) * (1.0 + zeta_a * gp.zeta);
        dn[(a, 1)] = 0.125 * eta_a * (1.0 + xi_a * gp.xi) * (1.0 + zeta_a * gp.zeta);
        dn[(a, 2)] = 0.125 * zeta_a * (1.0 + xi_a * gp.xi) * (1.0 + eta_a * gp.eta);
    }
    dn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_functions_partition_unity() {
        for gp in gauss_points() {
            let n = shape_functions(gp);
            let sum: f64 = n.iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn eight_gauss_points_unit_weight() {
        let pts = gauss_points();
        assert_eq!(pts.len(), 8);
        assert!(pts.iter().all(|p| (p.weight - 1.0).abs() < 1e-12));
    }
}
