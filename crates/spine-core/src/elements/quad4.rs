//! Bilinear 4-node quadrilateral, 2x2 Gauss rule.

use super::GaussPoint;
use nalgebra::DMatrix;

const GP_1D: f64 = 0.577_350_269_189_625_8; // 1/sqrt(3)

const NODE_SIGNS: [(f64, f64); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

pub fn gauss_points() -> Vec<GaussPoint> {
    let mut pts = Vec::with_capacity(4);
    for &sy in &[-GP_1D, GP_1D] {
        for &sx in &[-GP_1D, GP_1D] {
            pts.push(GaussPoint::new(sx, sy, 0.0, 1.0));
        }
    }
    pts
}

pub fn shape_functions(gp: GaussPoint) -> Vec<f64> {
    NODE_SIGNS
        .iter()
        .map(|&(xi_a, eta_a)| 0.25 * (1.0 + xi_a * gp.xi) * (1.0 + eta_a * gp.eta))
        .collect()
}

pub fn shape_derivatives_param(gp: GaussPoint) -> DMatrix<f64> {
    let mut dn = DMatrix::<f64>::zeros(4, 2);
    for (a, &(xi_a, eta_a)) in NODE_SIGNS.iter().enumerate() {
        dn[(a, 0)] = 0.25 * xi_a * (1.0 + eta_a * gp.eta);
        dn[(a, 1)] = 0.25 * eta_a * (1.0 + xi_a * gp.xi);
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
    fn four_gauss_points_unit_weight() {
        let pts = gauss_points();
        assert_eq!(pts.len(), 4);
        assert!(pts.iter().all(|p| (p.weight - 1.0).abs() < 1e-12));
    }
}
