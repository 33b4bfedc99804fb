//! Linear 4-node tetrahedron, single interior Gauss point (exact for
//! constant-strain fields).

use super::GaussPoint;
use nalgebra::DMatrix;

const BARY: f64 = 0.25;

pub fn gauss_points() -> Vec<GaussPoint> {
    vec![GaussPoint::new(BARY, BARY, BARY, 1.0 / 6.0)]
}

/// Shape functions in the barycentric parameterization `N0 = 1-xi-eta-zeta`.
pub fn shape_functions(gp: GaussPoint) -> Vec<f64> {
    vec![1.0 - gp.xi - gp.eta - gp.zeta, gp.xi, gp.eta, gp.zeta]
}

pub fn shape_derivatives_param(_gp: GaussPoint) -> DMatrix<f64> {
    // Constant for a linear tetrahedron.
    DMatrix::from_row_slice(
        4,
        3,
        &[
            -1.0, -1.0, -1.0,
            1.0, 0.0, 0.0,
            0.0, 1.0, 0.0,
            0.0, 0.0, 1.0,
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_functions_partition_unity() {
        let n = shape_functions(gauss_points()[0]);
        let sum: f64 = n.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn single_gauss_point_weight_is_reference_volume() {
        let pts = gauss_points();
        assert_eq!(pts.len(), 1);
        assert!((pts[0].weight - 1.0 / 6.0).abs() < 1e-12);
    }
}
