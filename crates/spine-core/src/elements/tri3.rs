//! Linear 3-node triangle, single centroid Gauss point.

use super::GaussPoint;
use nalgebra::DMatrix;

const CENTROID: f64 = 1.0 / 3.0;

pub fn gauss_points() -> Vec<GaussPoint> {
    vec![GaussPoint::new(CENTROID, CENTROID, 0.0, 0.5)]
}

pub fn shape_functions(gp: GaussPoint) -> Vec<f64> {
    vec![1.0 - gp.xi - gp.eta, gp.xi, gp.eta]
}

pub fn shape_derivatives_param(_gp: GaussPoint) -> DMatrix<f64> {
    DMatrix::from_row_slice(3, 2, &[-1.0, -1.0, 1.0, 0.0, 0.0, 1.0])
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
    fn single_gauss_point_weight_is_reference_area() {
        let pts = gauss_points();
        assert_eq!(pts.len(), 1);
        assert!((pts[0].weight - 0.5).abs() < 1e-12);
    }
}
