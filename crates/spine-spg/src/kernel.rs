//! Cubic B-spline SPH/SPG kernel (spec.md §4.9).
//!
//! Compact support `q = r/h in [0, 1]`, continuous through `q = 1/2`,
//! strictly nonnegative, zero at `q = 1`. Dimensional normalization
//! constants `C_2D = 10/(7*pi)`, `C_3D = 1/pi` per spec.md.

use nalgebra::Vector3;
use std::f64::consts::PI;

pub const C_2D: f64 = 10.0 / (7.0 * PI);
pub const C_3D: f64 = 1.0 / PI;

fn shape(q: f64) -> f64 {
    if q < 0.0 || q > 1.0 {
        0.0
    } else if q <= 0.5 {
        1.0 - 6.0 * q * q + 6.0 * q * q * q
    } else {
        2.0 * (1.0 - q).powi(3)
    }
}

fn dshape_dq(q: f64) -> f64 {
    if q < 0.0 || q > 1.0 {
        0.0
    } else if q <= 0.5 {
        -12.0 * q + 18.0 * q * q
    } else {
        -6.0 * (1.0 - q).powi(2)
    }
}

/// `W(r, h)` for a 2-D (`dim == 2`) or 3-D (`dim == 3`) kernel.
pub fn kernel_value(r: f64, h: f64, dim: usize) -> f64 {
    let q = r / h;
    let c = if dim == 2 { C_2D } else { C_3D };
    let norm = c / h.powi(dim as i32);
    norm * shape(q)
}

/// `grad W = dW/dr * xi/|xi|`, `xi = x_i - x_j` (gradient taken at particle i
/// with respect to particle i's own position, the convention `compute.rs`
/// expects).
pub fn kernel_gradient(xi: Vector3<f64>, h: f64, dim: usize) -> Vector3<f64> {
    let r = xi.norm();
    if r <= 1e-14 || r > h {
        return Vector3::zeros();
    }
    let q = r / h;
    let c = if dim == 2 { C_2D } else { C_3D };
    let norm = c / h.powi(dim as i32);
    let dwdr = norm * dshape_dq(q) / h;
    dwdr * (xi / r)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_is_nonnegative_over_support() {
        let h = 1.0;
        let mut r = 0.0;
        while r <= h {
            assert!(kernel_value(r, h, 3) >= 0.0);
            r += 0.01;
        }
    }

    #[test]
    fn kernel_vanishes_at_support_boundary() {
        assert!(kernel_value(1.0, 1.0, 3).abs() < 1e-12);
    }

    #[test]
    fn kernel_continuous_at_midpoint() {
        let h = 1.0;
        let left = kernel_value(0.5 - 1e-9, h, 3);
        let right = kernel_value(0.5 + 1e-9, h, 3);
        assert!((left - right).abs() < 1e-6);
    }

    #[test]
    fn gradient_vanishes_outside_support() {
        let g = kernel_gradient(Vector3::new(2.0, 0.0, 0.0), 1.0, 3);
        assert_eq!(g, Vector3::zeros());
    }
}
