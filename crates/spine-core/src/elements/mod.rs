//! Element catalog (spec.md §3 `ElementType`).
//!
//! Scoped to the four isoparametric families the rest of the workspace
//! actually drives: linear triangle/quad (2-D, optionally plane-strain) and
//! linear tetrahedron/hexahedron (3-D). Quadratic variants (TET10, HEX20)
//! named in the distilled catalog are not carried: nothing in spec.md's
//! component design exercises them and the teacher's own `elements/solid10.rs`
//! / `elements/solid20.rs` were left behind in the trim for the same reason.

pub mod hex8;
pub mod quad4;
pub mod tet4;
pub mod tri3;

use nalgebra::{DMatrix, Vector3};

/// One Gauss point: parametric coordinates plus quadrature weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussPoint {
    pub xi: f64,
    pub eta: f64,
    pub zeta: f64,
    pub weight: f64,
}

impl GaussPoint {
    pub const fn new(xi: f64, eta: f64, zeta: f64, weight: f64) -> Self {
        Self { xi, eta, zeta, weight }
    }
}

/// Tag over the element families this workspace supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Tri3 { plane_strain: bool },
    Quad4 { plane_strain: bool },
    Tet4,
    Hex8,
}

impl ElementType {
    pub const fn n_nodes(self) -> usize {
        match self {
            ElementType::Tri3 { .. } => 3,
            ElementType::Quad4 { .. } => 4,
            ElementType::Tet4 => 4,
            ElementType::Hex8 => 8,
        }
    }

    pub const fn dim(self) -> usize {
        match self {
            ElementType::Tri3 { .. } | ElementType::Quad4 { .. } => 2,
            ElementType::Tet4 | ElementType::Hex8 => 3,
        }
    }

    pub const fn n_gauss(self) -> usize {
        match self {
            ElementType::Tri3 { .. } => 1,
            ElementType::Quad4 { .. } => 4,
            ElementType::Tet4 => 1,
            ElementType::Hex8 => 8,
        }
    }

    pub const fn n_face_nodes(self) -> usize {
        match self {
            ElementType::Tri3 { .. } | ElementType::Quad4 { .. } => 2,
            ElementType::Tet4 => 3,
            ElementType::Hex8 => 4,
        }
    }

    pub const fn is_plane_strain(self) -> bool {
        matches!(
            self,
            ElementType::Tri3 { plane_strain: true } | ElementType::Quad4 { plane_strain: true }
        )
    }

    pub fn gauss_points(self) -> Vec<GaussPoint> {
        match self {
            ElementType::Tri3 { .. } => tri3::gauss_points(),
            ElementType::Quad4 { .. } => quad4::gauss_points(),
            ElementType::Tet4 => tet4::gauss_points(),
            ElementType::Hex8 => hex8::gauss_points(),
        }
    }

    /// Shape function values at a parametric point, length `n_nodes()`.
    pub fn shape_functions(self, gp: GaussPoint) -> Vec<f64> {
        match self {
            ElementType::Tri3 { .. } => tri3::shape_functions(gp),
            ElementType::Quad4 { .. } => quad4::shape_functions(gp),
            ElementType::Tet4 => tet4::shape_functions(gp),
            ElementType::Hex8 => hex8::shape_functions(gp),
        }
    }

    /// Shape function parametric derivatives, rows = nodes, cols = `dim()`.
    pub fn shape_derivatives_param(self, gp: GaussPoint) -> DMatrix<f64> {
        match self {
            ElementType::Tri3 { .. } => tri3::shape_derivatives_param(gp),
            ElementType::Quad4 { .. } => quad4::shape_derivatives_param(gp),
            ElementType::Tet4 => tet4::shape_derivatives_param(gp),
            ElementType::Hex8 => hex8::shape_derivatives_param(gp),
        }
    }
}

/// Jacobian `dX/dxi` evaluated from nodal reference coordinates and the
/// parametric shape derivatives; returns `(J, det J, dN/dX)`.
pub fn jacobian(
    element: ElementType,
    node_coords: &[Vector3<f64>],
    dn_dxi: &DMatrix<f64>,
) -> (DMatrix<f64>, f64, DMatrix<f64>) {
    let dim = element.dim();
    let mut j = DMatrix::<f64>::zeros(dim, dim);
    for a in 0..element.n_nodes() {
        let x = node_coords[a];
        for i in 0..dim {
            for k in 0..dim {
                j[(i, k)] += x[i] * dn_dxi[(a, k)];
            }
        }
    }
    let det_j = j.clone().determinant();
    let j_inv = j.clone().try_inverse().unwrap_or_else(|| DMatrix::zeros(dim, dim));
    let dn_dx = dn_dxi * j_inv.transpose();
    (j, det_j, dn_dx)
}

/// Strain-displacement matrix `B` in Voigt notation for small-strain /
/// geometrically-linear use; `dn_dx` has one row per node, `dim()` columns.
pub fn strain_displacement_matrix(element: ElementType, dn_dx: &DMatrix<f64>) -> DMatrix<f64> {
    match element.dim() {
        2 => {
            let n = element.n_nodes();
            let mut b = DMatrix::<f64>::zeros(3, 2 * n);
            for a in 0..n {
                let (dndx, dndy) = (dn_dx[(a, 0)], dn_dx[(a, 1)]);
                b[(0, 2 * a)] = dndx;
                b[(1, 2 * a + 1)] = dndy;
                b[(2, 2 * a)] = dndy;
                b[(2, 2 * a + 1)] = dndx;
            }
            b
        }
        3 => {
            let n = element.n_nodes();
            let mut b = DMatrix::<f64>::zeros(6, 3 * n);
            for a in 0..n {
                let (dndx, dndy, dndz) = (dn_dx[(a, 0)], dn_dx[(a, 1)], dn_dx[(a, 2)]);
                b[(0, 3 * a)] = dndx;
                b[(1, 3 * a + 1)] = dndy;
                b[(2, 3 * a + 2)] = dndz;
                b[(3, 3 * a)] = dndy;
                b[(3, 3 * a + 1)] = dndx;
                b[(4, 3 * a + 1)] = dndz;
                b[(4, 3 * a + 2)] = dndy;
                b[(5, 3 * a)] = dndz;
                b[(5, 3 * a + 2)] = dndx;
            }
            b
        }
        _ => unreachable!("elements are only 2-D or 3-D"),
    }
}
