//! Mesh and per-Gauss-point field storage (spec.md §3 `Mesh`, §4.1).

use crate::elements::{self, ElementType};
use crate::error::ValidationError;
use nalgebra::{DMatrix, Matrix3, Vector3};

/// One Gauss point's worth of kinematic/stress state, laid out
/// `element_id * n_gauss + local_gp_id` inside the mesh's flat arrays.
#[derive(Debug, Clone)]
pub struct GaussField {
    /// Deformation gradient F, updated every residual evaluation.
    pub f: Matrix3<f64>,
    /// Cauchy stress (Voigt-packed by the caller where needed).
    pub sigma: Matrix3<f64>,
    /// Small strain tensor (only meaningful for linear materials).
    pub eps: Matrix3<f64>,
    /// `w * |det J|` evaluated once in the reference configuration.
    pub integration_weight: f64,
    /// `dN/dX`, rows = element nodes, cols = `dim`; fixed at construction.
    pub dn_dx: DMatrix<f64>,
}

impl GaussField {
    fn new_reference(dn_dx: DMatrix<f64>, integration_weight: f64) -> Self {
        Self {
            f: Matrix3::identity(),
            sigma: Matrix3::zeros(),
            eps: Matrix3::zeros(),
            integration_weight,
            dn_dx,
        }
    }
}

/// Owns the nodal and Gauss-point arrays for a single-element-type body
/// (spec.md §3 `Mesh`, §1 Non-goal: no mixed element types in one body).
pub struct Mesh {
    pub element_type: ElementType,
    pub n_nodes: usize,
    pub n_elements: usize,

    /// Reference configuration, one entry per node.
    pub x_ref: Vec<Vector3<f64>>,
    /// Current configuration `x = X + u`.
    pub x_cur: Vec<Vector3<f64>>,
    /// Nodal displacement.
    pub u: Vec<Vector3<f64>>,
    /// Internal force, sign convention `f = -int(B^T sigma dV)`.
    pub f_int: Vec<Vector3<f64>>,
    /// External force (user loads + injected contact forces).
    pub f_ext: Vec<Vector3<f64>>,

    /// `fixed[node][dof]` — true where a Dirichlet BC is applied.
    pub fixed: Vec<[bool; 3]>,
    /// Prescribed displacement value, meaningful only where `fixed` is set.
    pub prescribed: Vec<[f64; 3]>,

    /// Element connectivity, `n_elements` rows of `element_type.n_nodes()`.
    pub connectivity: Vec<Vec<usize>>,
    /// Per-element material id, indexes into a `MaterialLibrary`.
    pub material_id: Vec<usize>,
    /// Reference configuration volume/area of each element.
    pub reference_volume: Vec<f64>,

    /// Flat `n_elements * n_gauss` array of Gauss-point state.
    pub gauss: Vec<GaussField>,
}

impl Mesh {
    /// Builds a mesh and pre-computes reference-configuration shape
    /// derivatives and integration weights once (spec.md §4.1).
    pub fn new(
        element_type: ElementType,
        nodes: Vec<Vector3<f64>>,
        connectivity: Vec<Vec<usize>>,
        material_ids: Option<Vec<usize>>,
    ) -> Result<Self, ValidationError> {
        let n_nodes = nodes.len();
        let n_elements = connectivity.len();
        let npe = element_type.n_nodes();

        for (e, conn) in connectivity.iter().enumerate() {
            if conn.len() != npe {
                return Err(ValidationError::new(
                    "connectivity",
                    conn.len() as f64,
                    format!("element {e} has {} nodes, expected {npe}", conn.len()),
                ));
            }
            for &idx in conn {
                if idx >= n_nodes {
                    return Err(ValidationError::new(
                        "connectivity",
                        idx as f64,
                        format!("element {e} references out-of-range node {idx}"),
                    ));
                }
            }
        }

        let material_id = material_ids.unwrap_or_else(|| vec![0; n_elements]);
        if material_id.len() != n_elements {
            return Err(ValidationError::new(
                "material_ids",
                material_id.len() as f64,
                format!("expected one material id per element ({n_elements})"),
            ));
        }

        let n_gauss = element_type.n_gauss();
        let gauss_points = element_type.gauss_points();
        let mut gauss = Vec::with_capacity(n_elements * n_gauss);
        let mut reference_volume = vec![0.0; n_elements];

        for (e, conn) in connectivity.iter().enumerate() {
            let elem_nodes: Vec<Vector3<f64>> = conn.iter().map(|&i| nodes[i]).collect();
            let mut vol = 0.0;
            for gp in &gauss_points {
                let dn_dxi = element_type.shape_derivatives_param(*gp);
                let (_, det_j, dn_dx) = elements::jacobian(element_type, &elem_nodes, &dn_dxi);
                let weight = gp.weight * det_j.abs();
                vol += weight;
                gauss.push(GaussField::new_reference(dn_dx, weight));
            }
            reference_volume[e] = vol;
        }

        Ok(Self {
            element_type,
            n_nodes,
            n_elements,
            x_cur: nodes.clone(),
            x_ref: nodes,
            u: vec![Vector3::zeros(); n_nodes],
            f_int: vec![Vector3::zeros(); n_nodes],
            f_ext: vec![Vector3::zeros(); n_nodes],
            fixed: vec![[false; 3]; n_nodes],
            prescribed: vec![[0.0; 3]; n_nodes],
            connectivity,
            material_id,
            reference_volume,
            gauss,
        })
    }

    pub fn n_gauss_total(&self) -> usize {
        self.n_elements * self.element_type.n_gauss()
    }

    /// `x = X + u`.
    pub fn update_current_config(&mut self) {
        for i in 0..self.n_nodes {
            self.x_cur[i] = self.x_ref[i] + self.u[i];
        }
    }

    /// `F = I + sum_a u_a (dN_a/dX)` at every Gauss point.
    pub fn compute_deformation_gradient(&mut self) {
        let n_gauss = self.element_type.n_gauss();
        let dim = self.element_type.dim();
        for (e, conn) in self.connectivity.iter().enumerate() {
            for g in 0..n_gauss {
                let field = &mut self.gauss[e * n_gauss + g];
                let mut f = Matrix3::identity();
                for (a, &node) in conn.iter().enumerate() {
                    let ua = self.u[node];
                    for i in 0..dim {
                        for k in 0..dim {
                            f[(i, k)] += ua[i] * field.dn_dx[(a, k)];
                        }
                    }
                }
                field.f = f;
            }
        }
    }

    /// Overwrites `u[i,d]` with the prescribed value where `fixed[i,d]`.
    pub fn apply_boundary_conditions(&mut self) {
        for i in 0..self.n_nodes {
            for d in 0..3 {
                if self.fixed[i][d] {
                    self.u[i][d] = self.prescribed[i][d];
                }
            }
        }
    }

    /// Marks every DOF of `node` fixed at its current displacement value
    /// (or an explicit prescribed value when provided).
    pub fn fix_node(&mut self, node: usize, value: Option<[f64; 3]>) {
        self.fixed[node] = [true; 3];
        if let Some(v) = value {
            self.prescribed[node] = v;
        }
    }

    /// Marks a DOF subset of `node` fixed (roller/symmetry support).
    pub fn fix_dofs(&mut self, node: usize, dofs: &[usize], value: f64) {
        for &d in dofs {
            self.fixed[node][d] = true;
            self.prescribed[node][d] = value;
        }
    }

    pub fn total_dofs(&self) -> usize {
        self.n_nodes * 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::ElementType;

    fn unit_tet() -> Mesh {
        let nodes = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
        ];
        Mesh::new(ElementType::Tet4, nodes, vec![vec![0, 1, 2, 3]], None).unwrap()
    }

    #[test]
    fn unit_tet_reference_volume_is_one_sixth() {
        let mesh = unit_tet();
        assert!((mesh.reference_volume[0] - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn identity_displacement_gives_identity_deformation_gradient() {
        let mut mesh = unit_tet();
        mesh.compute_deformation_gradient();
        assert!((mesh.gauss[0].f - Matrix3::identity()).norm() < 1e-12);
    }

    #[test]
    fn boundary_conditions_overwrite_displacement() {
        let mut mesh = unit_tet();
        mesh.fix_node(0, Some([0.1, 0.0, 0.0]));
        mesh.u[0] = Vector3::new(5.0, 5.0, 5.0);
        mesh.apply_boundary_conditions();
        assert_eq!(mesh.u[0], Vector3::new(0.1, 0.0, 0.0));
    }

    #[test]
    fn rejects_out_of_range_connectivity() {
        let nodes = vec![Vector3::zeros(); 2];
        let err = Mesh::new(ElementType::Tet4, nodes, vec![vec![0, 1, 2, 3]], None);
        assert!(err.is_err());
    }
}
