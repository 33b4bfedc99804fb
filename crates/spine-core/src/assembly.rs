//! Vectorized global stiffness assembly (spec.md §4.3).

use crate::elements::strain_displacement_matrix;
use crate::materials::Material;
use crate::mesh::Mesh;
use nalgebra::{DMatrix, Matrix3};
use nalgebra_sparse::CooMatrix;
use rayon::prelude::*;

/// Bound peak memory by assembling at most this many elements' worth of
/// triplets before folding them into the running `CooMatrix`.
const ASSEMBLY_CHUNK_SIZE: usize = 10_000;

/// Entries below this magnitude are dropped before the triplets reach the
/// sparse matrix.
const DROP_THRESHOLD: f64 = 1e-20;

fn dof_index(node: usize, dim_idx: usize) -> usize {
    node * 3 + dim_idx
}

/// Element-local DOF indices for the element's connectivity, 3 per node
/// (unused z-DOFs for 2-D elements are simply never touched).
fn element_dofs(conn: &[usize]) -> Vec<usize> {
    let mut dofs = Vec::with_capacity(conn.len() * 3);
    for &n in conn {
        for d in 0..3 {
            dofs.push(dof_index(n, d));
        }
    }
    dofs
}

/// Assembles the global material-only stiffness `K_mat` for the (generally
/// linearized) elastic tangent of each element's material.
pub fn assemble_stiffness(mesh: &Mesh, materials: &[Material]) -> CooMatrix<f64> {
    let n_dof = mesh.total_dofs();
    let mut k = CooMatrix::<f64>::new(n_dof, n_dof);
    let n_gauss = mesh.element_type.n_gauss();
    let dim = mesh.element_type.dim();

    for chunk_start in (0..mesh.n_elements).step_by(ASSEMBLY_CHUNK_SIZE) {
        let chunk_end = (chunk_start + ASSEMBLY_CHUNK_SIZE).min(mesh.n_elements);
        let chunk: Vec<(usize, usize, usize, f64)> = (chunk_start..chunk_end)
            .into_par_iter()
            .flat_map_iter(|e| {
                let conn = &mesh.connectivity[e];
                let dofs = element_dofs(conn);
                let ndof_e = dofs.len();
                let c = materials[mesh.material_id[e]].elasticity_tensor(dim, mesh.element_type.is_plane_strain());

                let mut k_e = DMatrix::<f64>::zeros(ndof_e, ndof_e);
                for g in 0..n_gauss {
                    let field = &mesh.gauss[e * n_gauss + g];
                    let b = strain_displacement_matrix(mesh.element_type, &field.dn_dx);
                    let bt_c_b = b.transpose() * &c * &b;
                    k_e += bt_c_b * field.integration_weight;
                }

                let mut triplets = Vec::with_capacity(ndof_e * ndof_e);
                for i in 0..ndof_e {
                    for j in 0..ndof_e {
                        let v = k_e[(i, j)];
                        if v.abs() >= DROP_THRESHOLD {
                            triplets.push((dofs[i], dofs[j], v));
                        }
                    }
                }
                triplets
            })
            .collect();

        for (r, c, v) in chunk {
            k.push(r, c, v);
        }
    }

    k
}

/// Adds the geometric ("initial stress") stiffness contribution for
/// nonlinear paths: `K_geo[a*dim+d1, b*dim+d2] = dN_a . sigma . dN_b *
/// delta(d1,d2) * w|detJ|`.
pub fn assemble_geometric_stiffness(mesh: &Mesh) -> CooMatrix<f64> {
    let n_dof = mesh.total_dofs();
    let mut k = CooMatrix::<f64>::new(n_dof, n_dof);
    let n_gauss = mesh.element_type.n_gauss();
    let dim = mesh.element_type.dim();

    for chunk_start in (0..mesh.n_elements).step_by(ASSEMBLY_CHUNK_SIZE) {
        let chunk_end = (chunk_start + ASSEMBLY_CHUNK_SIZE).min(mesh.n_elements);
        let chunk: Vec<(usize, usize, usize, f64)> = (chunk_start..chunk_end)
            .into_par_iter()
            .flat_map_iter(|e| {
                let conn = &mesh.connectivity[e];
                let npe = conn.len();
                let mut scalar = DMatrix::<f64>::zeros(npe, npe);
                for g in 0..n_gauss {
                    let field = &mesh.gauss[e * n_gauss + g];
                    let sigma: Matrix3<f64> = field.sigma;
                    for a in 0..npe {
                        for b in 0..npe {
                            let mut contrib = 0.0;
                            for i in 0..dim {
                                for j in 0..dim {
                                    contrib += field.dn_dx[(a, i)] * sigma[(i, j)] * field.dn_dx[(b, j)];
                                }
                            }
                            scalar[(a, b)] += contrib * field.integration_weight;
                        }
                    }
                }

                let mut triplets = Vec::with_capacity(npe * npe * dim);
                for a in 0..npe {
                    for b in 0..npe {
                        let v = scalar[(a, b)];
                        if v.abs() < DROP_THRESHOLD {
                            continue;
                        }
                        for d in 0..dim {
                            let row = dof_index(conn[a], d);
                            let col = dof_index(conn[b], d);
                            triplets.push((row, col, v));
                        }
                    }
                }
                triplets
            })
            .collect();

        for (r, c, v) in chunk {
            k.push(r, c, v);
        }
    }

    k
}

/// `f_a <- -sum_gp sigma . (dN_a/dX) . w|detJ|` over every element,
/// scattered into `mesh.f_int`.
pub fn compute_nodal_forces(mesh: &mut Mesh) {
    for f in mesh.f_int.iter_mut() {
        *f = nalgebra::Vector3::zeros();
    }
    let n_gauss = mesh.element_type.n_gauss();
    let dim = mesh.element_type.dim();
    for (e, conn) in mesh.connectivity.iter().enumerate() {
        for g in 0..n_gauss {
            let field = &mesh.gauss[e * n_gauss + g];
            let sigma = field.sigma;
            for (a, &node) in conn.iter().enumerate() {
                let mut contrib = nalgebra::Vector3::zeros();
                for i in 0..dim {
                    for j in 0..dim {
                        contrib[i] -= sigma[(i, j)] * field.dn_dx[(a, j)] * field.integration_weight;
                    }
                }
                mesh.f_int[node] += contrib;
            }
        }
    }
}

/// Applies the `1e30` Dirichlet penalty to `k` and the matching right-hand
/// side entries (spec.md §4.4).
pub fn apply_penalty_bcs(
    k: &mut CooMatrix<f64>,
    rhs: &mut nalgebra::DVector<f64>,
    mesh: &Mesh,
) {
    const PENALTY: f64 = 1e30;
    for node in 0..mesh.n_nodes {
        for d in 0..3 {
            if mesh.fixed[node][d] {
                let dof = dof_index(node, d);
                k.push(dof, dof, PENALTY);
                rhs[dof] = PENALTY * mesh.prescribed[node][d];
            }
        }
    }
}
