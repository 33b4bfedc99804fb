//! Natural-frequency utility: lowest `n_modes` eigenpairs of `(K, M)` on
//! the free-DOF subspace (spec.md §4.7).

use crate::assembly::assemble_stiffness;
use crate::backend::{EigenSolver as _, NativeBackend};
use crate::dynamic_solver::lumped_mass;
use crate::error::SolveError;
use crate::materials::Material;
use crate::mesh::Mesh;
use nalgebra_sparse::CooMatrix;
use std::f64::consts::PI;

#[derive(Debug, Clone)]
pub struct ModalResult {
    /// `f = sqrt(lambda) / (2 pi)`, ascending.
    pub frequencies_hz: Vec<f64>,
    pub eigenvectors: nalgebra::DMatrix<f64>,
    pub free_dofs: Vec<usize>,
}

fn free_dofs(mesh: &Mesh) -> Vec<usize> {
    let mut dofs = Vec::new();
    for n in 0..mesh.n_nodes {
        for d in 0..3 {
            if !mesh.fixed[n][d] {
                dofs.push(n * 3 + d);
            }
        }
    }
    dofs
}

pub fn lowest_natural_frequencies(
    mesh: &Mesh,
    materials: &[Material],
    density: &[f64],
    n_modes: usize,
) -> Result<ModalResult, SolveError> {
    let k = assemble_stiffness(mesh, materials);
    let mass_vec = lumped_mass(mesh, density);
    let n_dof = mesh.total_dofs();

    let mut m_coo = CooMatrix::<f64>::new(n_dof, n_dof);
    for i in 0..n_dof {
        m_coo.push(i, i, mass_vec[i].max(1e-300));
    }

    let k_csr = nalgebra_sparse::CsrMatrix::from(&k);
    let m_csr = nalgebra_sparse::CsrMatrix::from(&m_coo);
    let free = free_dofs(mesh);

    let eig = NativeBackend.lowest_modes(&k_csr, &m_csr, &free, n_modes)?;
    let frequencies_hz = eig.eigenvalues.iter().map(|&lambda| lambda.max(0.0).sqrt() / (2.0 * PI)).collect();

    Ok(ModalResult { frequencies_hz, eigenvectors: eig.eigenvectors, free_dofs: free })
}
