//! Linear solve interface: `Kx = b` with Dirichlet penalty rows
//! (spec.md §4.4).

use crate::backend::{LinearSolver as _, NativeBackend, SolveInfo};
use crate::error::SolveError;
use crate::mesh::Mesh;
use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Converts assembled COO triplets plus the mesh's Dirichlet data into a
/// CSR system and solves it with the auto-selecting native backend.
pub fn solve_with_bcs(
    mut k: CooMatrix<f64>,
    mut rhs: DVector<f64>,
    mesh: &Mesh,
) -> Result<(DVector<f64>, SolveInfo), SolveError> {
    crate::assembly::apply_penalty_bcs(&mut k, &mut rhs, mesh);
    let csr = CsrMatrix::from(&k);
    NativeBackend.solve(&csr, &rhs)
}
