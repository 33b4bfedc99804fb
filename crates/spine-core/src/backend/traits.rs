//! Backend trait surface (spec.md §4.4).

use crate::error::SolveError;
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;

/// Diagnostics about how a linear solve was actually carried out, surfaced
/// to the caller for logging rather than silently discarded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveInfo {
    pub used_direct: bool,
    pub cg_iterations: Option<usize>,
    pub cg_residual: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct EigenResult {
    /// Ascending eigenvalues (rad^2/s^2 for the generalized `(K, M)` problem).
    pub eigenvalues: Vec<f64>,
    /// Eigenvectors on the free-DOF subspace, one column per mode.
    pub eigenvectors: nalgebra::DMatrix<f64>,
}

pub trait LinearSolver {
    /// Solves `Kx = b`. `n_dof` drives the auto-select policy in spec.md
    /// §4.4: direct when `<= 50_000`, otherwise preconditioned CG with
    /// direct fallback on non-convergence.
    fn solve(&self, k: &CsrMatrix<f64>, rhs: &DVector<f64>) -> Result<(DVector<f64>, SolveInfo), SolveError>;
}

pub trait EigenSolver {
    /// Lowest `n_modes` eigenpairs of the generalized problem `(K, M)`
    /// restricted to `free_dofs`, shift-invert around zero, ascending.
    fn lowest_modes(
        &self,
        k: &CsrMatrix<f64>,
        m: &CsrMatrix<f64>,
        free_dofs: &[usize],
        n_modes: usize,
    ) -> Result<EigenResult, SolveError>;
}
