//! Linear/eigen solver backend (spec.md §4.4, §4.7 eigen-mode utility).
//!
//! A single `NativeBackend` covers both: direct factorization via
//! `nalgebra`/`nalgebra-lapack` dense routines, and a Jacobi-preconditioned
//! conjugate gradient operating directly on the sparse `CsrMatrix` for the
//! large-`n_dof` path. There is no separate PETSc/ILU backend in this
//! workspace — the teacher's own build carried PETSc behind a feature flag
//! that isn't wired to a real dependency, and nothing in spec.md requires a
//! second backend, so only the native path survives the trim.

pub mod native;
pub mod traits;

pub use native::NativeBackend;
pub use traits::{EigenResult, EigenSolver, LinearSolver, SolveInfo};
