//! Stabilized particle Galerkin (SPG) core: cubic B-spline kernel, shape
//! functions/gradients, stress/force compute, and bond failure
//! (spec.md §4.9). Builds on `spine-pd`'s `ParticleSystem` and
//! `NeighborSearch`, since the particle storage and grid are shared
//! infrastructure between the two meshfree methods.

pub mod compute;
pub mod error;
pub mod failure;
pub mod kernel;
pub mod shape;

pub use compute::{compute_correction_matrices, compute_deformation_gradients, compute_internal_forces, CorrectionMatrices};
pub use error::{Result, SpgError};
pub use failure::{apply_plastic_strain_failure, apply_stretch_failure};
pub use kernel::{kernel_gradient, kernel_value};
pub use shape::SpgNeighbors;
