//! Correspondence NOSB peridynamics: particle storage, neighbor search,
//! bond bookkeeping, and the quasi-static velocity-Verlet solver
//! (spec.md §3, §4.8).

pub mod bonds;
pub mod correspondence;
pub mod error;
pub mod neighbor;
pub mod particles;
pub mod solver;

pub use bonds::BondSystem;
pub use correspondence::{compute_deformation_gradients, compute_internal_forces, compute_shape_tensors, ShapeTensors};
pub use error::{PdError, Result};
pub use neighbor::NeighborSearch;
pub use particles::ParticleSystem;
pub use solver::{solve_quasi_static, NosbConfig, NosbProgress};
