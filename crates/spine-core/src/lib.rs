//! Solid-mechanics solver core: mesh/element catalog, constitutive models,
//! vectorized assembly, and the static/arc-length/dynamic solve paths
//! (spec.md §4.1-§4.7).

pub mod analysis;
pub mod arc_length;
pub mod assembly;
pub mod backend;
pub mod dynamic_solver;
pub mod elements;
pub mod error;
pub mod frequency;
pub mod linear_solver;
pub mod materials;
pub mod mesh;
pub mod solve_result;
pub mod static_solver;
pub mod validation;

pub use analysis::{compute_energy_balance, EnergyBalance};
pub use arc_length::{ArcLengthConfig, ArcLengthSolver};
pub use backend::{EigenResult, EigenSolver, LinearSolver, NativeBackend, SolveInfo};
pub use dynamic_solver::{central_difference_step, lumped_mass, newmark_step, stable_time_step, DynamicState, NewmarkConfig};
pub use elements::{ElementType, GaussPoint};
pub use error::{DivergenceReason, SolveError, ValidationError};
pub use frequency::{lowest_natural_frequencies, ModalResult};
pub use materials::Material;
pub use mesh::{GaussField, Mesh};
pub use solve_result::SolveResult;
pub use static_solver::{solve_linear, solve_nonlinear, NewtonProgress, NonlinearConfig};
