//! Error taxonomy for FEM<->particle coupling.

use spine_core::error::ValidationError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CouplingError {
    #[error("zone split produced an empty FEM and PD zone")]
    EmptySplit,

    #[error("coupling loop failed to converge within {max_iters} iterations (last residual {last_residual})")]
    MaxIterationsReached { max_iters: usize, last_residual: f64 },

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

pub type Result<T> = std::result::Result<T, CouplingError>;
