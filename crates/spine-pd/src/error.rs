//! Error taxonomy for the peridynamics core.

use thiserror::Error;
pub use spine_core::error::ValidationError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PdError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("singular shape tensor at particle {particle}: fewer than {dim} independent bonds")]
    SingularShapeTensor { particle: usize, dim: usize },

    #[error("NaN/Inf divergence during residual evaluation at step {step}")]
    NanDivergence { step: usize },
}

pub type Result<T> = std::result::Result<T, PdError>;
