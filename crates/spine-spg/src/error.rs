//! Error taxonomy for the SPG core.

use thiserror::Error;
pub use spine_core::error::ValidationError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpgError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("singular kernel-gradient correction matrix at particle {particle}")]
    SingularCorrectionMatrix { particle: usize },

    #[error("NaN/Inf divergence during residual evaluation at step {step}")]
    NanDivergence { step: usize },
}

pub type Result<T> = std::result::Result<T, SpgError>;
