//! Error taxonomy for the scene scheduler.

use spine_contact::ContactError;
use spine_coupling::CouplingError;
use spine_core::error::{SolveError, ValidationError};
use spine_pd::PdError;
use spine_spg::SpgError;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SceneError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("FEM solve error: {0}")]
    Fem(#[from] SolveError),

    #[error("PD solve error: {0}")]
    Pd(#[from] PdError),

    #[error("SPG solve error: {0}")]
    Spg(#[from] SpgError),

    #[error("coupling error: {0}")]
    Coupling(#[from] CouplingError),

    #[error("contact error: {0}")]
    Contact(#[from] ContactError),

    #[error("scene references an unknown body index {0}")]
    UnknownBody(usize),
}

pub type Result<T> = std::result::Result<T, SceneError>;
