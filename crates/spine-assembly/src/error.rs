//! Error taxonomy for the label-volume -> domain pipeline.

use spine_contact::ContactError;
use spine_core::error::ValidationError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssemblyError {
    #[error("label volume carries no labeled voxels")]
    EmptyVolume,

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("facet-joint detection failed: {0}")]
    Facet(#[from] ContactError),
}

pub type Result<T> = std::result::Result<T, AssemblyError>;
