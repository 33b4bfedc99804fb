//! Error taxonomy for contact detection and force evaluation.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContactError {
    #[error("KD-tree build failed: {0}")]
    KdTree(String),

    #[error("contact body `{body}` has no surface nodes")]
    EmptySurface { body: String },
}

pub type Result<T> = std::result::Result<T, ContactError>;
