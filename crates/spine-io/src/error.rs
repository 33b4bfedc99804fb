//! Error taxonomy for deck/mesh-file ingestion.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("deck parse error: {0}")]
    Deck(#[from] spine_inp::ParseError),

    #[error("unsupported element type `{0}`")]
    UnsupportedElementType(String),

    #[error("malformed card `*{keyword}`: {message}")]
    MalformedCard { keyword: String, message: String },

    #[error("mesh construction failed: {0}")]
    Mesh(#[from] spine_core::error::ValidationError),
}

pub type Result<T> = std::result::Result<T, IoError>;
