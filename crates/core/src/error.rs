use thiserror::Error;

/// Core domain errors
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Repository name must not be empty")]
    EmptyRepoName,

    #[error("Repository path must not be empty")]
    EmptyRepoPath,

    #[error("Invalid index count: {value}")]
    InvalidIndices { value: String },

    #[error("Malformed frame: {0}")]
    Frame(#[from] FrameError),
}

/// Reasons an inbound push frame is dropped before classification
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("frame is not valid JSON: {0}")]
    Json(String),

    #[error("frame is not a JSON object")]
    NotAnObject,
}

pub type Result<T> = std::result::Result<T, CoreError>;
