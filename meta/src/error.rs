//! Error types for metadata queries.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid object class '{0}' (expected hosts, stacks, services or containers)")]
    InvalidObjectClass(String),

    #[error("Malformed predicate: {0}")]
    MalformedPredicate(String),

    #[error("Failed to retrieve {url}: {message}")]
    Retrieval { url: String, message: String },

    #[error("Failed to decode metadata response: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, Error>;
