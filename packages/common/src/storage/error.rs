use thiserror::Error;

/// Errors that can occur during media storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The reference does not point inside the uploads tree.
    #[error("invalid media path: {0}")]
    InvalidPath(String),

    /// The requested extension is not a plain alphanumeric suffix.
    #[error("invalid file extension: {0}")]
    InvalidExtension(String),

    /// The payload exceeds the configured size limit.
    #[error("media exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },

    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
}
