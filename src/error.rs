use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompressError {
    /// The source could not be decoded (image header, PDF structure).
    #[error("failed to load asset: {0}")]
    AssetLoadFailed(String),

    /// Every encode attempt, the fallback included, failed.
    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    /// Every PDF serialization attempt, the fallback included, failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(String),

    /// Request or policy values outside their valid range.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

pub type Result<T> = std::result::Result<T, CompressError>;

/// Flattens an adapter error chain into a single message.
pub(crate) fn describe(err: &anyhow::Error) -> String {
    format!("{:#}", err)
}
