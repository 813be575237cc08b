//! Error types for the compositing engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the compositing engine
#[derive(Error, Debug)]
pub enum Error {
    /// The base asset (or, in strict mode, an overlay) failed to decode
    #[error("Image load failed: {0}")]
    ImageLoad(String),

    /// A raster operation was invoked with a zero or negative target dimension
    #[error("Invalid container dimensions: {width}x{height}")]
    InvalidContainer { width: u32, height: u32 },

    /// Failed to encode the finished composite
    #[error("Composite encoding failed: {0}")]
    Encode(String),

    /// The external generation collaborator reported a failure
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "remote")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Generation(err.to_string())
    }
}
