//! Error types for the EMMA HTTP layer.

/// Errors that can occur when talking to the portal.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request could not be sent or the body could not be read.
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The portal returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// A page or feed URL could not be built from the base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// A JSON feed body did not match the expected shape.
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),
}
