//! Error types for the crawl pipeline.

use std::path::PathBuf;

/// Errors produced by the pipeline. Every variant is fatal to the run; empty
/// or malformed discovery results are not errors and never reach this type.
#[derive(thiserror::Error, Debug)]
pub enum ScraperError {
    /// An error from the portal HTTP layer.
    #[error("API error: {0}")]
    Api(#[from] emma_api::Error),
    /// The identifier file was missing; an empty placeholder now exists at `path`.
    #[error("The file {} was not found and has been created. Please put the list of CUSIPs there.", path.display())]
    MissingIdentifierFile { path: PathBuf },
    /// The consent click-through failed or did not unlock the page.
    #[error("Consent automation failed: {0}")]
    Consent(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
