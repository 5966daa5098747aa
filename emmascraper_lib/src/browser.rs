//! Headless Chrome launcher for the consent click-through.
//!
//! The sandbox is disabled when running inside a container (detected via
//! `/.dockerenv` or the `EMMA_CONTAINER` env var). `CHROME_PATH` overrides the
//! Chrome binary lookup.

use std::path::{Path, PathBuf};

use headless_chrome::{Browser, LaunchOptions};

use crate::error::ScraperError;

/// Launches a headless Chrome instance. The process is killed when the
/// returned `Browser` is dropped.
pub fn create_browser() -> Result<Browser, ScraperError> {
    let is_container =
        std::env::var("EMMA_CONTAINER").is_ok() || Path::new("/.dockerenv").exists();
    let chrome_path = std::env::var("CHROME_PATH").ok().map(PathBuf::from);

    let options = LaunchOptions::default_builder()
        .sandbox(!is_container)
        .path(chrome_path)
        .build()
        .map_err(|e| {
            ScraperError::Consent(format!("Failed to build Chrome launch options: {}", e))
        })?;

    Browser::new(options)
        .map_err(|e| ScraperError::Consent(format!("Failed to launch headless Chrome: {}", e)))
}
