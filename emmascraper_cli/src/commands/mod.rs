//! CLI command implementations.

pub mod scrape;
