//! Crawl pipeline for EMMA issuer and issue records.
//!
//! Loads CUSIPs, discovers each issuer's issues, enriches every issue with its
//! detail page and final scale feed, normalizes the heterogeneous label sets
//! and exports two CSV datasets.

pub mod browser;
pub mod clean;
pub mod consent;
pub mod discovery;
pub mod enrich;
pub mod error;
pub mod export;
pub mod identifiers;
pub mod model;
pub mod normalize;
pub mod pipeline;

pub use emma_api;
pub use emma_api::{types, Session};

pub use consent::{ChromeConsentSolver, ConsentGate, ConsentSolver};
pub use discovery::DiscoveryStrategy;
pub use error::ScraperError;
pub use model::{ColumnSuperset, IssuerIssue, LabelValueMap, PricingDetailRow, Record};
pub use pipeline::{CrawlConfig, CrawlOutput, CrawlReport, Crawler};
