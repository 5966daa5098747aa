//! The crawl driver: identifiers in, two normalized datasets out.

use std::path::Path;
use std::time::Duration;

use emma_api::Session;

use crate::consent::ConsentGate;
use crate::discovery::{discover_issues, DiscoveryContext};
use crate::enrich::enrich_issue;
use crate::error::ScraperError;
use crate::export::write_dataset;
use crate::model::{ColumnSuperset, IssuerIssue, PricingDetailRow, Record};
use crate::normalize::{normalize_issuers, normalize_pricing};

/// Pause after each enriched issue.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(1);
/// Upper bound on result pages walked per identifier.
pub const DEFAULT_MAX_PAGES: usize = 500;

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub request_delay: Duration,
    pub max_pages: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            request_delay: DEFAULT_REQUEST_DELAY,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub identifiers: usize,
    /// Identifiers whose issuer page listed no issues.
    pub skipped: usize,
    pub issues: usize,
    pub pricing_rows: usize,
    pub label_columns: usize,
    pub issuer_rows_written: usize,
    pub pricing_rows_written: usize,
}

/// Normalized datasets plus the run's counters.
#[derive(Debug, Clone, Default)]
pub struct CrawlOutput {
    pub issuers: Vec<Record>,
    pub pricing: Vec<Record>,
    pub report: CrawlReport,
}

impl CrawlOutput {
    /// Writes both datasets. Empty ones are skipped and count as 0 rows.
    pub fn write(&mut self, issuers_path: &Path, pricing_path: &Path) -> Result<(), ScraperError> {
        self.report.issuer_rows_written = write_dataset(issuers_path, &self.issuers)?;
        self.report.pricing_rows_written = write_dataset(pricing_path, &self.pricing)?;
        Ok(())
    }
}

/// Runs the crawl sequentially over one [`Session`].
pub struct Crawler {
    session: Session,
    gate: ConsentGate,
    config: CrawlConfig,
}

impl Crawler {
    pub fn new(session: Session, gate: ConsentGate, config: CrawlConfig) -> Self {
        Self {
            session,
            gate,
            config,
        }
    }

    /// Discovers and enriches every issue of every identifier, then
    /// normalizes both datasets against the label superset.
    ///
    /// Identifiers without issues are skipped. Any transport, status or
    /// consent failure aborts the run before anything is normalized.
    pub async fn run(&self, identifiers: &[String]) -> Result<CrawlOutput, ScraperError> {
        let mut issuers: Vec<IssuerIssue> = Vec::new();
        let mut pricing: Vec<PricingDetailRow> = Vec::new();
        let mut superset = ColumnSuperset::new();
        let mut report = CrawlReport {
            identifiers: identifiers.len(),
            ..Default::default()
        };

        for (i, identifier) in identifiers.iter().enumerate() {
            tracing::info!("Getting CUSIP no. {} out of {}", i + 1, identifiers.len());

            let mut issues = self.discover(identifier).await?;
            if issues.is_empty() {
                tracing::warn!(
                    "There is no info on CUSIP no. {} - heading to the next!",
                    identifier
                );
                report.skipped += 1;
                continue;
            }

            let total = issues.len();
            for (j, issue) in issues.iter_mut().enumerate() {
                tracing::info!("Scraping issue no. {} (out of {})", j + 1, total);
                let rows = enrich_issue(&self.session, &self.gate, issue).await?;
                superset.observe(&issue.additional_fields);
                pricing.extend(rows);

                if !self.config.request_delay.is_zero() {
                    tokio::time::sleep(self.config.request_delay).await;
                }
            }
            issuers.extend(issues);
        }

        report.issues = issuers.len();
        report.pricing_rows = pricing.len();
        report.label_columns = superset.len();
        tracing::debug!("{} label columns across all issues", superset.len());

        Ok(CrawlOutput {
            issuers: normalize_issuers(issuers, &superset),
            pricing: normalize_pricing(pricing, &superset),
            report,
        })
    }

    async fn discover(&self, identifier: &str) -> Result<Vec<IssuerIssue>, ScraperError> {
        let url = self.session.issuer_url(identifier)?.to_string();
        let page = self.gate.fetch(&self.session, &url).await?;
        let ctx = DiscoveryContext {
            session: &self.session,
            gate: &self.gate,
            page_url: &url,
            max_pages: self.config.max_pages,
        };
        discover_issues(&ctx, identifier, &page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = CrawlConfig::default();
        assert_eq!(config.request_delay, Duration::from_secs(1));
        assert_eq!(config.max_pages, 500);
    }

    #[test]
    fn write_skips_empty_datasets() {
        let dir = tempfile::tempdir().unwrap();
        let issuers_path = dir.path().join("db1.csv");
        let pricing_path = dir.path().join("db2.csv");
        let mut output = CrawlOutput {
            issuers: vec![vec![("issuer_name", "Springfield")].into_iter().collect()],
            ..Default::default()
        };

        output.write(&issuers_path, &pricing_path).unwrap();

        assert_eq!(output.report.issuer_rows_written, 1);
        assert_eq!(output.report.pricing_rows_written, 0);
        assert!(issuers_path.exists());
        assert!(!pricing_path.exists());
    }
}
