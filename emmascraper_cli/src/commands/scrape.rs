//! The crawl: CUSIP file in, issuer and pricing CSVs out.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use emmascraper_lib::emma_api::DEFAULT_BASE_URL;
use emmascraper_lib::export::{DEFAULT_ISSUERS_FILE, DEFAULT_PRICING_FILE};
use emmascraper_lib::identifiers::{load_identifiers, DEFAULT_IDENTIFIER_FILE};
use emmascraper_lib::pipeline::DEFAULT_MAX_PAGES;
use emmascraper_lib::{ChromeConsentSolver, ConsentGate, CrawlConfig, CrawlReport, Crawler, Session};

use crate::output::print_summary;

/// Arguments for a crawl run.
#[derive(Args, Debug)]
pub struct ScrapeArgs {
    /// File with one CUSIP per line (created empty if missing)
    #[arg(long, env = "EMMA_CUSIPS_FILE", default_value = DEFAULT_IDENTIFIER_FILE)]
    pub input: PathBuf,

    /// Issuer dataset output path
    #[arg(long, default_value = DEFAULT_ISSUERS_FILE)]
    pub issuers_out: PathBuf,

    /// Pricing dataset output path
    #[arg(long, default_value = DEFAULT_PRICING_FILE)]
    pub pricing_out: PathBuf,

    /// Delay after each issue in milliseconds
    #[arg(long, env = "EMMA_REQUEST_DELAY_MS", default_value = "1000")]
    pub delay_ms: u64,

    /// Portal base URL
    #[arg(long, env = "EMMA_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Maximum result pages walked per CUSIP
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: usize,
}

impl ScrapeArgs {
    fn crawl_config(&self) -> CrawlConfig {
        CrawlConfig {
            request_delay: Duration::from_millis(self.delay_ms),
            max_pages: self.max_pages,
        }
    }
}

pub async fn run(args: &ScrapeArgs) -> Result<CrawlReport> {
    let identifiers = load_identifiers(&args.input)?;
    if identifiers.is_empty() {
        tracing::warn!("{} lists no CUSIPs", args.input.display());
    }

    let session = Session::with_base_url(&args.base_url)?;
    let gate = ConsentGate::new(Arc::new(ChromeConsentSolver::new()));
    let crawler = Crawler::new(session, gate, args.crawl_config());

    let mut output = crawler.run(&identifiers).await?;

    tracing::info!("Successfully got everything - starting to make CSVs.");
    output.write(&args.issuers_out, &args.pricing_out)?;
    tracing::info!("The *WHOLE* process is done!");

    print_summary(&output.report, &args.issuers_out, &args.pricing_out);
    Ok(output.report)
}
