//! Turning an issuer landing page into the issues it lists.
//!
//! The portal has served two page shapes over time: an ASP.NET results grid
//! split over postback pages, and a single page embedding every issue as a
//! JSON array in a script. [`DiscoveryStrategy::detect`] picks the strategy
//! matching the page at hand; both produce the same [`IssuerIssue`] list.

pub mod inline_json;
pub mod paginated;

use std::collections::HashSet;
use std::sync::LazyLock;

use emma_api::Session;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::clean::squash_whitespace;
use crate::consent::ConsentGate;
use crate::error::ScraperError;
use crate::model::IssuerIssue;

/// Header card shared by the issuer and issue pages.
pub(crate) static HEADER_CARD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.card, div.grey-band, div.grey-header").unwrap());
pub(crate) static H3: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h3").unwrap());
pub(crate) static H5: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h5").unwrap());

/// Everything a strategy needs besides the page itself.
pub struct DiscoveryContext<'a> {
    pub session: &'a Session,
    pub gate: &'a ConsentGate,
    /// The URL the page was fetched from; postbacks go back to it.
    pub page_url: &'a str,
    /// Upper bound on result pages walked per identifier.
    pub max_pages: usize,
}

/// The two interchangeable ways of reading issues off an issuer page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStrategy {
    /// Results grid plus `__doPostBack` pager links.
    PaginatedTable,
    /// `pdata.issuerIssuesJson = [...]` in a script block.
    InlineJson,
}

impl DiscoveryStrategy {
    /// Picks the strategy matching the page shape, or `None` when the page
    /// carries neither an inline issue array nor a results table.
    pub fn detect(html: &str, doc: &Html) -> Option<Self> {
        if inline_json::has_payload(html) {
            Some(Self::InlineJson)
        } else if paginated::has_results_table(doc) {
            Some(Self::PaginatedTable)
        } else {
            None
        }
    }
}

/// Reads every issue for `identifier` starting from the issuer `page`.
///
/// The page is parsed once and inspected; pages of neither shape yield no
/// issues. The table strategy may fetch further result pages, the inline
/// strategy never touches the network. An empty result is not an error.
pub async fn discover_issues(
    ctx: &DiscoveryContext<'_>,
    identifier: &str,
    page: &str,
) -> Result<Vec<IssuerIssue>, ScraperError> {
    let page_url = Url::parse(ctx.page_url).map_err(emma_api::Error::from)?;

    let first = {
        let doc = Html::parse_document(page);
        match DiscoveryStrategy::detect(page, &doc) {
            Some(DiscoveryStrategy::InlineJson) => {
                tracing::debug!("Discovering issues for {} from the inline payload", identifier);
                return Ok(inline_json::discover(identifier, page, &doc));
            }
            Some(DiscoveryStrategy::PaginatedTable) => {
                tracing::debug!("Discovering issues for {} from the results table", identifier);
                paginated::parse_table_page(identifier, &doc, &page_url)
            }
            None => {
                tracing::debug!("No issue listing found on issuer page for {}", identifier);
                return Ok(Vec::new());
            }
        }
    };
    paginated::walk(ctx, identifier, first, &page_url).await
}

/// Keeps the first issue of each issue id.
pub(crate) fn dedupe_issues(identifier: &str, issues: Vec<IssuerIssue>) -> Vec<IssuerIssue> {
    let total = issues.len();
    let mut seen = HashSet::new();
    let unique: Vec<IssuerIssue> = issues
        .into_iter()
        .filter(|issue| seen.insert(issue.issue_id.clone()))
        .collect();
    if unique.len() < total {
        tracing::debug!(
            "Dropped {} repeated issues for {}",
            total - unique.len(),
            identifier
        );
    }
    unique
}

/// Text of an element with whitespace runs collapsed.
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    squash_whitespace(&element.text().collect::<String>())
}

/// `h3` of the first header card, or an empty string.
pub(crate) fn header_card_title(doc: &Html) -> String {
    doc.select(&HEADER_CARD)
        .next()
        .and_then(|card| card.select(&H3).next())
        .map(|h3| element_text(&h3))
        .unwrap_or_default()
}
