//! Per-issue enrichment: detail page headline and labels, then the final
//! scale feed expanded into pricing rows.

use std::sync::LazyLock;

use emma_api::types::FinalScaleEntry;
use emma_api::Session;
use scraper::{Html, Selector};

use crate::clean::{clean_text, format_as_header};
use crate::consent::ConsentGate;
use crate::discovery::{element_text, H3, H5, HEADER_CARD};
use crate::error::ScraperError;
use crate::model::{IssuerIssue, LabelValueMap, PricingDetailRow};

static BLUE_BOX: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.blue-box").unwrap());
static LIST_ITEM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li").unwrap());
static LABEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span.label").unwrap());
static VALUE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.float-right").unwrap());

/// What the issue detail page contributes to an issue.
#[derive(Debug, Default, PartialEq)]
pub struct IssueDetails {
    /// Header card `h3`, cleaned.
    pub headline: String,
    /// Header card `h5`, cleaned.
    pub subheadline: String,
    pub labels: LabelValueMap,
}

/// Fetches the detail page and final scale of `issue`.
///
/// Fills in the issue's headline fields and label map in place and returns
/// the issue's pricing rows, each carrying every label/value pair.
pub async fn enrich_issue(
    session: &Session,
    gate: &ConsentGate,
    issue: &mut IssuerIssue,
) -> Result<Vec<PricingDetailRow>, ScraperError> {
    let link = match &issue.link {
        Some(link) => link.clone(),
        None => session.issue_details_url(&issue.issue_id)?.to_string(),
    };
    let page = gate.fetch(session, &link).await?;
    let details = parse_issue_details(&page);

    issue.issue_desc2 = details.headline;
    issue.issue_desc3 = details.subheadline;
    issue.additional_fields = details.labels;

    let entries = session.get_final_scale(&issue.issue_id).await?;
    tracing::debug!(
        "Issue {}: {} labels, {} final scale entries",
        issue.issue_id,
        issue.additional_fields.len(),
        entries.len()
    );
    Ok(build_pricing_rows(
        &issue.issue_id,
        entries,
        &issue.additional_fields,
    ))
}

/// Reads the header card and the first blue label box of a detail page.
/// Missing elements leave the corresponding fields empty.
pub fn parse_issue_details(html: &str) -> IssueDetails {
    let doc = Html::parse_document(html);

    let card = doc.select(&HEADER_CARD).next();
    let heading = |selector: &Selector| {
        card.and_then(|card| card.select(selector).next())
            .map(|h| clean_text(&element_text(&h)))
            .unwrap_or_default()
    };

    let mut labels = LabelValueMap::new();
    if let Some(blue_box) = doc.select(&BLUE_BOX).next() {
        for item in blue_box.select(&LIST_ITEM) {
            let label = item.select(&LABEL).next().map(|l| element_text(&l));
            let value = item.select(&VALUE).next().map(|v| element_text(&v));
            let (Some(label), Some(value)) = (label, value) else {
                continue;
            };
            let key = format_as_header(&label);
            if key.is_empty() {
                continue;
            }
            labels.insert(key, clean_text(&value));
        }
    }

    IssueDetails {
        headline: heading(&H3),
        subheadline: heading(&H5),
        labels,
    }
}

/// One pricing row per feed entry. Coupon, price-or-yield, price and yield
/// are cleaned; the rest is copied as served.
pub fn build_pricing_rows(
    issue_id: &str,
    entries: Vec<FinalScaleEntry>,
    labels: &LabelValueMap,
) -> Vec<PricingDetailRow> {
    entries
        .into_iter()
        .map(|entry| PricingDetailRow {
            issue_id: issue_id.to_string(),
            cusip: entry.cusip9,
            principal_amount_at_issuance: entry.principal_amount,
            security_description: entry.security_description,
            coupon: clean_text(&entry.coupon),
            maturity_date: entry.maturity_date,
            price_or_yield: clean_text(&entry.price_or_yield),
            price: clean_text(&entry.price),
            yield_rate: clean_text(&entry.yield_rate),
            labels: labels.clone(),
        })
        .collect()
}
