//! Issue discovery from the `pdata.issuerIssuesJson` script assignment.

use std::sync::LazyLock;

use emma_api::types::IssueSummary;
use regex::Regex;
use scraper::Html;

use super::{dedupe_issues, header_card_title};
use crate::model::IssuerIssue;

static PAYLOAD_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"pdata\.issuerIssuesJson\s*=\s*\[").unwrap());

/// True when the page carries the inline issue array assignment.
pub fn has_payload(html: &str) -> bool {
    PAYLOAD_START.is_match(html)
}

/// Maps each element of the inline issue array to one [`IssuerIssue`].
/// `doc` is the parsed `html`; the issuer name comes from its header card.
///
/// A missing or undecodable array yields no issues; the condition is logged
/// and the crawl moves on.
pub fn discover(identifier: &str, html: &str, doc: &Html) -> Vec<IssuerIssue> {
    let Some(payload) = extract_payload(html) else {
        tracing::warn!("No inline issue payload on issuer page for {}", identifier);
        return Vec::new();
    };

    let summaries: Vec<IssueSummary> = match serde_json::from_str(payload) {
        Ok(summaries) => summaries,
        Err(e) => {
            tracing::warn!("Malformed inline issue payload for {}: {}", identifier, e);
            return Vec::new();
        }
    };

    let issuer_name = header_card_title(doc);
    let issues = summaries
        .into_iter()
        .map(|summary| IssuerIssue {
            issuer_name: issuer_name.clone(),
            issuer_cusip: identifier.to_string(),
            issue_id: summary.issue_id,
            issue_desc: summary.description,
            issue_date: summary.dated_date,
            maturity_dates: summary.maturity_range,
            ..Default::default()
        })
        .collect();
    dedupe_issues(identifier, issues)
}

/// The array literal assigned to `pdata.issuerIssuesJson`, from its opening
/// bracket to the matching close. Brackets inside string literals are
/// skipped. `None` when the array never closes.
fn extract_payload(html: &str) -> Option<&str> {
    // The match ends just past the opening bracket.
    let open = PAYLOAD_START.find(html)?.end() - 1;
    let mut depth = 0usize;
    let mut chars = html[open..].char_indices();
    while let Some((offset, ch)) = chars.next() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&html[open..=open + offset]);
                }
            }
            '"' => loop {
                match chars.next()?.1 {
                    '\\' => {
                        chars.next()?;
                    }
                    '"' => break,
                    _ => {}
                }
            },
            _ => {}
        }
    }
    None
}
