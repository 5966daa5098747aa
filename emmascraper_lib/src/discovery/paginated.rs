//! Issue discovery from the ASP.NET results grid.
//!
//! The first page arrives with the issuer GET. Every further page is reached
//! by re-submitting the page's form with `__EVENTTARGET`/`__EVENTARGUMENT`
//! taken from a pager link's `javascript:__doPostBack('target','argument')`.
//! Pager links are classified by their argument (`Page$N`, `Page$Next`, ...)
//! and fall back to the link text when the argument carries no page command.
//! Numbered links are followed in ascending order, then a trailing `...`
//! link opening the next window, then a "next" link. Visited page numbers
//! are remembered, so links back to earlier pages (or to the page itself)
//! never cause a revisit, and `max_pages` bounds the walk regardless.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{dedupe_issues, element_text, header_card_title, DiscoveryContext};
use crate::consent::requires_consent;
use crate::error::ScraperError;
use crate::model::IssuerIssue;

/// Element id of the issuer name label above the results grid.
pub const ISSUER_NAME_LABEL_ID: &str = "ctl00_mainContentArea_issuerNameLabel";

// Selector strings are constants; `Selector::parse` only fails on malformed CSS.
static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static INPUT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("input").unwrap());
static POSTBACK_ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"a[href*="__doPostBack"]"#).unwrap());
static ISSUER_NAME_LABEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(&format!("#{}", ISSUER_NAME_LABEL_ID)).unwrap());
static POSTBACK_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"__doPostBack\(\s*'([^']*)'\s*,\s*'([^']*)'\s*\)").unwrap()
});

/// Minimum number of cells in a data row: description, issue date, maturities.
const MIN_DATA_CELLS: usize = 3;

/// Where a pager link leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PagerKind {
    /// A specific page: `Page$N`, or a link whose text is the number.
    Page(u32),
    /// One page past the current one: `Page$Next`, or "Next", ">", "»".
    Next,
    /// A `...` link whose argument names no page.
    Window,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PagerLink {
    target: String,
    argument: String,
    kind: PagerKind,
}

/// One parsed result page.
#[derive(Debug, Default)]
pub(super) struct TablePage {
    issues: Vec<IssuerIssue>,
    pager: Vec<PagerLink>,
    form_fields: Vec<(String, String)>,
}

/// True when the first table on the page has at least one data row.
pub fn has_results_table(doc: &Html) -> bool {
    doc.select(&TABLE)
        .next()
        .map(|table| data_rows(&table).next().is_some())
        .unwrap_or(false)
}

/// Walks every result page reachable from `first` and returns the issues of
/// all of them, in page order.
pub(super) async fn walk(
    ctx: &DiscoveryContext<'_>,
    identifier: &str,
    first: TablePage,
    page_url: &Url,
) -> Result<Vec<IssuerIssue>, ScraperError> {
    let mut current = first;
    let mut current_number = 1u32;
    let mut visited: HashSet<u32> = HashSet::from([1]);
    let mut issues = Vec::new();
    let mut pages_fetched = 1usize;

    loop {
        tracing::debug!(
            "Result page {} for {}: {} issues",
            current_number,
            identifier,
            current.issues.len()
        );
        issues.append(&mut current.issues);

        let Some((number, next)) = next_page_link(&current.pager, &visited, current_number) else {
            break;
        };
        if pages_fetched >= ctx.max_pages {
            tracing::warn!(
                "Stopping pagination for {} after {} pages",
                identifier,
                pages_fetched
            );
            break;
        }

        visited.insert(number);
        current_number = number;
        let fields = build_postback(&current.form_fields, next);
        current = post_page(ctx, identifier, &fields, page_url).await?;
        pages_fetched += 1;
    }

    Ok(dedupe_issues(identifier, issues))
}

/// Submits one postback. An interstitial answer is solved once and the same
/// postback repeated.
async fn post_page(
    ctx: &DiscoveryContext<'_>,
    identifier: &str,
    fields: &[(String, String)],
    page_url: &Url,
) -> Result<TablePage, ScraperError> {
    let mut body = ctx.session.post_form(ctx.page_url, fields).await?;
    if requires_consent(&body) {
        ctx.gate.solve(ctx.session, ctx.page_url).await?;
        body = ctx.session.post_form(ctx.page_url, fields).await?;
        if requires_consent(&body) {
            tracing::error!("Disclaimer still shown for {} after accepting", ctx.page_url);
            return Err(ScraperError::Consent(format!(
                "disclaimer still shown for {} after accepting",
                ctx.page_url
            )));
        }
    }
    Ok(parse_table_page(identifier, &Html::parse_document(&body), page_url))
}

/// Picks the link to follow and the page number it leads to: the lowest
/// unvisited numbered link, else a forward `...` link (one placed after
/// every numbered link), else a "next" link.
fn next_page_link<'a>(
    pager: &'a [PagerLink],
    visited: &HashSet<u32>,
    current: u32,
) -> Option<(u32, &'a PagerLink)> {
    let numbered = pager
        .iter()
        .filter_map(|link| match link.kind {
            PagerKind::Page(n) if !visited.contains(&n) => Some((n, link)),
            _ => None,
        })
        .min_by_key(|(n, _)| *n);
    if numbered.is_some() {
        return numbered;
    }

    let last_number_pos = pager
        .iter()
        .rposition(|link| matches!(link.kind, PagerKind::Page(_)));
    let window = pager
        .iter()
        .enumerate()
        .filter(|(pos, link)| {
            link.kind == PagerKind::Window && last_number_pos.map_or(true, |last| *pos > last)
        })
        .map(|(_, link)| link)
        .last();
    if let Some(link) = window {
        let number = visited.iter().max().copied().unwrap_or(1) + 1;
        return Some((number, link));
    }

    let number = current + 1;
    pager
        .iter()
        .find(|link| link.kind == PagerKind::Next)
        .filter(|_| !visited.contains(&number))
        .map(|link| (number, link))
}

pub(super) fn parse_table_page(identifier: &str, doc: &Html, page_url: &Url) -> TablePage {
    let issuer_name = doc
        .select(&ISSUER_NAME_LABEL)
        .next()
        .map(|label| element_text(&label))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| header_card_title(doc));

    let issues: Vec<IssuerIssue> = doc
        .select(&TABLE)
        .next()
        .map(|table| {
            data_rows(&table)
                .filter_map(|row| parse_row(identifier, &issuer_name, &row, page_url))
                .collect()
        })
        .unwrap_or_default();

    TablePage {
        issues,
        pager: parse_pager(doc),
        form_fields: extract_form_fields(doc),
    }
}

/// Rows after the header row with enough direct cells and no pager links.
fn data_rows<'a>(table: &ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    table
        .select(&ROW)
        .skip(1)
        .filter(|row| row_cells(row).len() >= MIN_DATA_CELLS)
        .filter(|row| row.select(&POSTBACK_ANCHOR).next().is_none())
}

fn row_cells<'a>(row: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| cell.value().name() == "td")
        .collect()
}

fn parse_row(
    identifier: &str,
    issuer_name: &str,
    row: &ElementRef<'_>,
    page_url: &Url,
) -> Option<IssuerIssue> {
    let cells = row_cells(row);
    let description = cells.first()?;

    let link = description
        .select(&ANCHOR)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| page_url.join(href).ok());
    let Some(link) = link else {
        tracing::debug!("Skipping result row without a detail link for {}", identifier);
        return None;
    };
    let Some(issue_id) = issue_id_from_link(&link) else {
        tracing::debug!("Skipping result row with unusable link {} for {}", link, identifier);
        return None;
    };

    let text_at = |i: usize| cells.get(i).map(element_text).unwrap_or_default();
    let state = Some(text_at(3)).filter(|s| !s.is_empty());

    Some(IssuerIssue {
        issuer_name: issuer_name.to_string(),
        issuer_cusip: identifier.to_string(),
        issue_id,
        issue_desc: element_text(description),
        issue_date: text_at(1),
        maturity_dates: text_at(2),
        state,
        link: Some(link.to_string()),
        ..Default::default()
    })
}

/// `id` query value if present, else the last non-empty path segment.
fn issue_id_from_link(link: &Url) -> Option<String> {
    if let Some((_, id)) = link.query_pairs().find(|(key, _)| key == "id") {
        if !id.is_empty() {
            return Some(id.into_owned());
        }
    }
    link.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
}

fn parse_pager(doc: &Html) -> Vec<PagerLink> {
    doc.select(&POSTBACK_ANCHOR)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            let caps = POSTBACK_CALL.captures(href)?;
            let kind = classify_pager_link(&caps[2], &element_text(&anchor))?;
            Some(PagerLink {
                target: caps[1].to_string(),
                argument: caps[2].to_string(),
                kind,
            })
        })
        .collect()
}

/// `None` for links that never lead to an unseen page in order: first,
/// previous and last page links, sort headers and anything unrecognized.
fn classify_pager_link(argument: &str, text: &str) -> Option<PagerKind> {
    if let Some(command) = argument.strip_prefix("Page$") {
        return match command {
            "Next" => Some(PagerKind::Next),
            "First" | "Prev" | "Last" => None,
            n => n.parse().ok().map(PagerKind::Page),
        };
    }
    match text {
        "..." => Some(PagerKind::Window),
        ">" | "»" => Some(PagerKind::Next),
        t if t.to_lowercase().starts_with("next") => Some(PagerKind::Next),
        t => t.parse().ok().map(PagerKind::Page),
    }
}

/// Named hidden and text inputs, which WebForms expects back on every postback.
fn extract_form_fields(doc: &Html) -> Vec<(String, String)> {
    doc.select(&INPUT)
        .filter_map(|input| {
            let name = input.value().attr("name").filter(|n| !n.is_empty())?;
            let kind = input.value().attr("type").unwrap_or("text").to_lowercase();
            if kind != "hidden" && kind != "text" {
                return None;
            }
            let value = input.value().attr("value").unwrap_or_default();
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

/// Form fields with the event target and argument of `link` set.
fn build_postback(fields: &[(String, String)], link: &PagerLink) -> Vec<(String, String)> {
    let mut params = fields.to_vec();
    for (key, value) in [
        ("__EVENTTARGET", &link.target),
        ("__EVENTARGUMENT", &link.argument),
    ] {
        match params.iter_mut().find(|(name, _)| name == key) {
            Some(existing) => existing.1 = value.clone(),
            None => params.push((key.to_string(), value.clone())),
        }
    }
    params
}
