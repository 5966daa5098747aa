//! Cookie-carrying HTTP session for the EMMA portal.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use url::Url;

use crate::{
    types::{FinalScaleEntry, SessionCookie},
    user_agent::get_user_agent,
    Error,
};

/// Production portal root.
pub const DEFAULT_BASE_URL: &str = "https://emma.msrb.org";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Explicit session context passed to every page and feed fetch.
///
/// One `reqwest::Client` is reused for the whole crawl and shares a cookie
/// jar with the session, so cookies set by the portal (or harvested by a
/// consent click-through via [`Session::add_cookies`]) ride along on every
/// later request.
pub struct Session {
    /// Base URL for the portal. Defaults to `https://emma.msrb.org`.
    base_url: String,
    http: reqwest::Client,
    jar: Arc<Jar>,
}

impl Session {
    /// Creates a session pointing at the production portal.
    pub fn new() -> Result<Self, Error> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a session with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .user_agent(get_user_agent())
            .cookie_provider(Arc::clone(&jar))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            jar,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issuer landing page for one CUSIP.
    pub fn issuer_url(&self, cusip: &str) -> Result<Url, Error> {
        let mut url = Url::parse(&format!("{}/IssuerView/IssuerDetails.aspx", self.base_url))?;
        url.query_pairs_mut().append_pair("cusip", cusip);
        Ok(url)
    }

    /// Detail page for one issue.
    pub fn issue_details_url(&self, issue_id: &str) -> Result<Url, Error> {
        let mut url = Url::parse(&format!("{}/IssueView/Details/", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push(issue_id);
        Ok(url)
    }

    /// Final scale (pricing) feed for one issue.
    pub fn final_scale_url(&self, issue_id: &str) -> Result<Url, Error> {
        let mut url = Url::parse(&format!("{}/IssueView/GetFinalScaleData", self.base_url))?;
        url.query_pairs_mut().append_pair("id", issue_id);
        Ok(url)
    }

    /// GETs an HTML page and returns its body.
    pub async fn get_html(&self, url: &str) -> Result<String, Error> {
        let resp = self
            .http
            .get(url)
            .header("accept", "text/html,application/xhtml+xml")
            .header("accept-language", "en-US,en;q=0.9")
            .header("cache-control", "no-cache")
            .header("pragma", "no-cache")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to get page {}: {}", url, e);
                Error::Request(e)
            })?;
        read_body(resp).await
    }

    /// Submits a form back to `url` (an ASP.NET postback) and returns the
    /// resulting HTML page.
    pub async fn post_form(&self, url: &str, fields: &[(String, String)]) -> Result<String, Error> {
        let resp = self
            .http
            .post(url)
            .header("accept", "text/html,application/xhtml+xml")
            .header("origin", self.base_url.as_str())
            .header("referer", url)
            .form(fields)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to post form to {}: {}", url, e);
                Error::Request(e)
            })?;
        read_body(resp).await
    }

    /// Fetches and decodes the final scale feed of one issue.
    pub async fn get_final_scale(&self, issue_id: &str) -> Result<Vec<FinalScaleEntry>, Error> {
        let url = self.final_scale_url(issue_id)?;
        let resp = self
            .http
            .get(url.as_str())
            .header("accept", "application/json, text/plain, */*")
            .header("x-requested-with", "XMLHttpRequest")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to get final scale for {}: {}", issue_id, e);
                Error::Request(e)
            })?;
        let body = read_body(resp).await?;

        let parsed = serde_json::from_str::<Vec<FinalScaleEntry>>(&body).map_err(|e| {
            tracing::error!(
                "Failed to parse final scale for {}: {} | body: {}",
                issue_id,
                e,
                truncate_body(&body)
            );
            Error::Parse(e)
        })?;
        Ok(parsed)
    }

    /// Stores cookies harvested outside this session (e.g. by a browser) so
    /// they are sent on every later request to `url`'s host.
    pub fn add_cookies(&self, url: &str, cookies: &[SessionCookie]) -> Result<(), Error> {
        let url = Url::parse(url)?;
        for cookie in cookies {
            // Path=/ so the cookie covers issuer pages, detail pages and feeds alike.
            self.jar
                .add_cookie_str(&format!("{}={}; Path=/", cookie.name, cookie.value), &url);
        }
        Ok(())
    }

    /// The `Cookie` header this session would send to `url`.
    pub fn cookie_header(&self, url: &str) -> Option<String> {
        let url = Url::parse(url).ok()?;
        self.jar
            .cookies(&url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }
}

async fn read_body(resp: reqwest::Response) -> Result<String, Error> {
    let status = resp.status();
    let body = resp.text().await.map_err(|e| {
        tracing::error!("Failed to read response body: {}", e);
        Error::Request(e)
    })?;

    if !status.is_success() {
        let snippet = truncate_body(&body);
        tracing::error!("Request failed with status {}: {}", status, snippet);
        return Err(Error::HttpStatus {
            status: status.as_u16(),
            body: snippet,
        });
    }

    Ok(body)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
