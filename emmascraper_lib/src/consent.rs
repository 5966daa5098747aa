//! Terms-of-use interstitial handling.
//!
//! The portal answers any page request from a session that has not accepted
//! its disclaimer with an interstitial carrying an "accept" button. The gate
//! detects it, has a [`ConsentSolver`] click through in a real browser, copies
//! the resulting cookies into the HTTP [`Session`] and replays the request.
//! Nothing remembers that consent was given: if the interstitial shows up
//! again later, the click-through runs again.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use emma_api::types::SessionCookie;
use emma_api::Session;
use regex::Regex;

use crate::browser::create_browser;
use crate::error::ScraperError;

/// Element id of the disclaimer's accept button.
pub const CONSENT_BUTTON_ID: &str = "ctl00_mainContentArea_disclaimerContent_yesButton";

// Raw-text match; consumers parse the page themselves.
static CONSENT_BUTTON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r#"(?i)<input\b[^>]*\sid\s*=\s*["']?{}\b"#, CONSENT_BUTTON_ID)).unwrap()
});

/// Obtains consent cookies for `link` by some means outside the HTTP session.
pub trait ConsentSolver: Send + Sync {
    /// Accepts the disclaimer shown at `link` and returns every cookie the
    /// accepting session ended up with. Blocking.
    fn solve(&self, link: &str) -> Result<Vec<SessionCookie>, ScraperError>;
}

/// Clicks the accept button in headless Chrome.
pub struct ChromeConsentSolver {
    button_id: String,
    settle: Duration,
}

impl Default for ChromeConsentSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ChromeConsentSolver {
    pub fn new() -> Self {
        Self {
            button_id: CONSENT_BUTTON_ID.to_string(),
            settle: Duration::from_millis(500),
        }
    }
}

impl ConsentSolver for ChromeConsentSolver {
    fn solve(&self, link: &str) -> Result<Vec<SessionCookie>, ScraperError> {
        let browser = create_browser()?;
        let tab = browser
            .new_tab()
            .map_err(|e| ScraperError::Consent(format!("Failed to create tab: {}", e)))?;

        tab.navigate_to(link)
            .map_err(|e| ScraperError::Consent(format!("Navigation failed: {}", e)))?;
        tab.wait_until_navigated()
            .map_err(|e| ScraperError::Consent(format!("Page load failed: {}", e)))?;

        let button = tab
            .wait_for_element(&format!("#{}", self.button_id))
            .map_err(|e| ScraperError::Consent(format!("Accept button not found: {}", e)))?;
        button
            .click()
            .map_err(|e| ScraperError::Consent(format!("Failed to click accept: {}", e)))?;

        // The click posts the form back; wait for the reload before reading cookies.
        tab.wait_until_navigated()
            .map_err(|e| ScraperError::Consent(format!("Post-accept load failed: {}", e)))?;
        std::thread::sleep(self.settle);

        let cookies = tab
            .get_cookies()
            .map_err(|e| ScraperError::Consent(format!("Failed to read cookies: {}", e)))?;

        Ok(cookies
            .into_iter()
            .map(|c| SessionCookie {
                name: c.name,
                value: c.value,
            })
            .collect())
    }
}

/// True when `html` is the disclaimer interstitial.
pub fn requires_consent(html: &str) -> bool {
    CONSENT_BUTTON.is_match(html)
}

/// Applies consent to pages fetched through a [`Session`].
#[derive(Clone)]
pub struct ConsentGate {
    solver: Arc<dyn ConsentSolver>,
}

impl ConsentGate {
    pub fn new(solver: Arc<dyn ConsentSolver>) -> Self {
        Self { solver }
    }

    /// GETs `link` and passes the page through the gate.
    pub async fn fetch(&self, session: &Session, link: &str) -> Result<String, ScraperError> {
        let page = session.get_html(link).await?;
        self.pass(session, link, page).await
    }

    /// Returns `page` untouched unless it is the interstitial. Otherwise
    /// solves consent for `link`, re-fetches it and returns the fresh page.
    ///
    /// Fails if the re-fetched page is still the interstitial.
    pub async fn pass(
        &self,
        session: &Session,
        link: &str,
        page: String,
    ) -> Result<String, ScraperError> {
        if !requires_consent(&page) {
            return Ok(page);
        }

        tracing::info!("Agreeing the terms of use - please wait...");
        self.solve(session, link).await?;

        let page = session.get_html(link).await?;
        if requires_consent(&page) {
            tracing::error!("Disclaimer still shown for {} after accepting", link);
            return Err(ScraperError::Consent(format!(
                "disclaimer still shown for {} after accepting",
                link
            )));
        }
        tracing::info!("Done, now let's get back to the scraping process.");
        Ok(page)
    }

    /// Runs the solver for `link` and stores the cookies it returns in the
    /// session.
    pub async fn solve(&self, session: &Session, link: &str) -> Result<(), ScraperError> {
        let solver = Arc::clone(&self.solver);
        let target = link.to_string();
        let cookies = tokio::task::spawn_blocking(move || solver.solve(&target))
            .await
            .map_err(|e| ScraperError::Consent(format!("Consent task panicked: {}", e)))??;

        tracing::debug!("Consent yielded {} cookies for {}", cookies.len(), link);
        session.add_cookies(link, &cookies)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const DISCLAIMER: &str = r#"<html><body><form>
        <p>Terms of use</p>
        <input type="submit" id="ctl00_mainContentArea_disclaimerContent_yesButton" value="Accept" />
    </form></body></html>"#;

    struct FakeSolver {
        calls: AtomicUsize,
        fail: bool,
    }

    impl FakeSolver {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }
    }

    impl ConsentSolver for FakeSolver {
        fn solve(&self, _link: &str) -> Result<Vec<SessionCookie>, ScraperError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ScraperError::Consent("browser crashed".into()));
            }
            Ok(vec![SessionCookie {
                name: "Disclaimer".into(),
                value: "yes".into(),
            }])
        }
    }

    #[test]
    fn detects_interstitial() {
        assert!(requires_consent(DISCLAIMER));
        assert!(!requires_consent("<html><body><h3>Issuer</h3></body></html>"));
        assert!(!requires_consent(r#"<div id="ctl00_mainContentArea_disclaimerContent_yesButton"></div>"#));
        assert!(!requires_consent(
            r#"<input data-id="ctl00_mainContentArea_disclaimerContent_yesButton" />"#
        ));
        assert!(requires_consent(
            "<INPUT type=submit value=Accept\n id=ctl00_mainContentArea_disclaimerContent_yesButton>"
        ));
    }

    #[tokio::test]
    async fn pass_returns_page_unchanged_without_interstitial() {
        let solver = Arc::new(FakeSolver::new());
        let gate = ConsentGate::new(solver.clone());
        let session = Session::with_base_url("http://127.0.0.1:9").unwrap();

        let page = "<html><h3>Issuer</h3></html>".to_string();
        let out = gate
            .pass(&session, "http://127.0.0.1:9/x", page.clone())
            .await
            .unwrap();

        assert_eq!(out, page);
        assert_eq!(solver.calls.load(Ordering::SeqCst), 0);
        assert!(session.cookie_header("http://127.0.0.1:9/x").is_none());
    }

    #[tokio::test]
    async fn fetch_solves_and_replays() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/IssueView/Details/EP1"))
            .and(header("cookie", "Disclaimer=yes"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><h3>Real page</h3></html>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/IssueView/Details/EP1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(DISCLAIMER))
            .mount(&server)
            .await;

        let solver = Arc::new(FakeSolver::new());
        let gate = ConsentGate::new(solver.clone());
        let session = Session::with_base_url(&server.uri()).unwrap();
        let link = format!("{}/IssueView/Details/EP1", server.uri());

        let page = gate.fetch(&session, &link).await.unwrap();
        assert!(page.contains("Real page"));
        assert_eq!(solver.calls.load(Ordering::SeqCst), 1);

        // Cookie stays in the jar: a second fetch needs no click-through.
        let page = gate.fetch(&session, &link).await.unwrap();
        assert!(page.contains("Real page"));
        assert_eq!(solver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn solver_failure_is_fatal() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/IssueView/Details/EP1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(DISCLAIMER))
            .mount(&server)
            .await;

        let gate = ConsentGate::new(Arc::new(FakeSolver::failing()));
        let session = Session::with_base_url(&server.uri()).unwrap();
        let link = format!("{}/IssueView/Details/EP1", server.uri());

        let result = gate.fetch(&session, &link).await;
        assert!(matches!(result, Err(ScraperError::Consent(_))));
    }

    #[tokio::test]
    async fn interstitial_after_accept_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/IssueView/Details/EP1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(DISCLAIMER))
            .mount(&server)
            .await;

        let solver = Arc::new(FakeSolver::new());
        let gate = ConsentGate::new(solver.clone());
        let session = Session::with_base_url(&server.uri()).unwrap();
        let link = format!("{}/IssueView/Details/EP1", server.uri());

        let result = gate.fetch(&session, &link).await;
        assert!(matches!(result, Err(ScraperError::Consent(_))));
        assert_eq!(solver.calls.load(Ordering::SeqCst), 1);
    }
}
