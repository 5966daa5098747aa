//! Cookies carried between the browser automation and the HTTP session.

/// A name/value cookie pair harvested from a browser session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
}
