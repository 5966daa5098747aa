//! Issue summaries embedded in the issuer landing page.

use serde::{Deserialize, Serialize};

use super::text::lenient_text;

/// One element of the `pdata.issuerIssuesJson` array on an issuer page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueSummary {
    /// Opaque issue identifier used by the detail page and final scale feed.
    #[serde(rename = "IID", deserialize_with = "lenient_text")]
    pub issue_id: String,

    /// Free-text issue description.
    #[serde(rename = "IDES", default, deserialize_with = "lenient_text")]
    pub description: String,

    /// Dated date of the issue.
    #[serde(rename = "DDT", default, deserialize_with = "lenient_text")]
    pub dated_date: String,

    /// Maturity date range, e.g. `01/01/2020 - 01/01/2040`.
    #[serde(rename = "MDR", default, deserialize_with = "lenient_text")]
    pub maturity_range: String,
}
