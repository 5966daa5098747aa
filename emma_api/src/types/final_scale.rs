//! Rows of the per-issue final scale feed.

use serde::{Deserialize, Serialize};

use super::text::lenient_text;

/// One security of an issue as served by `/IssueView/GetFinalScaleData`.
///
/// The feed also carries `FitchRateEnc`, `KrollRateEnc`, `MoodyRateEnc` and
/// `SnpRateEnc`; those are not read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalScaleEntry {
    /// Nine-character CUSIP of the security.
    #[serde(rename = "cusip9", default, deserialize_with = "lenient_text")]
    pub cusip9: String,

    #[serde(rename = "MatPrinTxt", default, deserialize_with = "lenient_text")]
    pub principal_amount: String,

    #[serde(rename = "SecurityDescription", default, deserialize_with = "lenient_text")]
    pub security_description: String,

    /// Coupon rate, usually suffixed with `%`.
    #[serde(rename = "IntRateTxt", default, deserialize_with = "lenient_text")]
    pub coupon: String,

    #[serde(rename = "MatDtTxt", default, deserialize_with = "lenient_text")]
    pub maturity_date: String,

    /// Whether the offering was priced by price or by yield.
    #[serde(rename = "IOPTxt", default, deserialize_with = "lenient_text")]
    pub price_or_yield: String,

    #[serde(rename = "NiidsIOPTxt", default, deserialize_with = "lenient_text")]
    pub price: String,

    #[serde(rename = "NiidsIOYTxt", default, deserialize_with = "lenient_text")]
    pub yield_rate: String,
}
