//! Records produced by the crawl.

use std::collections::HashSet;

/// Fixed issuer dataset columns, in export order. Label columns follow.
pub const ISSUER_COLUMNS: &[&str] = &[
    "issuer_name",
    "issuer_cusip",
    "issue_id",
    "issue_desc",
    "issue_date",
    "maturity_dates",
    "state",
    "issue_desc2",
    "issue_desc3",
];

/// Fixed pricing dataset columns, in export order. Label columns follow.
pub const PRICING_COLUMNS: &[&str] = &[
    "issue_id",
    "cusip",
    "principal_amount_at_issuance",
    "security_description",
    "coupon",
    "maturity_date",
    "price_or_yield",
    "price",
    "yield",
    "fitch",
    "kbra",
    "moody",
    "s&p",
];

/// Insertion-ordered string map. Used both for scraped label/value pairs and
/// for the flat rows handed to the exporter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`. An existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// Cleaned label → cleaned value pairs scraped from one issue detail page.
pub type LabelValueMap = Record;

/// One issue discovered under an issuer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssuerIssue {
    pub issuer_name: String,
    /// The CUSIP the issue was discovered from.
    pub issuer_cusip: String,
    /// Opaque id used to build the detail page and final scale URLs.
    pub issue_id: String,
    pub issue_desc: String,
    pub issue_date: String,
    pub maturity_dates: String,
    pub state: Option<String>,
    /// Absolute detail-page link when discovery captured one.
    pub link: Option<String>,
    /// Header card `h3` of the detail page.
    pub issue_desc2: String,
    /// Header card `h5` of the detail page.
    pub issue_desc3: String,
    /// Labels vary issue-to-issue; reconciled by [`crate::normalize`].
    pub additional_fields: LabelValueMap,
}

impl IssuerIssue {
    /// Fixed columns only. Label columns are added during normalization.
    pub fn base_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("issuer_name", self.issuer_name.as_str());
        record.insert("issuer_cusip", self.issuer_cusip.as_str());
        record.insert("issue_id", self.issue_id.as_str());
        record.insert("issue_desc", self.issue_desc.as_str());
        record.insert("issue_date", self.issue_date.as_str());
        record.insert("maturity_dates", self.maturity_dates.as_str());
        record.insert("state", self.state.as_deref().unwrap_or_default());
        record.insert("issue_desc2", self.issue_desc2.as_str());
        record.insert("issue_desc3", self.issue_desc3.as_str());
        record
    }
}

/// One security of an issue's final scale, with the issue's labels attached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricingDetailRow {
    /// Parent [`IssuerIssue::issue_id`].
    pub issue_id: String,
    /// Nine-character CUSIP.
    pub cusip: String,
    pub principal_amount_at_issuance: String,
    pub security_description: String,
    pub coupon: String,
    pub maturity_date: String,
    pub price_or_yield: String,
    pub price: String,
    pub yield_rate: String,
    pub labels: LabelValueMap,
}

impl PricingDetailRow {
    /// Fixed columns only. Rating columns are always empty: the feed's
    /// rating fields are not read.
    pub fn base_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("issue_id", self.issue_id.as_str());
        record.insert("cusip", self.cusip.as_str());
        record.insert(
            "principal_amount_at_issuance",
            self.principal_amount_at_issuance.as_str(),
        );
        record.insert("security_description", self.security_description.as_str());
        record.insert("coupon", self.coupon.as_str());
        record.insert("maturity_date", self.maturity_date.as_str());
        record.insert("price_or_yield", self.price_or_yield.as_str());
        record.insert("price", self.price.as_str());
        record.insert("yield", self.yield_rate.as_str());
        record.insert("fitch", "");
        record.insert("kbra", "");
        record.insert("moody", "");
        record.insert("s&p", "");
        record
    }
}

/// Every label key seen across all issues, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ColumnSuperset {
    columns: Vec<String>,
    seen: HashSet<String>,
}

impl ColumnSuperset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every key of `labels` not seen before.
    pub fn observe(&mut self, labels: &LabelValueMap) {
        for key in labels.keys() {
            if self.seen.insert(key.to_string()) {
                self.columns.push(key.to_string());
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
