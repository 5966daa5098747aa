//! Reconciling per-issue label sets into uniform export rows.
//!
//! Each issue carries whichever labels its detail page happened to list. Once
//! the crawl is over the [`ColumnSuperset`] knows every label seen, and every
//! row is widened to fixed columns followed by the whole superset.

use crate::model::{ColumnSuperset, IssuerIssue, LabelValueMap, PricingDetailRow, Record};

/// Flattens issues into rows with the fixed issuer columns plus every
/// superset column. Labels an issue lacks become empty strings.
pub fn normalize_issuers(issues: Vec<IssuerIssue>, superset: &ColumnSuperset) -> Vec<Record> {
    issues
        .into_iter()
        .map(|issue| widen(issue.base_record(), &issue.additional_fields, superset))
        .collect()
}

/// Same as [`normalize_issuers`] for pricing rows, against the same superset.
pub fn normalize_pricing(rows: Vec<PricingDetailRow>, superset: &ColumnSuperset) -> Vec<Record> {
    rows.into_iter()
        .map(|row| widen(row.base_record(), &row.labels, superset))
        .collect()
}

// A label named like a fixed column overwrites it; an absent one leaves it be.
fn widen(mut record: Record, labels: &LabelValueMap, superset: &ColumnSuperset) -> Record {
    for key in superset.iter() {
        match labels.get(key) {
            Some(value) => record.insert(key, value),
            None if !record.contains_key(key) => record.insert(key, ""),
            None => {}
        }
    }
    record
}
