//! Lenient text decoding for portal payloads.
//!
//! The portal serializes the same field as a string, a number or `null`
//! depending on the record, so every text field is read through here.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}
