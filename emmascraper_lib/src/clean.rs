//! Best-effort text cleaning for scraped values and labels.

/// Removes `*` and `%` markers and surrounding whitespace. Idempotent.
pub fn clean_text(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '*' && *c != '%')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Turns a detail-page label such as `"Dated Date:"` into a column name
/// such as `"dated_date"`.
pub fn format_as_header(text: &str) -> String {
    clean_text(text)
        .to_lowercase()
        .replace(':', "")
        .replace(' ', "_")
}

/// Collapses runs of whitespace (including the newlines scraped HTML text
/// nodes carry) into single spaces.
pub fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
