//! Loading the CUSIP list that drives the crawl.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::ScraperError;

/// Default identifier file name, resolved against the working directory.
pub const DEFAULT_IDENTIFIER_FILE: &str = "cusips.txt";

/// Reads one identifier per line, trimmed, blanks dropped, duplicates removed
/// (first occurrence wins).
///
/// When the file does not exist an empty one is created in its place and
/// [`ScraperError::MissingIdentifierFile`] is returned so the operator can
/// fill it in before the next run.
pub fn load_identifiers(path: &Path) -> Result<Vec<String>, ScraperError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::error!(
                "The file {} was not found. The file will be created. Please, put the list of CUSIPs there.",
                path.display()
            );
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::File::create(path)?;
            return Err(ScraperError::MissingIdentifierFile {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    Ok(parse_identifiers(&contents))
}

/// Splits newline-delimited text into unique, non-empty identifiers.
pub fn parse_identifiers(contents: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert(line.to_string()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_drops_blanks_and_duplicates() {
        let ids = parse_identifiers("ABC123\n\n  ABC123  \r\nXYZ999\n   \n");
        assert_eq!(ids, vec!["ABC123", "XYZ999"]);
    }

    #[test]
    fn parse_empty_input() {
        assert!(parse_identifiers("").is_empty());
        assert!(parse_identifiers("\n \n\t\n").is_empty());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cusips.txt");
        fs::write(&path, "ABC123\nABC123\nXYZ999\n").unwrap();

        let ids = load_identifiers(&path).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"ABC123".to_string()));
        assert!(ids.contains(&"XYZ999".to_string()));
    }

    #[test]
    fn load_missing_file_creates_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cusips.txt");

        let err = load_identifiers(&path).unwrap_err();
        assert!(matches!(err, ScraperError::MissingIdentifierFile { .. }));
        assert!(path.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }
}
