//! Loader for the published-pages list produced by `hugo list published`.
use std::fs::File;
use std::io;
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

/// Columns expected in every row of the list.
pub const FIELDS_PER_ROW: usize = 10;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed input: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed input: row {row} has {found} fields, expected 10")]
    RowArity { row: usize, found: usize },
    #[error("malformed input: row {row}: invalid timestamp {value:?}: {source}")]
    Timestamp {
        row: usize,
        value: String,
        source: chrono::ParseError,
    },
    #[error("malformed input: row {row}: invalid boolean {value:?}")]
    Bool { row: usize, value: String },
}

/// One published page from the list. Immutable once loaded; identified by
/// `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: String,
    pub slug: String,
    pub title: String,
    pub date: Option<DateTime<FixedOffset>>,
    pub expiry_date: Option<DateTime<FixedOffset>>,
    pub publish_date: Option<DateTime<FixedOffset>>,
    pub draft: bool,
    pub url: String,
    pub kind: String,
    pub section: String,
}

/// Load candidates from the named CSV file, or stdin when no path is given.
pub fn load_source(path: Option<&Path>) -> Result<Vec<Candidate>, LoadError> {
    match path {
        Some(path) => load(File::open(path)?),
        None => load(io::stdin().lock()),
    }
}

/// Parse the 10-column CSV into candidates. The header row is skipped; any
/// malformed row fails the whole load, producing no partial results.
pub fn load<R: io::Read>(reader: R) -> Result<Vec<Candidate>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut candidates = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        // row 1 is the header
        let row = index + 2;
        if record.len() != FIELDS_PER_ROW {
            return Err(LoadError::RowArity {
                row,
                found: record.len(),
            });
        }

        candidates.push(Candidate {
            path: record[0].to_string(),
            slug: record[1].to_string(),
            title: record[2].to_string(),
            date: parse_timestamp(&record[3], row)?,
            expiry_date: parse_timestamp(&record[4], row)?,
            publish_date: parse_timestamp(&record[5], row)?,
            draft: parse_bool(&record[6], row)?,
            url: record[7].to_string(),
            kind: record[8].to_string(),
            section: record[9].to_string(),
        });
    }

    Ok(candidates)
}

/// RFC 3339 timestamp; an empty field is not an error, just absent.
fn parse_timestamp(value: &str, row: usize) -> Result<Option<DateTime<FixedOffset>>, LoadError> {
    if value.is_empty() {
        return Ok(None);
    }
    DateTime::parse_from_rfc3339(value)
        .map(Some)
        .map_err(|source| LoadError::Timestamp {
            row,
            value: value.to_string(),
            source,
        })
}

fn parse_bool(value: &str, row: usize) -> Result<bool, LoadError> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(LoadError::Bool {
            row,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "path,slug,title,date,expiryDate,publishDate,draft,permalink,kind,section\n";

    fn with_header(rows: &str) -> String {
        format!("{HEADER}{rows}")
    }

    #[test]
    fn load_parses_rows_in_order() {
        let input = with_header(
            "posts/a.md,a,Hello World,2024-01-01T00:00:00Z,,2024-01-01T00:00:00Z,false,https://x/a,page,posts\n\
             posts/b.md,b,Second,2024-02-01T12:30:00+02:00,,,true,https://x/b,page,posts\n",
        );
        let candidates = load(input.as_bytes()).unwrap();
        assert_eq!(candidates.len(), 2);

        let first = &candidates[0];
        assert_eq!(first.path, "posts/a.md");
        assert_eq!(first.title, "Hello World");
        assert_eq!(
            first.date.unwrap().to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );
        assert_eq!(first.expiry_date, None);
        assert!(!first.draft);

        let second = &candidates[1];
        assert!(second.draft);
        assert_eq!(
            second.date.unwrap().to_rfc3339(),
            "2024-02-01T12:30:00+02:00"
        );
    }

    #[test]
    fn load_handles_quoted_titles() {
        let input =
            with_header("posts/a.md,a,\"Hello, World\",,,,false,https://x/a,page,posts\n");
        let candidates = load(input.as_bytes()).unwrap();
        assert_eq!(candidates[0].title, "Hello, World");
    }

    #[test]
    fn short_row_fails_whole_load() {
        let input = with_header(
            "posts/a.md,a,Hello,,,,false,https://x/a,page,posts\n\
             posts/b.md,b,Nine,,,,false,https://x/b,page\n",
        );
        let err = load(input.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::RowArity { row: 3, found: 9 }));
    }

    #[test]
    fn bad_timestamp_fails_load() {
        let input =
            with_header("posts/a.md,a,Hello,not-a-date,,,false,https://x/a,page,posts\n");
        let err = load(input.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Timestamp { row: 2, .. }));
    }

    #[test]
    fn bad_boolean_fails_load() {
        let input = with_header("posts/a.md,a,Hello,,,,maybe,https://x/a,page,posts\n");
        let err = load(input.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Bool { row: 2, .. }));
    }

    #[test]
    fn accepts_go_style_boolean_tokens() {
        for token in ["1", "t", "T", "TRUE", "true", "True"] {
            assert!(parse_bool(token, 2).unwrap());
        }
        for token in ["0", "f", "F", "FALSE", "false", "False"] {
            assert!(!parse_bool(token, 2).unwrap());
        }
        assert!(parse_bool("yes", 2).is_err());
    }

    #[test]
    fn empty_input_with_header_yields_no_candidates() {
        let candidates = load(HEADER.as_bytes()).unwrap();
        assert!(candidates.is_empty());
    }
}
