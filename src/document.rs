//! Page document codec: TOML front matter between `+++` delimiter lines,
//! followed by free-form Markdown body.
use thiserror::Error;
use toml::{Table, Value};

/// Delimiter line bounding the front-matter region.
pub const FRONT_MATTER_DELIMITER: &str = "+++";

const PARAMS_KEY: &str = "params";
const ANNOUNCEMENT_URI_KEY: &str = "announcement-uri";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed front matter: {0}")]
    MalformedMetadata(#[from] toml::de::Error),
    #[error("front matter serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// A page split into its metadata table and body text.
///
/// Decoding normalizes whitespace per line; body content is otherwise kept
/// verbatim. `decode(doc.encode()?)` reproduces `meta` and `body` exactly for
/// any document `decode` could have produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PageDocument {
    pub meta: Table,
    pub body: String,
}

impl PageDocument {
    /// Split raw page text into front matter and body.
    ///
    /// The first two `+++` lines bound the metadata region; lines before the
    /// opening delimiter are dropped. A page with fewer than two delimiter
    /// lines decodes as empty metadata with the whole input as body, nothing
    /// discarded.
    pub fn decode(raw: &str) -> Result<PageDocument, DocumentError> {
        let mut found_top = false;
        let mut found_bottom = false;
        let mut meta_lines: Vec<&str> = Vec::new();
        let mut body_lines: Vec<&str> = Vec::new();

        for line in raw.lines() {
            let line = line.trim();
            if line == FRONT_MATTER_DELIMITER {
                if !found_top {
                    found_top = true;
                    continue;
                }
                if !found_bottom {
                    found_bottom = true;
                    continue;
                }
            }

            if found_top && !found_bottom {
                meta_lines.push(line);
                continue;
            }
            if found_bottom {
                body_lines.push(line);
            }
        }

        if !(found_top && found_bottom) {
            let body_lines: Vec<&str> = raw.lines().map(str::trim).collect();
            return Ok(PageDocument {
                meta: Table::new(),
                body: join_body(body_lines),
            });
        }

        let meta: Table = meta_lines.join("\n").parse()?;
        Ok(PageDocument {
            meta,
            body: join_body(body_lines),
        })
    }

    /// Serialize back to the on-disk form: delimiter, metadata, blank line,
    /// delimiter, blank line, body.
    pub fn encode(&self) -> Result<String, DocumentError> {
        let meta = toml::to_string(&self.meta)?;
        Ok(format!(
            "{FRONT_MATTER_DELIMITER}\n{meta}\n{FRONT_MATTER_DELIMITER}\n\n{}\n",
            self.body
        ))
    }

    /// Non-empty announcement marker at `params.announcement-uri`, if set.
    pub fn announcement_uri(&self) -> Option<&str> {
        self.meta
            .get(PARAMS_KEY)?
            .as_table()?
            .get(ANNOUNCEMENT_URI_KEY)?
            .as_str()
            .filter(|uri| !uri.is_empty())
    }

    /// Record the announcement marker, creating the `params` table if needed.
    pub fn set_announcement_uri(&mut self, uri: &str) {
        let params = self
            .meta
            .entry(PARAMS_KEY)
            .or_insert_with(|| Value::Table(Table::new()));
        if !params.is_table() {
            *params = Value::Table(Table::new());
        }
        if let Value::Table(table) = params {
            table.insert(
                ANNOUNCEMENT_URI_KEY.to_string(),
                Value::String(uri.to_string()),
            );
        }
    }
}

fn join_body(mut lines: Vec<&str>) -> String {
    let leading_blank = lines.iter().take_while(|l| l.is_empty()).count();
    lines.drain(..leading_blank);
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "+++\ntitle = \"Hello World\"\ndate = \"2024-01-01\"\n\n+++\n\nSome body text.\n\nMore body.\n";

    #[test]
    fn decode_splits_meta_and_body() {
        let doc = PageDocument::decode(SAMPLE).unwrap();
        assert_eq!(doc.meta["title"].as_str(), Some("Hello World"));
        assert_eq!(doc.body, "Some body text.\n\nMore body.");
    }

    #[test]
    fn decode_discards_lines_before_opening_delimiter() {
        let doc = PageDocument::decode("junk\n+++\na = 1\n+++\nbody\n").unwrap();
        assert_eq!(doc.meta["a"].as_integer(), Some(1));
        assert_eq!(doc.body, "body");
    }

    #[test]
    fn decode_without_delimiters_keeps_whole_file_as_body() {
        let doc = PageDocument::decode("no front matter here\njust text\n").unwrap();
        assert!(doc.meta.is_empty());
        assert_eq!(doc.body, "no front matter here\njust text");
    }

    #[test]
    fn decode_single_stray_delimiter_loses_nothing() {
        let doc = PageDocument::decode("leading text\n+++\ntrailing text\n").unwrap();
        assert!(doc.meta.is_empty());
        assert_eq!(doc.body, "leading text\n+++\ntrailing text");
    }

    #[test]
    fn decode_rejects_invalid_toml() {
        let err = PageDocument::decode("+++\nnot = valid = toml\n+++\nbody\n").unwrap_err();
        assert!(matches!(err, DocumentError::MalformedMetadata(_)));
    }

    #[test]
    fn delimiter_lines_in_body_are_plain_text() {
        let doc = PageDocument::decode("+++\na = 1\n+++\nbody\n+++\nmore\n").unwrap();
        assert_eq!(doc.body, "body\n+++\nmore");
    }

    #[test]
    fn round_trip_preserves_meta_and_body() {
        let doc = PageDocument::decode(SAMPLE).unwrap();
        let encoded = doc.encode().unwrap();
        let again = PageDocument::decode(&encoded).unwrap();
        assert_eq!(again, doc);
    }

    #[test]
    fn round_trip_with_nested_params_table() {
        let mut doc = PageDocument::decode(SAMPLE).unwrap();
        doc.set_announcement_uri("at://did:plc:abc/key");
        let again = PageDocument::decode(&doc.encode().unwrap()).unwrap();
        assert_eq!(again, doc);
        assert_eq!(again.announcement_uri(), Some("at://did:plc:abc/key"));
    }

    #[test]
    fn announcement_uri_absent_or_empty_is_none() {
        let doc = PageDocument::decode(SAMPLE).unwrap();
        assert_eq!(doc.announcement_uri(), None);

        let doc =
            PageDocument::decode("+++\n[params]\nannouncement-uri = \"\"\n+++\nbody\n").unwrap();
        assert_eq!(doc.announcement_uri(), None);
    }

    #[test]
    fn set_announcement_uri_creates_params_table() {
        let mut doc = PageDocument::decode("+++\ntitle = \"t\"\n+++\nbody\n").unwrap();
        doc.set_announcement_uri("at://x");
        assert_eq!(doc.announcement_uri(), Some("at://x"));
    }

    #[test]
    fn set_announcement_uri_keeps_existing_params_keys() {
        let mut doc =
            PageDocument::decode("+++\n[params]\nauthor = \"josh\"\n+++\nbody\n").unwrap();
        doc.set_announcement_uri("at://x");
        assert_eq!(doc.meta["params"]["author"].as_str(), Some("josh"));
        assert_eq!(doc.announcement_uri(), Some("at://x"));
    }
}
