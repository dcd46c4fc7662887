//! Announcement marker state, persisted inside each page's front matter.
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::warn;

use crate::candidates::Candidate;
use crate::document::{DocumentError, PageDocument};

#[derive(Debug, Error)]
pub enum MarkError {
    #[error("announcement marker already set for {path}")]
    AlreadyMarked { path: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("failed to persist {path}: {source}")]
    Persist {
        path: String,
        source: tempfile::PersistError,
    },
}

/// Lookup and mutation of the per-page "already announced" state. The
/// filter/compose/publish logic only sees this interface, so the backing
/// store can change without touching the pipeline.
pub trait MarkerStore: Send + Sync {
    /// Whether the candidate already carries an announcement marker. Read or
    /// decode failures answer `false`: a broken page must never silently
    /// suppress an announcement.
    fn is_marked(&self, candidate: &Candidate) -> bool;

    /// Record the platform identifier in the candidate's page. Fails with
    /// [`MarkError::AlreadyMarked`] if a marker is present, leaving the page
    /// untouched.
    fn set_marked(&self, candidate: &Candidate, uri: &str) -> Result<(), MarkError>;
}

/// Marker store over the site's content tree; candidate paths resolve
/// relative to `content_root`.
#[derive(Debug, Clone)]
pub struct FrontMatterStore {
    content_root: PathBuf,
}

impl FrontMatterStore {
    pub fn new(content_root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
        }
    }

    fn resolve(&self, candidate: &Candidate) -> PathBuf {
        self.content_root.join(&candidate.path)
    }
}

impl MarkerStore for FrontMatterStore {
    fn is_marked(&self, candidate: &Candidate) -> bool {
        let path = self.resolve(candidate);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(path=%path.display(), %err, "cannot read page; keeping candidate");
                return false;
            }
        };
        match PageDocument::decode(&raw) {
            Ok(doc) => doc.announcement_uri().is_some(),
            Err(err) => {
                warn!(path=%path.display(), %err, "cannot decode page; keeping candidate");
                false
            }
        }
    }

    fn set_marked(&self, candidate: &Candidate, uri: &str) -> Result<(), MarkError> {
        let path = self.resolve(candidate);
        // Re-read rather than trust any earlier snapshot; the page may have
        // changed since the filter saw it.
        let raw = fs::read_to_string(&path)?;
        let mut doc = PageDocument::decode(&raw)?;
        if doc.announcement_uri().is_some() {
            return Err(MarkError::AlreadyMarked {
                path: candidate.path.clone(),
            });
        }

        doc.set_announcement_uri(uri);
        let encoded = doc.encode()?;
        write_atomic(&path, encoded.as_bytes())?;
        Ok(())
    }
}

/// Write via a temp file in the target's directory, then rename over the
/// original, so a crash mid-write cannot leave a half-written page.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), MarkError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.persist(path).map_err(|source| MarkError::Persist {
        path: path.display().to_string(),
        source,
    })?;
    Ok(())
}
