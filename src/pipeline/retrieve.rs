//! Knowledge-base retrieval seam.
//!
//! Ingestion, embedding and vector search live outside this crate. The
//! generator only needs "give me passages relevant to this source", so the
//! seam is a small trait. [`StaticRetriever`] covers the CLI case of a few
//! hand-picked knowledge files.

use crate::error::TechSpecError;
use std::path::Path;
use tracing::debug;

/// Supplies domain passages for a piece of ABAP source.
///
/// Implementations must be `Send + Sync`; one retriever is typically shared
/// by every request of a server.
pub trait ContextRetriever: Send + Sync {
    /// Passages relevant to `source`, most relevant first.
    fn retrieve(&self, source: &str) -> Vec<String>;
}

/// Returns the same fixed passages for every query, up to `top_k`.
#[derive(Debug, Clone, Default)]
pub struct StaticRetriever {
    passages: Vec<String>,
    top_k: Option<usize>,
}

impl StaticRetriever {
    pub fn new(passages: Vec<String>) -> Self {
        Self {
            passages,
            top_k: None,
        }
    }

    /// Limit the number of passages returned per query.
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }

    /// Split text into passages on blank lines.
    pub fn from_text(text: &str) -> Self {
        Self::new(split_passages(text))
    }

    /// Load and split several knowledge files.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, TechSpecError> {
        let mut passages = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => TechSpecError::FileNotFound {
                    path: path.to_path_buf(),
                },
                std::io::ErrorKind::PermissionDenied => TechSpecError::PermissionDenied {
                    path: path.to_path_buf(),
                },
                _ => TechSpecError::SourceReadFailed {
                    origin: path.display().to_string(),
                    source: e,
                },
            })?;
            let before = passages.len();
            passages.extend(split_passages(&text));
            debug!(
                "Loaded {} passages from {}",
                passages.len() - before,
                path.display()
            );
        }
        Ok(Self::new(passages))
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

impl ContextRetriever for StaticRetriever {
    fn retrieve(&self, _source: &str) -> Vec<String> {
        let k = self.top_k.unwrap_or(self.passages.len());
        self.passages.iter().take(k).cloned().collect()
    }
}

fn split_passages(text: &str) -> Vec<String> {
    let normalised = text.replace("\r\n", "\n");
    normalised
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn passages_split_on_blank_lines() {
        let r = StaticRetriever::from_text("first\nstill first\n\n\n  second  \r\n\r\nthird");
        assert_eq!(
            r.retrieve("REPORT z."),
            vec!["first\nstill first", "second", "third"]
        );
    }

    #[test]
    fn top_k_limits_results() {
        let r = StaticRetriever::from_text("a\n\nb\n\nc").with_top_k(2);
        assert_eq!(r.retrieve("x"), vec!["a", "b"]);
    }

    #[test]
    fn empty_text_has_no_passages() {
        let r = StaticRetriever::from_text("  \n\n \n");
        assert!(r.is_empty());
        assert!(r.retrieve("x").is_empty());
    }

    #[test]
    fn from_files_reads_all() {
        let mut f1 = tempfile::NamedTempFile::new().unwrap();
        writeln!(f1, "BAPI_SALESORDER_CREATEFROMDAT2 creates orders.").unwrap();
        let mut f2 = tempfile::NamedTempFile::new().unwrap();
        writeln!(f2, "VBAK holds headers.\n\nVBAP holds items.").unwrap();

        let r = StaticRetriever::from_files(&[f1.path(), f2.path()]).unwrap();
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn from_files_missing_path() {
        let err = StaticRetriever::from_files(&["/definitely/not/here.txt"]).unwrap_err();
        assert!(matches!(err, TechSpecError::FileNotFound { .. }));
    }
}
