//! Input resolution: load the ABAP source (or pre-generated markup) text.
//!
//! The library itself works on strings; this module exists for callers that
//! start from a path. `-` means standard input. Non-UTF-8 bytes (SAP exports
//! in legacy code pages are common) are replaced rather than rejected, since
//! the generator only needs readable text.

use crate::error::TechSpecError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Origin label used for standard input in logs and errors.
pub const STDIN_ORIGIN: &str = "<stdin>";

/// Where the source text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOrigin {
    Stdin,
    File(PathBuf),
}

impl SourceOrigin {
    pub fn parse(input: &str) -> Self {
        if input == "-" {
            SourceOrigin::Stdin
        } else {
            SourceOrigin::File(PathBuf::from(input))
        }
    }

    pub fn label(&self) -> String {
        match self {
            SourceOrigin::Stdin => STDIN_ORIGIN.to_string(),
            SourceOrigin::File(p) => p.display().to_string(),
        }
    }
}

/// Loaded source text together with its origin.
#[derive(Debug, Clone)]
pub struct SourceText {
    pub origin: SourceOrigin,
    pub text: String,
}

/// Read the ABAP source named by `input` (`-` for stdin).
///
/// Fails on missing/unreadable files and on whitespace-only content.
pub async fn read_source(input: &str) -> Result<SourceText, TechSpecError> {
    let source = read_text(input).await?;
    if source.text.trim().is_empty() {
        return Err(TechSpecError::EmptySource {
            origin: source.origin.label(),
        });
    }
    Ok(source)
}

/// Read any text input without content checks. Empty markup is valid: it
/// renders to a title-only document.
pub async fn read_text(input: &str) -> Result<SourceText, TechSpecError> {
    let origin = SourceOrigin::parse(input);
    let bytes = match &origin {
        SourceOrigin::Stdin => tokio::task::spawn_blocking(read_stdin)
            .await
            .map_err(|e| TechSpecError::Internal(format!("stdin reader panicked: {e}")))?
            .map_err(|e| TechSpecError::SourceReadFailed {
                origin: STDIN_ORIGIN.to_string(),
                source: e,
            })?,
        SourceOrigin::File(path) => read_file(path).await?,
    };

    let text = decode(bytes);
    debug!("Read {} bytes from {}", text.len(), origin.label());
    Ok(SourceText { origin, text })
}

fn read_stdin() -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    std::io::stdin().lock().read_to_end(&mut buf)?;
    Ok(buf)
}

async fn read_file(path: &Path) -> Result<Vec<u8>, TechSpecError> {
    tokio::fs::read(path).await.map_err(|e| match e.kind() {
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
    })
}

/// UTF-8 with a leading BOM stripped; invalid sequences become U+FFFD.
fn decode(bytes: Vec<u8>) -> String {
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    };
    match text.strip_prefix('\u{FEFF}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}
