//! Source reader.
//!
//! Locates configured markdown documents on disk. Archives unpacked from
//! GitHub often add one extra directory level (`repo-main/repo-main/README.md`),
//! so a missing document is retried one level deeper.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use qabank_shared::{QaBankError, Result, SourceConfig};

/// A located and loaded source document.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    /// Path the document was read from.
    pub path: PathBuf,
    /// Full UTF-8 content.
    pub content: String,
}

/// Find a document, falling back to a duplicated trailing folder segment.
pub fn resolve_source(root: &Path, folder: &str, file: &str) -> Option<PathBuf> {
    let primary = root.join(folder).join(file);
    if primary.is_file() {
        return Some(primary);
    }

    let trailing = Path::new(folder).file_name()?;
    let nested = root.join(folder).join(trailing).join(file);
    if nested.is_file() {
        debug!(path = %nested.display(), "found nested source layout");
        return Some(nested);
    }

    None
}

/// Read a configured source.
///
/// A document that cannot be found is not an error: it is logged and `None`
/// is returned so the run continues with the remaining sources. A document
/// that exists but cannot be read aborts the run.
pub fn read_source(root: &Path, source: &SourceConfig) -> Result<Option<LoadedSource>> {
    let Some(path) = resolve_source(root, &source.folder, &source.file) else {
        warn!(
            technology = %source.technology,
            path = %root.join(&source.folder).join(&source.file).display(),
            "source document not found, skipping"
        );
        return Ok(None);
    };

    let content = std::fs::read_to_string(&path).map_err(|e| QaBankError::io(&path, e))?;
    Ok(Some(LoadedSource { path, content }))
}
