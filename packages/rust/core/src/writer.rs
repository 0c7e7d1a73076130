//! Corpus persistence: loading the baseline, validating, and atomic writes.

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use qabank_shared::{Corpus, QaBankError, Result};

/// A record-level problem that does not block writing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Defect {
    pub id: String,
    pub technology: String,
    pub problem: &'static str,
}

/// Read and parse a corpus file.
pub fn load_corpus(path: &Path) -> Result<Corpus> {
    let content = std::fs::read_to_string(path).map_err(|e| QaBankError::io(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| QaBankError::parse(format!("invalid corpus {}: {e}", path.display())))
}

/// Load the corpus being updated. An absent file is an empty corpus.
pub fn load_baseline(path: &Path) -> Result<Corpus> {
    if !path.exists() {
        info!(path = %path.display(), "no existing corpus, starting empty");
        return Ok(Corpus::new());
    }
    let corpus = load_corpus(path)?;
    debug!(path = %path.display(), records = corpus.len(), "loaded existing corpus");
    Ok(corpus)
}

/// Check corpus-wide invariants.
///
/// Duplicate ids are an error. Empty titles or categories are returned as
/// defects and logged; those records are still written.
pub fn validate_corpus(corpus: &Corpus) -> Result<Vec<Defect>> {
    let mut seen = HashSet::with_capacity(corpus.len());
    let mut defects = Vec::new();

    for record in corpus {
        if !seen.insert(record.id.as_str()) {
            return Err(QaBankError::validation(format!(
                "duplicate record id '{}' ({})",
                record.id, record.technology
            )));
        }
        let problem = if record.title.is_empty() {
            Some("empty title")
        } else if record.category.is_empty() {
            Some("empty category")
        } else {
            None
        };
        if let Some(problem) = problem {
            warn!(id = %record.id, technology = %record.technology, problem, "record defect");
            defects.push(Defect {
                id: record.id.clone(),
                technology: record.technology.clone(),
                problem,
            });
        }
    }

    Ok(defects)
}

/// Write the corpus as pretty-printed JSON, replacing `path` atomically.
///
/// The document is written to a temporary file in the same directory and
/// renamed over the target, so readers never see a partial corpus.
#[instrument(skip_all, fields(path = %path.display(), records = corpus.len()))]
pub fn write_corpus(path: &Path, corpus: &Corpus) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| QaBankError::io(parent, e))?;

    let mut json = serde_json::to_string_pretty(corpus)
        .map_err(|e| QaBankError::Serialization(e.to_string()))?;
    json.push('\n');

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| QaBankError::io(parent, e))?;
    tmp.write_all(json.as_bytes())
        .map_err(|e| QaBankError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| QaBankError::io(path, e.error))?;

    info!("corpus written");
    Ok(())
}

/// Validate and, unless `dry_run`, write. Returns the defects found.
pub fn commit(path: &Path, corpus: &Corpus, dry_run: bool) -> Result<Vec<Defect>> {
    let defects = validate_corpus(corpus)?;
    if dry_run {
        info!(path = %path.display(), records = corpus.len(), "dry run, corpus not written");
    } else {
        write_corpus(path, corpus)?;
    }
    Ok(defects)
}
