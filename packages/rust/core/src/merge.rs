//! Technology-scoped corpus merging.
//!
//! Re-importing a technology replaces its whole partition; every other
//! technology's records pass through untouched and in their original order.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use qabank_shared::{Corpus, QaBankError, Result};

/// Outcome of [`merge_by_technology`].
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// Kept records followed by the fresh ones.
    pub corpus: Corpus,
    /// Existing records carried over.
    pub kept: usize,
    /// Existing records dropped because their technology was re-imported.
    pub replaced: usize,
    /// Fresh records appended.
    pub added: usize,
}

/// Replace every record whose technology is in `technologies` with `fresh`.
///
/// Fresh records outside `technologies` are appended too; the caller decides
/// which partitions are authoritative.
pub fn merge_by_technology(
    existing: Corpus,
    technologies: &BTreeSet<String>,
    fresh: Corpus,
) -> MergeResult {
    let before = existing.len();
    let mut corpus: Corpus = existing
        .into_iter()
        .filter(|r| !technologies.contains(&r.technology))
        .collect();
    let kept = corpus.len();
    let added = fresh.len();
    corpus.extend(fresh);

    debug!(
        kept,
        replaced = before - kept,
        added,
        technologies = ?technologies,
        "merged corpus"
    );

    MergeResult {
        corpus,
        kept,
        replaced: before - kept,
        added,
    }
}

/// Append hand-authored records after the existing corpus.
///
/// Ids must stay unique: a record colliding with an existing id, or with an
/// earlier record in `extra`, is rejected.
pub fn append_records(existing: Corpus, extra: Corpus) -> Result<Corpus> {
    let mut seen: HashSet<String> = existing.iter().map(|r| r.id.clone()).collect();
    for record in &extra {
        if !seen.insert(record.id.clone()) {
            return Err(QaBankError::validation(format!(
                "cannot append '{}': id '{}' already exists",
                record.title, record.id
            )));
        }
    }

    let mut corpus = existing;
    corpus.extend(extra);
    Ok(corpus)
}
