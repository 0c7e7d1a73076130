//! Technology consolidation ("clubbing").
//!
//! Collapses every record of one technology into a single compiled record.
//! This is one-way: the originals are gone afterwards, so consolidating an
//! already consolidated partition is a no-op rather than a re-run.

use tracing::info;

use qabank_shared::{ConsolidateConfig, Corpus, QuestionRecord};

/// Separator placed between compiled subsections.
const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

/// Outcome of [`consolidate`].
#[derive(Debug, Clone)]
pub struct Consolidation {
    /// The corpus after consolidation.
    pub corpus: Corpus,
    /// Number of records folded into the compiled record (0 when untouched).
    pub merged: usize,
}

/// Replace all records of `club.technology` by one compiled record.
///
/// Partitions with zero or one record are left as they are. The compiled
/// record is appended after the remaining records.
pub fn consolidate(corpus: Corpus, club: &ConsolidateConfig) -> Consolidation {
    let count = corpus.by_technology(&club.technology).count();
    if count <= 1 {
        return Consolidation { corpus, merged: 0 };
    }

    let (members, rest): (Vec<QuestionRecord>, Vec<QuestionRecord>) = corpus
        .into_iter()
        .partition(|r| r.technology == club.technology);
    let mut rest = Corpus::from(rest);

    let blocks: Vec<String> = members
        .iter()
        .map(|r| format!("## {}\n{}", r.title, r.answer))
        .collect();
    let answer = format!(
        "# {} Concepts\n\n{}",
        club.technology,
        blocks.join(BLOCK_SEPARATOR)
    );

    rest.push(QuestionRecord {
        id: club.id.clone(),
        technology: club.technology.clone(),
        category: club.category.clone(),
        title: club.title.clone(),
        answer,
        level: club.level.clone(),
        image: None,
    });

    info!(
        technology = %club.technology,
        merged = members.len(),
        "consolidated technology into one record"
    );

    Consolidation {
        corpus: rest,
        merged: members.len(),
    }
}
