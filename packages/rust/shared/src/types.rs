//! Core domain types for the question bank corpus.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Category assigned to records extracted before any category heading.
pub const DEFAULT_CATEGORY: &str = "General";

// ---------------------------------------------------------------------------
// QuestionRecord
// ---------------------------------------------------------------------------

/// A single question/answer entry in the corpus (`questions.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Unique identifier within the corpus.
    pub id: String,
    /// Technology tag (e.g. `Java`, `Docker`).
    pub technology: String,
    /// Grouping label within the technology.
    pub category: String,
    /// Single-line question text.
    pub title: String,
    /// Markdown answer body.
    pub answer: String,
    /// Difficulty tier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Public reference to an associated diagram.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

// ---------------------------------------------------------------------------
// Corpus
// ---------------------------------------------------------------------------

/// Ordered collection of question records.
///
/// Serializes as a bare JSON array. Order is insertion order and is visible
/// to readers paginating through a technology.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Corpus {
    records: Vec<QuestionRecord>,
}

impl Corpus {
    /// Create an empty corpus.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[QuestionRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [QuestionRecord] {
        &mut self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QuestionRecord> {
        self.records.iter()
    }

    pub fn push(&mut self, record: QuestionRecord) {
        self.records.push(record);
    }

    /// Records belonging to one technology, in corpus order.
    pub fn by_technology<'a>(
        &'a self,
        technology: &'a str,
    ) -> impl Iterator<Item = &'a QuestionRecord> + 'a {
        self.records.iter().filter(move |r| r.technology == technology)
    }

    /// Record counts per technology, then per category within it.
    pub fn counts(&self) -> BTreeMap<String, BTreeMap<String, usize>> {
        let mut counts: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
        for record in &self.records {
            *counts
                .entry(record.technology.clone())
                .or_default()
                .entry(record.category.clone())
                .or_default() += 1;
        }
        counts
    }
}

impl From<Vec<QuestionRecord>> for Corpus {
    fn from(records: Vec<QuestionRecord>) -> Self {
        Self { records }
    }
}

impl FromIterator<QuestionRecord> for Corpus {
    fn from_iter<I: IntoIterator<Item = QuestionRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl Extend<QuestionRecord> for Corpus {
    fn extend<I: IntoIterator<Item = QuestionRecord>>(&mut self, iter: I) {
        self.records.extend(iter);
    }
}

impl IntoIterator for Corpus {
    type Item = QuestionRecord;
    type IntoIter = std::vec::IntoIter<QuestionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a QuestionRecord;
    type IntoIter = std::slice::Iter<'a, QuestionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ---------------------------------------------------------------------------
// IdScheme
// ---------------------------------------------------------------------------

/// How record ids are minted during extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdScheme {
    /// Fresh time-sortable UUID per record; ids change on every import.
    #[default]
    Random,
    /// Hash of technology, source file, ordinal and title; stable across imports.
    Deterministic,
}

impl IdScheme {
    /// Mint an id for the `ordinal`-th record extracted from `source`.
    pub fn mint(&self, technology: &str, source: &str, ordinal: usize, title: &str) -> String {
        match self {
            Self::Random => Uuid::now_v7().to_string(),
            Self::Deterministic => {
                let mut hasher = Sha256::new();
                hasher.update(technology.as_bytes());
                hasher.update([0x1f]);
                hasher.update(source.as_bytes());
                hasher.update([0x1f]);
                hasher.update(ordinal.to_le_bytes());
                hasher.update([0x1f]);
                hasher.update(title.as_bytes());
                let digest = format!("{:x}", hasher.finalize());
                format!("{}-{}", slugify(technology), &digest[..16])
            }
        }
    }
}

impl std::str::FromStr for IdScheme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "random" => Ok(Self::Random),
            "deterministic" => Ok(Self::Deterministic),
            other => Err(format!(
                "unknown id scheme '{other}': expected 'random' or 'deterministic'"
            )),
        }
    }
}

/// Lowercase kebab-case form of a label (`System Design` -> `system-design`).
pub fn slugify(label: &str) -> String {
    label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
