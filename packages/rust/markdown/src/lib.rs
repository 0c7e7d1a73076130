//! Markdown question-bank extraction.
//!
//! Turns a loosely structured interview-questions README into normalized
//! [`QuestionRecord`]s:
//! 1. [`classify`] tags each line (category, question, content, boilerplate)
//! 2. [`segment`] folds the tagged lines into title + body segments
//! 3. [`cleanup`] strips heading markup, footers and trailing separators
//! 4. [`repair`] moves answer text that leaked into a title back to the answer

pub mod classify;
pub mod cleanup;
pub mod repair;
pub mod segment;

use tracing::{debug, instrument, warn};

use qabank_shared::{IdScheme, QuestionRecord};

pub use classify::{Fence, LineClassifier, LineContext, LineKind};
pub use cleanup::{has_footer, normalize_record};
pub use repair::repair_merged_title;
pub use segment::{Segment, build_segments};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Where a document came from and how its records are tagged.
#[derive(Debug, Clone, Copy)]
pub struct SourceDocument<'a> {
    /// Display name used in logs and deterministic ids (usually the file path).
    pub name: &'a str,
    /// Technology stamped on every record.
    pub technology: &'a str,
    /// Level stamped on every record.
    pub level: Option<&'a str>,
    /// Marker line where the question content starts.
    pub start_after: Option<&'a str>,
}

/// Records extracted from one document.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Normalized records in document order.
    pub records: Vec<QuestionRecord>,
    /// How many titles the merged-title repair split.
    pub repaired_titles: usize,
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract normalized question records from one markdown document.
#[instrument(skip_all, fields(technology = doc.technology, source = doc.name))]
pub fn extract(
    content: &str,
    doc: &SourceDocument<'_>,
    classifier: &LineClassifier,
    ids: IdScheme,
) -> Extraction {
    let segments = build_segments(content, classifier, doc.start_after);
    let mut extraction = Extraction::default();

    for (ordinal, segment) in segments.into_iter().enumerate() {
        let mut record = QuestionRecord {
            id: ids.mint(doc.technology, doc.name, ordinal, &segment.title),
            technology: doc.technology.to_string(),
            category: segment.category,
            title: segment.title,
            answer: segment.answer,
            level: doc.level.map(str::to_string),
            image: None,
        };

        if refine_record(&mut record) {
            extraction.repaired_titles += 1;
        }
        if record.title.is_empty() {
            warn!(line = segment.line, "question heading has no title text");
        }
        extraction.records.push(record);
    }

    debug!(
        records = extraction.records.len(),
        repaired = extraction.repaired_titles,
        "document extracted"
    );

    extraction
}

/// Normalize a record and apply the merged-title repair.
///
/// Returns `true` when the title was split.
pub fn refine_record(record: &mut QuestionRecord) -> bool {
    normalize_record(record);
    repair_merged_title(record)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
