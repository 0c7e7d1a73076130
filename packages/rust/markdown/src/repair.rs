//! Merged-title repair.
//!
//! Some source headings swallow the first sentence of their own answer, e.g.
//! `### What is a closure? It is a function that remembers scope.` The split
//! is unconditional: a title with an inner `?` followed by a capitalized word
//! is always cut there, even when the longer title was intentional.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use qabank_shared::QuestionRecord;

/// `<anything ending in ?><whitespace><Capitalized rest>`.
static MERGED_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+\?)\s+([A-Z].+)$").expect("merged title regex"));

/// Split a merged title into `(title, leaked_sentence)`.
pub fn split_merged_title(title: &str) -> Option<(String, String)> {
    MERGED_TITLE_RE
        .captures(title)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
}

/// Move a leaked sentence from the title to the top of the answer.
///
/// Returns `true` when the record was changed.
pub fn repair_merged_title(record: &mut QuestionRecord) -> bool {
    let Some((title, leaked)) = split_merged_title(&record.title) else {
        return false;
    };

    debug!(
        technology = %record.technology,
        original = %record.title,
        title = %title,
        "splitting merged title"
    );

    record.answer = if record.answer.is_empty() {
        leaked
    } else {
        format!("{leaked}\n\n{}", record.answer)
    };
    record.title = title;
    true
}
