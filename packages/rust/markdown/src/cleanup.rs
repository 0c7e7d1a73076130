//! Title/answer normalization passes.
//!
//! Each pass is a function `&str -> String`. [`normalize_record`] applies them
//! in a fixed order; the order matters because footer removal can expose a
//! trailing separator that the last pass then drops.

use std::sync::LazyLock;

use regex::Regex;

use qabank_shared::QuestionRecord;

/// Run every normalization pass over a record, in place.
pub fn normalize_record(record: &mut QuestionRecord) {
    record.title = clean_title(&record.title);
    record.answer = record.answer.trim().to_string();
    record.answer = strip_footer(&record.answer);
    record.answer = collapse_trailing_separator(&record.answer);
}

// ---------------------------------------------------------------------------
// Pass 1: Title markup
// ---------------------------------------------------------------------------

/// Strip heading hashes, list numbering, inline links and wrapping emphasis.
pub fn clean_title(title: &str) -> String {
    let stripped = strip_heading_markup(title);
    strip_wrapping_emphasis(&stripped).trim().to_string()
}

/// Remove the structural prefix of a heading or numbered line.
///
/// Handles `### Q`, `1. Q` and the mixed `1.  ### Q` form, then collapses
/// any `[text](target)` to `text`.
pub(crate) fn strip_heading_markup(line: &str) -> String {
    static HASHES_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^#+\s*").expect("valid regex"));
    static NUMBER_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^\d+\.\s*").expect("valid regex"));

    let line = line.trim();
    let line = HASHES_RE.replace(line, "");
    let line = NUMBER_RE.replace(&line, "");
    let line = HASHES_RE.replace(&line, "");
    collapse_links(&line).trim().to_string()
}

/// Replace inline links with their display text.
pub(crate) fn collapse_links(text: &str) -> String {
    static LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").expect("valid regex"));

    LINK_RE.replace_all(text, "$1").to_string()
}

/// Drop one layer of emphasis wrapping the whole title (`**Q?**` -> `Q?`).
fn strip_wrapping_emphasis(title: &str) -> String {
    const MARKERS: [&str; 6] = ["***", "**", "*", "___", "__", "_"];

    let title = title.trim();
    for marker in MARKERS {
        if title.len() > marker.len() * 2 && title.starts_with(marker) && title.ends_with(marker)
        {
            return title[marker.len()..title.len() - marker.len()].to_string();
        }
    }
    title.to_string()
}

// ---------------------------------------------------------------------------
// Pass 2: "Back to Top" footers
// ---------------------------------------------------------------------------

/// Remove every `[⬆ Back to Top](#anchor)` footer, bold or plain.
pub fn strip_footer(answer: &str) -> String {
    static FOOTER_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)\*{0,2}\[\s*(?:⬆\x{FE0F}?)?\s*back\s+to\s+top\s*\]\(#[^)]*\)\*{0,2}")
            .expect("valid regex")
    });

    FOOTER_RE.replace_all(answer, "").trim().to_string()
}

/// Whether the answer still carries a footer in any known form.
pub fn has_footer(answer: &str) -> bool {
    static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)\[\s*(?:⬆\x{FE0F}?)?\s*back\s+to\s+top\s*\]\(#").expect("valid regex")
    });

    MARKER_RE.is_match(answer)
}

// ---------------------------------------------------------------------------
// Pass 3: Trailing separators
// ---------------------------------------------------------------------------

/// Drop bare `---` lines left at the end of the answer.
pub fn collapse_trailing_separator(answer: &str) -> String {
    let mut rest = answer.trim_end();
    loop {
        let (head, last) = match rest.rsplit_once('\n') {
            Some((head, last)) => (head, last),
            None => ("", rest),
        };
        if !is_separator(last) {
            break;
        }
        rest = head.trim_end();
    }
    rest.trim().to_string()
}

/// A horizontal rule made of three or more dashes.
pub(crate) fn is_separator(line: &str) -> bool {
    let line = line.trim();
    line.len() >= 3 && line.chars().all(|c| c == '-')
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
