//! Line classifier.
//!
//! Tags each source line as a category heading, a question heading, answer
//! content, or something to drop. Classification only depends on the line and
//! on two bits of scanner state (whether a question is open, whether we are
//! inside a fenced code block), so it is testable line by line.

use std::sync::LazyLock;

use regex::Regex;

use qabank_shared::ExtractConfig;

use crate::cleanup::{is_separator, strip_heading_markup};

/// Matches a numbered list line (`1. `, `12. `).
static NUMBERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s").expect("numbered line regex"));

/// Matches inline link syntax (`[text](target)`).
static INLINE_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]\([^)]*\)").expect("inline link regex"));

/// Classification of a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Empty or whitespace-only.
    Blank,
    /// Badges, "Table of Contents", separators between questions.
    Boilerplate,
    /// A shallow heading that names the whole document.
    DocumentTitle,
    /// A category heading; carries the cleaned heading text.
    Category(String),
    /// A question heading; carries the cleaned title.
    Question(String),
    /// A numbered table-of-contents link.
    TocEntry,
    /// A code fence delimiter.
    Fence,
    /// Anything else.
    Content,
}

/// An open fenced code block: its delimiter character and run length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    /// The fence opened by `line`, if it is a bare delimiter.
    ///
    /// A run of three or more backticks or tildes, optionally followed by an
    /// info string. A backtick run whose remainder contains another backtick
    /// is an inline code span, not a fence.
    pub fn opening(line: &str) -> Option<Self> {
        let trimmed = line.trim_start();
        let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = trimmed.chars().take_while(|c| *c == marker).count();
        if len < 3 {
            return None;
        }
        let info = &trimmed[len * marker.len_utf8()..];
        if marker == '`' && info.contains('`') {
            return None;
        }
        Some(Self { marker, len })
    }

    /// Whether `line` closes this fence: the same character, at least as
    /// long, and nothing else on the line.
    pub fn closes(&self, line: &str) -> bool {
        let trimmed = line.trim();
        let run = trimmed.chars().take_while(|c| *c == self.marker).count();
        run >= self.len && run == trimmed.chars().count()
    }
}

/// Scanner state the classifier needs to see.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineContext {
    pub question_open: bool,
    /// The fenced block the line is inside, if any.
    pub fence: Option<Fence>,
}

/// Configured line classifier.
#[derive(Debug, Clone)]
pub struct LineClassifier {
    config: ExtractConfig,
}

impl LineClassifier {
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Classify one line.
    pub fn classify(&self, line: &str, ctx: LineContext) -> LineKind {
        if let Some(open) = ctx.fence {
            if open.closes(line) {
                return LineKind::Fence;
            }
            return LineKind::Content;
        }
        if Fence::opening(line).is_some() {
            return LineKind::Fence;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            return LineKind::Blank;
        }
        if self.config.skip_markers.iter().any(|m| line.contains(m.as_str())) {
            return LineKind::Boilerplate;
        }
        if !ctx.question_open && is_separator(trimmed) {
            return LineKind::Boilerplate;
        }

        let level = heading_level(line);

        if let Some(level) = level.filter(|l| self.config.category_levels.contains(l)) {
            if level == 1 && self.is_document_title(line) {
                return LineKind::DocumentTitle;
            }
            let text = strip_heading_markup(line);
            if text.is_empty() {
                return LineKind::Boilerplate;
            }
            return LineKind::Category(text);
        }

        let is_question_heading = level.is_some_and(|l| self.config.question_levels.contains(&l));
        let is_numbered = self.config.numbered_questions && NUMBERED_RE.is_match(line);

        if is_question_heading || is_numbered {
            if is_numbered && INLINE_LINK_RE.is_match(line) {
                return LineKind::TocEntry;
            }
            return LineKind::Question(strip_heading_markup(line));
        }

        LineKind::Content
    }

    fn is_document_title(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        self.config
            .title_markers
            .iter()
            .any(|m| lower.contains(m.as_str()))
    }
}

/// ATX heading depth: leading `#`s followed by whitespace or end of line.
pub fn heading_level(line: &str) -> Option<u8> {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    match line[hashes..].chars().next() {
        None => Some(hashes as u8),
        Some(c) if c.is_whitespace() => Some(hashes as u8),
        Some(_) => None,
    }
}
