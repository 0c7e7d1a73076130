//! Segment builder.
//!
//! Folds classified lines through a two-state scanner (outside a question /
//! inside a question) and emits one [`Segment`] per question heading.

use tracing::trace;

use crate::classify::{Fence, LineClassifier, LineContext, LineKind};

/// A question cut out of the source: heading plus accumulated body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Category active when the question heading was seen.
    pub category: String,
    /// Cleaned heading text.
    pub title: String,
    /// Trimmed body.
    pub answer: String,
    /// 1-based line number of the question heading.
    pub line: usize,
}

/// A question whose body is still being accumulated.
#[derive(Debug)]
struct OpenQuestion {
    category: String,
    title: String,
    line: usize,
    body: String,
}

impl OpenQuestion {
    fn flush(self) -> Segment {
        Segment {
            category: self.category,
            title: self.title,
            answer: self.body.trim().to_string(),
            line: self.line,
        }
    }
}

#[derive(Debug)]
enum ScanState {
    Outside {
        category: String,
    },
    Inside {
        category: String,
        question: OpenQuestion,
    },
}

impl ScanState {
    fn is_open(&self) -> bool {
        matches!(self, Self::Inside { .. })
    }

    /// Apply one classified line; returns the next state and any completed segment.
    fn advance(self, kind: LineKind, line: &str, number: usize) -> (Self, Option<Segment>) {
        match (self, kind) {
            (state, LineKind::DocumentTitle | LineKind::Boilerplate | LineKind::TocEntry) => {
                (state, None)
            }
            (Self::Outside { category }, LineKind::Blank) => (Self::Outside { category }, None),
            (state, LineKind::Category(category)) => {
                let done = state.finish();
                (Self::Outside { category }, done)
            }
            (state, LineKind::Question(title)) => {
                let (category, done) = match state {
                    Self::Outside { category } => (category, None),
                    Self::Inside { category, question } => (category, Some(question.flush())),
                };
                let question = OpenQuestion {
                    category: category.clone(),
                    title,
                    line: number,
                    body: String::new(),
                };
                (Self::Inside { category, question }, done)
            }
            (
                Self::Inside {
                    category,
                    mut question,
                },
                LineKind::Blank | LineKind::Fence | LineKind::Content,
            ) => {
                question.body.push_str(line);
                question.body.push('\n');
                (Self::Inside { category, question }, None)
            }
            (state @ Self::Outside { .. }, LineKind::Fence | LineKind::Content) => (state, None),
        }
    }

    /// Flush the open question, if any.
    fn finish(self) -> Option<Segment> {
        match self {
            Self::Outside { .. } => None,
            Self::Inside { question, .. } => Some(question.flush()),
        }
    }
}

/// Split a markdown document into question segments.
///
/// Lines before the first one starting with `start_after` are preamble and
/// never reach the classifier.
pub fn build_segments(
    content: &str,
    classifier: &LineClassifier,
    start_after: Option<&str>,
) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut fence: Option<Fence> = None;

    let lines = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .skip_while(|(_, line)| start_after.is_some_and(|marker| !line.starts_with(marker)));

    let initial = ScanState::Outside {
        category: classifier.config().default_category.clone(),
    };

    let last = lines.fold(initial, |state, (number, line)| {
        let ctx = LineContext {
            question_open: state.is_open(),
            fence,
        };
        let kind = classifier.classify(line, ctx);
        if kind == LineKind::Fence {
            fence = match fence {
                Some(_) => None,
                None => Fence::opening(line),
            };
        }
        trace!(number, ?kind, "classified line");

        let (next, done) = state.advance(kind, line, number);
        segments.extend(done);
        next
    });
    segments.extend(last.finish());

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use qabank_shared::ExtractConfig;

    fn segments(content: &str) -> Vec<Segment> {
        build_segments(content, &LineClassifier::new(ExtractConfig::default()), None)
    }

    #[test]
    fn basic_segmentation() {
        let input = "## Cat1\n### Q1?\nans1\n## Cat2\n### Q2?\nans2";
        let out = segments(input);
        assert_eq!(out.len(), 2);
        assert_eq!(
            (out[0].category.as_str(), out[0].title.as_str(), out[0].answer.as_str()),
            ("Cat1", "Q1?", "ans1")
        );
        assert_eq!(
            (out[1].category.as_str(), out[1].title.as_str(), out[1].answer.as_str()),
            ("Cat2", "Q2?", "ans2")
        );
    }

    #[test]
    fn toc_entries_produce_nothing() {
        assert!(segments("1. [What is X?](#x)").is_empty());
    }

    #[test]
    fn toc_entries_do_not_flush_open_question() {
        let out = segments("### Q?\nfirst\n1. [Other](#other)\nsecond");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].answer, "first\nsecond");
    }

    #[test]
    fn preamble_is_discarded_and_default_category_used() {
        let out = segments("Intro text\nmore intro\n### Q?\nbody");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].category, "General");
        assert_eq!(out[0].answer, "body");
        assert_eq!(out[0].line, 3);
    }

    #[test]
    fn paragraph_breaks_survive_inside_answers() {
        let out = segments("### Q?\n\npara one\n\npara two\n\n");
        assert_eq!(out[0].answer, "para one\n\npara two");
    }

    #[test]
    fn code_fence_comments_stay_in_answer() {
        let input = "## Containers\n### How to list?\n```bash\n# all containers\n\
                     docker ps -a\n```\nDone.";
        let out = segments(input);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].category, "Containers");
        assert!(out[0].answer.contains("# all containers"));
        assert!(out[0].answer.ends_with("Done."));
    }

    #[test]
    fn inline_code_span_does_not_open_fence() {
        let input = "## Cat\n### Q1?\nRun:\n```npm install```\n### Q2?\nans2\n\
                     ## Cat2\n### Q3?\nans3";
        let out = segments(input);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].answer, "Run:\n```npm install```");
        assert_eq!(out[1].title, "Q2?");
        assert_eq!(out[2].category, "Cat2");
        assert_eq!(out[2].answer, "ans3");
    }

    #[test]
    fn longer_fence_is_not_closed_by_shorter_run() {
        let input = "### Q1?\n````md\n```\n### not a question\n```\n````\n### Q2?\nb";
        let out = segments(input);
        assert_eq!(out.len(), 2);
        assert!(out[0].answer.contains("### not a question"));
        assert_eq!(out[1].title, "Q2?");
    }

    #[test]
    fn category_heading_flushes_and_resets() {
        let out = segments("### Q1?\na\n## Next\nstray line\n### Q2?\nb");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].category, "General");
        assert_eq!(out[0].answer, "a");
        assert_eq!(out[1].category, "Next");
        assert_eq!(out[1].answer, "b");
    }

    #[test]
    fn start_after_skips_leading_lines() {
        let classifier = LineClassifier::new(ExtractConfig::default());
        let input = "### Early?\nignored\n## Core React\n1.  ### What is React?\nA library.";
        let out = build_segments(input, &classifier, Some("## Core React"));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].category, "Core React");
        assert_eq!(out[0].title, "What is React?");
        assert_eq!(out[0].line, 4);
    }

    #[test]
    fn separator_inside_question_is_left_for_normalizer() {
        let out = segments("### Q1?\nanswer\n---\n### Q2?\nother");
        assert_eq!(out[0].answer, "answer\n---");
        assert_eq!(out[1].answer, "other");
    }
}
