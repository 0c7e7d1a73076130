//! Standalone maintenance commands over an existing corpus.
//!
//! Each command loads the corpus, applies one pure transform, validates,
//! and writes once.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, instrument};

use qabank_markdown::refine_record;
use qabank_shared::{AppConfig, ConsolidateConfig, Corpus, QaBankError, Result, slugify};

use crate::consolidate::consolidate;
use crate::enrichment::{enrich, stage_assets};
use crate::merge::append_records;
use crate::writer::{Defect, commit, load_corpus};

/// Outcome of a maintenance command.
#[derive(Debug, Clone, Default)]
pub struct MaintenanceReport {
    /// Records changed (or added, for `append`).
    pub changed: usize,
    /// Titles split by the merged-title repair (`cleanup` only).
    pub repaired_titles: usize,
    /// Records in the resulting corpus.
    pub total: usize,
    pub defects: Vec<Defect>,
    pub written: bool,
}

/// Re-run normalization and title repair over every record.
#[instrument(skip_all)]
pub fn run_cleanup(config: &AppConfig, dry_run: bool) -> Result<MaintenanceReport> {
    let output = config.output_path();
    let mut corpus = load_corpus(&output)?;
    let mut report = MaintenanceReport::default();

    for record in corpus.records_mut() {
        let before = record.clone();
        if refine_record(record) {
            report.repaired_titles += 1;
        }
        if *record != before {
            report.changed += 1;
        }
    }

    info!(
        changed = report.changed,
        repaired = report.repaired_titles,
        "cleanup complete"
    );
    finish(&output, corpus, report, dry_run)
}

/// Consolidate `technology`, or every configured technology when `None`.
///
/// A technology without a `[[consolidate]]` entry gets a derived one:
/// id `<slug>-master`, title `<technology> Concepts (Compiled)`.
#[instrument(skip_all, fields(technology = technology.unwrap_or("all")))]
pub fn run_club(
    config: &AppConfig,
    technology: Option<&str>,
    dry_run: bool,
) -> Result<MaintenanceReport> {
    let clubs: Vec<ConsolidateConfig> = match technology {
        None => config.consolidate.clone(),
        Some(tech) => vec![
            config
                .consolidate
                .iter()
                .find(|c| c.technology.eq_ignore_ascii_case(tech))
                .cloned()
                .unwrap_or_else(|| derived_club(tech)),
        ],
    };

    let output = config.output_path();
    let mut corpus = load_corpus(&output)?;
    let mut report = MaintenanceReport::default();

    for club in &clubs {
        let out = consolidate(corpus, club);
        corpus = out.corpus;
        report.changed += out.merged;
    }

    finish(&output, corpus, report, dry_run)
}

/// Stage diagrams, then apply every enrichment profile.
#[instrument(skip_all)]
pub fn run_enrich(config: &AppConfig, dry_run: bool) -> Result<MaintenanceReport> {
    let output = config.output_path();
    let mut corpus = load_corpus(&output)?;

    let catalog = stage_assets(config, !dry_run)?;
    let stats = enrich(
        &mut corpus,
        &config.enrichment,
        &catalog,
        &config.defaults.default_category,
    );

    let report = MaintenanceReport {
        changed: stats.categorized + stats.images,
        ..MaintenanceReport::default()
    };
    finish(&output, corpus, report, dry_run)
}

/// Append hand-authored records from a JSON array file.
#[instrument(skip_all, fields(file = %file.display()))]
pub fn run_append(config: &AppConfig, file: &Path, dry_run: bool) -> Result<MaintenanceReport> {
    let output = config.output_path();
    let existing = load_corpus(&output)?;
    let extra = load_corpus(file)?;
    if extra.iter().any(|r| r.technology.is_empty()) {
        return Err(QaBankError::validation(format!(
            "{}: every appended record needs a technology",
            file.display()
        )));
    }

    let report = MaintenanceReport {
        changed: extra.len(),
        ..MaintenanceReport::default()
    };
    let corpus = append_records(existing, extra)?;
    info!(added = report.changed, "records appended");
    finish(&output, corpus, report, dry_run)
}

/// Record counts per technology and category.
pub fn corpus_stats(config: &AppConfig) -> Result<BTreeMap<String, BTreeMap<String, usize>>> {
    Ok(load_corpus(&config.output_path())?.counts())
}

fn finish(
    output: &Path,
    corpus: Corpus,
    mut report: MaintenanceReport,
    dry_run: bool,
) -> Result<MaintenanceReport> {
    report.defects = commit(output, &corpus, dry_run)?;
    report.total = corpus.len();
    report.written = !dry_run;
    Ok(report)
}

fn derived_club(technology: &str) -> ConsolidateConfig {
    ConsolidateConfig {
        technology: technology.to_string(),
        id: format!("{}-master", slugify(technology)),
        title: format!("{technology} Concepts (Compiled)"),
        category: "Concepts".into(),
        level: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::write_corpus;
    use qabank_shared::QuestionRecord;

    fn record(id: &str, technology: &str, title: &str, answer: &str) -> QuestionRecord {
        QuestionRecord {
            id: id.into(),
            technology: technology.into(),
            category: "General".into(),
            title: title.into(),
            answer: answer.into(),
            level: None,
            image: None,
        }
    }

    fn setup(records: Vec<QuestionRecord>) -> (tempfile::TempDir, AppConfig) {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = AppConfig::default();
        config.defaults.root_dir = dir.path().to_string_lossy().into_owned();
        config.defaults.output = "questions.json".into();
        write_corpus(&config.output_path(), &Corpus::from(records)).expect("seed");
        (dir, config)
    }

    #[test]
    fn cleanup_strips_footers_and_repairs_titles() {
        let (_dir, config) = setup(vec![
            record(
                "1",
                "Java",
                "What is JVM?",
                "Runs bytecode.\n\n**[⬆ Back to Top](#table-of-contents)**\n\n---",
            ),
            record(
                "2",
                "JavaScript",
                "What are closures? A closure is a function bundled",
                "with its scope.",
            ),
            record("3", "Java", "Clean?", "Yes."),
        ]);

        let report = run_cleanup(&config, false).expect("cleanup");
        assert_eq!(report.changed, 2);
        assert_eq!(report.repaired_titles, 1);

        let corpus = load_corpus(&config.output_path()).expect("load");
        assert_eq!(corpus.records()[0].answer, "Runs bytecode.");
        assert_eq!(corpus.records()[1].title, "What are closures?");
        assert!(corpus.records()[1].answer.starts_with("A closure is a function bundled"));
    }

    #[test]
    fn club_named_technology() {
        let (_dir, config) = setup(vec![
            record("1", "System Design", "CAP", "a"),
            record("2", "System Design", "Sharding", "b"),
            record("3", "Java", "JVM?", "c"),
        ]);

        let report = run_club(&config, Some("system design"), false).expect("club");
        assert_eq!(report.changed, 2);
        let corpus = load_corpus(&config.output_path()).expect("load");
        let ids: Vec<&str> = corpus.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "system-design-master"]);
    }

    #[test]
    fn club_unconfigured_technology_derives_record() {
        let (_dir, config) = setup(vec![
            record("1", "Docker", "Images", "a"),
            record("2", "Docker", "Volumes", "b"),
        ]);
        run_club(&config, Some("Docker"), false).expect("club");
        let corpus = load_corpus(&config.output_path()).expect("load");
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.records()[0].id, "docker-master");
        assert_eq!(corpus.records()[0].title, "Docker Concepts (Compiled)");
    }

    #[test]
    fn enrich_categorizes_existing_corpus() {
        let (_dir, config) = setup(vec![record(
            "1",
            "Java",
            "How do threads start?",
            "Call start().",
        )]);
        let report = run_enrich(&config, false).expect("enrich");
        assert_eq!(report.changed, 1);
        let corpus = load_corpus(&config.output_path()).expect("load");
        assert_eq!(corpus.records()[0].category, "Threads");
    }

    #[test]
    fn append_adds_records_after_existing() {
        let (dir, config) = setup(vec![record("1", "Java", "JVM?", "c")]);
        let extra = dir.path().join("extra.json");
        write_corpus(
            &extra,
            &Corpus::from(vec![record(
                "sb-1",
                "Spring Boot",
                "What is a starter?",
                "A dependency bundle.",
            )]),
        )
        .expect("write extra");

        let report = run_append(&config, &extra, false).expect("append");
        assert_eq!(report.changed, 1);
        assert_eq!(report.total, 2);
        let corpus = load_corpus(&config.output_path()).expect("load");
        assert_eq!(corpus.records()[1].id, "sb-1");
    }

    #[test]
    fn append_collision_leaves_corpus_untouched() {
        let (dir, config) = setup(vec![record("1", "Java", "JVM?", "c")]);
        let extra = dir.path().join("extra.json");
        write_corpus(&extra, &Corpus::from(vec![record("1", "Java", "Dup?", "d")])).expect("write");

        let before = std::fs::read(config.output_path()).expect("read");
        assert!(run_append(&config, &extra, false).is_err());
        assert_eq!(std::fs::read(config.output_path()).expect("read"), before);
    }

    #[test]
    fn stats_counts_by_technology_and_category() {
        let (_dir, config) = setup(vec![
            record("1", "Java", "a", ""),
            record("2", "Java", "b", ""),
            record("3", "Docker", "c", ""),
        ]);
        let stats = corpus_stats(&config).expect("stats");
        assert_eq!(stats["Java"]["General"], 2);
        assert_eq!(stats["Docker"]["General"], 1);
    }
}
