//! End-to-end `import` pipeline: sources → extract → merge → enrich → write.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use qabank_markdown::{LineClassifier, SourceDocument, extract};
use qabank_shared::{AppConfig, Corpus, ExtractConfig, QaBankError, Result, SourceConfig};

use crate::consolidate::consolidate;
use crate::enrichment::{ImageCatalog, enrich, stage_assets};
use crate::merge::merge_by_technology;
use crate::reader::read_source;
use crate::writer::{Defect, commit, load_baseline};

/// Options for [`run_import`].
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Restrict the run to sources of these technologies (case-insensitive).
    pub only: Vec<String>,
    /// Skip categorization, diagrams and heading-mark stripping.
    pub skip_enrich: bool,
    /// Skip technology consolidation.
    pub skip_consolidate: bool,
    /// Run everything in memory; write neither the corpus nor diagrams.
    pub dry_run: bool,
}

/// Result of [`run_import`].
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    /// Corpus path.
    pub output: PathBuf,
    /// Sources located and extracted.
    pub sources_read: usize,
    /// Sources that could not be found (`folder/file`).
    pub sources_missing: Vec<String>,
    /// Records extracted per technology.
    pub extracted: BTreeMap<String, usize>,
    /// Existing records kept from untouched technologies.
    pub kept: usize,
    /// Existing records replaced by the re-import.
    pub replaced: usize,
    /// Titles split by the merged-title repair.
    pub repaired_titles: usize,
    /// Records moved out of the default category.
    pub categorized: usize,
    /// Records given a diagram.
    pub images: usize,
    /// Consolidated technologies with the number of records folded.
    pub consolidated: Vec<(String, usize)>,
    /// Non-fatal record problems.
    pub defects: Vec<Defect>,
    /// Records in the final corpus.
    pub total: usize,
    /// Whether the corpus was written.
    pub written: bool,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each located source is extracted.
    fn source_done(&self, source: &str, records: usize, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, report: &ImportReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn source_done(&self, _source: &str, _records: usize, _current: usize, _total: usize) {}
    fn done(&self, _report: &ImportReport) {}
}

/// Run the full import.
///
/// 1. Load the existing corpus (absent → empty)
/// 2. Read and extract every selected source
/// 3. Replace the partitions of the technologies that were located
/// 4. Enrich (diagrams, categories)
/// 5. Consolidate configured technologies
/// 6. Validate and write once, atomically
#[instrument(skip_all, fields(root = %config.defaults.root_dir, dry_run = options.dry_run))]
pub fn run_import(
    config: &AppConfig,
    options: &ImportOptions,
    progress: &dyn ProgressReporter,
) -> Result<ImportReport> {
    let start = Instant::now();
    let output = config.output_path();
    let root = Path::new(&config.defaults.root_dir);
    let mut report = ImportReport {
        output: output.clone(),
        ..ImportReport::default()
    };

    info!(output = %output.display(), "starting import");

    // --- Phase 1: Baseline ---
    progress.phase("Loading existing corpus");
    let baseline = load_baseline(&output)?;

    // --- Phase 2: Extraction ---
    progress.phase("Extracting questions");
    let sources = select_sources(&config.sources, &options.only)?;
    let classifier = LineClassifier::new(ExtractConfig::from(config));
    let mut located = BTreeSet::new();
    let mut fresh = Corpus::new();

    for (i, source) in sources.iter().enumerate() {
        let label = source_label(source);
        let Some(loaded) = read_source(root, source)? else {
            report.sources_missing.push(label);
            continue;
        };

        let doc = SourceDocument {
            name: &label,
            technology: &source.technology,
            level: source.level.as_deref(),
            start_after: source.start_after.as_deref(),
        };
        let extraction = extract(&loaded.content, &doc, &classifier, config.defaults.id_scheme);
        let count = extraction.records.len();

        info!(
            source = %loaded.path.display(),
            technology = %source.technology,
            records = count,
            "extracted source"
        );

        *report.extracted.entry(source.technology.clone()).or_default() += count;
        report.repaired_titles += extraction.repaired_titles;
        report.sources_read += 1;
        located.insert(source.technology.clone());
        fresh.extend(extraction.records);
        progress.source_done(&label, count, i + 1, sources.len());
    }

    // --- Phase 3: Enrichment ---
    // Only freshly extracted records; kept baseline records stay as they were.
    if !options.skip_enrich && !config.enrichment.is_empty() {
        progress.phase("Enriching");
        let catalog = if config.enrichment.iter().any(|p| !p.images.is_empty()) {
            stage_assets(config, !options.dry_run)?
        } else {
            ImageCatalog::default()
        };
        let stats = enrich(
            &mut fresh,
            &config.enrichment,
            &catalog,
            &config.defaults.default_category,
        );
        report.categorized = stats.categorized;
        report.images = stats.images;
    }

    // --- Phase 4: Merge ---
    progress.phase("Merging");
    let merged = merge_by_technology(baseline, &located, fresh);
    report.kept = merged.kept;
    report.replaced = merged.replaced;
    let mut corpus = merged.corpus;

    // --- Phase 5: Consolidation ---
    if !options.skip_consolidate {
        progress.phase("Consolidating");
        for club in config
            .consolidate
            .iter()
            .filter(|c| located.contains(&c.technology))
        {
            let out = consolidate(corpus, club);
            corpus = out.corpus;
            if out.merged > 0 {
                report.consolidated.push((club.technology.clone(), out.merged));
            }
        }
    }

    // --- Phase 6: Validate + write ---
    progress.phase(if options.dry_run {
        "Validating"
    } else {
        "Writing corpus"
    });
    report.defects = commit(&output, &corpus, options.dry_run)?;
    report.total = corpus.len();
    report.written = !options.dry_run;
    report.elapsed = start.elapsed();

    info!(
        total = report.total,
        sources = report.sources_read,
        missing = report.sources_missing.len(),
        kept = report.kept,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "import complete"
    );

    progress.done(&report);
    Ok(report)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Sources belonging to the `only` technologies (all when empty).
fn select_sources<'a>(
    sources: &'a [SourceConfig],
    only: &[String],
) -> Result<Vec<&'a SourceConfig>> {
    if only.is_empty() {
        return Ok(sources.iter().collect());
    }

    for wanted in only {
        if !sources.iter().any(|s| s.technology.eq_ignore_ascii_case(wanted)) {
            return Err(QaBankError::config(format!(
                "no source configured for technology '{wanted}'"
            )));
        }
    }

    Ok(sources
        .iter()
        .filter(|s| only.iter().any(|w| s.technology.eq_ignore_ascii_case(w)))
        .collect())
}

/// Stable, root-relative name of a source.
fn source_label(source: &SourceConfig) -> String {
    format!("{}/{}", source.folder, source.file)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
