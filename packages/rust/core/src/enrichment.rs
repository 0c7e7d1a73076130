//! Rule-based record enrichment.
//!
//! Three passes, driven by per-technology [`EnrichmentProfile`]s:
//! heading-mark stripping, keyword categorization of records still in the
//! default category, and diagram association from title phrases. Diagrams
//! are copied into the client's public directory first so a record only
//! ever references an image that exists.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info, instrument, warn};

use qabank_shared::{
    AppConfig, CategoryRule, Corpus, EnrichmentProfile, ImageRule, QaBankError, QuestionRecord,
    Result,
};

// ---------------------------------------------------------------------------
// Image catalog
// ---------------------------------------------------------------------------

/// Diagrams available to the client, keyed by lowercase file name.
#[derive(Debug, Clone, Default)]
pub struct ImageCatalog {
    refs: HashMap<String, String>,
}

impl ImageCatalog {
    /// Register `file_name` under `public_prefix`.
    pub fn insert(&mut self, file_name: &str, public_prefix: &str) {
        let prefix = public_prefix.trim_end_matches('/');
        self.refs
            .insert(file_name.to_lowercase(), format!("{prefix}/{file_name}"));
    }

    /// Public reference for `file_name`, matched case-insensitively.
    pub fn public_ref(&self, file_name: &str) -> Option<&str> {
        self.refs.get(&file_name.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

/// Collect the diagrams in `assets.source_dir` and, when `copy` is set,
/// copy them into `assets.dest_dir`.
///
/// A missing source directory yields an empty catalog and a warning. A copy
/// that fails is fatal.
#[instrument(skip_all, fields(copy = copy))]
pub fn stage_assets(config: &AppConfig, copy: bool) -> Result<ImageCatalog> {
    let assets = &config.assets;
    let source_dir = config.resolve(&assets.source_dir);
    let dest_dir = config.resolve(&assets.dest_dir);
    let mut catalog = ImageCatalog::default();

    if !source_dir.is_dir() {
        warn!(path = %source_dir.display(), "image directory not found, skipping diagrams");
        return Ok(catalog);
    }

    let entries =
        std::fs::read_dir(&source_dir).map_err(|e| QaBankError::io(&source_dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| QaBankError::io(&source_dir, e))?;
        let path = entry.path();
        if path.is_file() && has_extension(&path, &assets.extensions) {
            files.push(path);
        }
    }
    files.sort();

    if copy && !files.is_empty() {
        std::fs::create_dir_all(&dest_dir).map_err(|e| QaBankError::io(&dest_dir, e))?;
    }

    for path in &files {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if copy {
            let target = dest_dir.join(name);
            std::fs::copy(path, &target).map_err(|e| QaBankError::io(&target, e))?;
            debug!(file = name, "copied diagram");
        }
        catalog.insert(name, &assets.public_prefix);
    }

    info!(count = catalog.len(), dest = %dest_dir.display(), "diagrams staged");
    Ok(catalog)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
}

// ---------------------------------------------------------------------------
// Passes
// ---------------------------------------------------------------------------

/// Remove every `#` from the title and every `##` from the answer.
pub fn strip_heading_marks(record: &mut QuestionRecord) {
    record.title = record.title.replace('#', "").trim().to_string();
    record.answer = record.answer.replace("##", "").trim().to_string();
}

/// Assign the first rule whose keyword occurs in the title or answer.
///
/// Only records still in `default_category` are considered, so categories
/// taken from the source headings are never overwritten. Returns `true` when
/// the category changed.
pub fn categorize(
    record: &mut QuestionRecord,
    rules: &[CategoryRule],
    default_category: &str,
) -> bool {
    if record.category != default_category {
        return false;
    }

    let haystack = format!("{}\n{}", record.title, record.answer).to_lowercase();
    let matched = rules.iter().find(|rule| {
        rule.keywords
            .iter()
            .any(|kw| haystack.contains(&kw.to_lowercase()))
    });

    match matched {
        Some(rule) => {
            record.category = rule.name.clone();
            true
        }
        None => false,
    }
}

/// Attach the diagram of the first rule whose phrases all occur in the title.
///
/// When that rule's file is not in the catalog the record is left without an
/// image; later rules are not consulted. Returns `true` when an image was set.
pub fn associate_image(
    record: &mut QuestionRecord,
    rules: &[ImageRule],
    catalog: &ImageCatalog,
) -> bool {
    let title = record.title.to_lowercase();
    let Some(rule) = rules
        .iter()
        .find(|rule| rule.all.iter().all(|p| title.contains(&p.to_lowercase())))
    else {
        return false;
    };

    match catalog.public_ref(&rule.file) {
        Some(image) => {
            record.image = Some(image.to_string());
            true
        }
        None => {
            debug!(title = %record.title, file = %rule.file, "diagram not available");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

/// Counters reported by [`enrich`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentStats {
    /// Records moved out of the default category.
    pub categorized: usize,
    /// Records given a diagram.
    pub images: usize,
}

/// Apply every profile to the records of its technology.
#[instrument(skip_all, fields(profiles = profiles.len(), images = catalog.len()))]
pub fn enrich(
    corpus: &mut Corpus,
    profiles: &[EnrichmentProfile],
    catalog: &ImageCatalog,
    default_category: &str,
) -> EnrichmentStats {
    let mut stats = EnrichmentStats::default();

    for profile in profiles {
        let records = corpus
            .records_mut()
            .iter_mut()
            .filter(|r| r.technology == profile.technology);
        for record in records {
            if profile.strip_heading_marks {
                strip_heading_marks(record);
            }
            if categorize(record, &profile.categories, default_category) {
                stats.categorized += 1;
            }
            if associate_image(record, &profile.images, catalog) {
                stats.images += 1;
            }
        }
    }

    info!(
        categorized = stats.categorized,
        images = stats.images,
        "enrichment complete"
    );
    stats
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, answer: &str, category: &str) -> QuestionRecord {
        QuestionRecord {
            id: "id".into(),
            technology: "Java".into(),
            category: category.into(),
            title: title.into(),
            answer: answer.into(),
            level: None,
            image: None,
        }
    }

    fn java_profile() -> EnrichmentProfile {
        AppConfig::default()
            .enrichment
            .into_iter()
            .find(|p| p.technology == "Java")
            .expect("default java profile")
    }

    fn catalog_with(files: &[&str]) -> ImageCatalog {
        let mut catalog = ImageCatalog::default();
        for f in files {
            catalog.insert(f, "/images/java-diagrams");
        }
        catalog
    }

    #[test]
    fn categorizes_default_records_by_keyword() {
        let rules = java_profile().categories;
        let mut r = record("How does a HashMap work?", "It buckets entries.", "General");
        assert!(categorize(&mut r, &rules, "General"));
        assert_eq!(r.category, "Collections");
    }

    #[test]
    fn categorize_matches_answer_text() {
        let rules = java_profile().categories;
        let mut r = record("What happens here?", "A NullPointerException is thrown.", "General");
        assert!(categorize(&mut r, &rules, "General"));
        assert_eq!(r.category, "Exceptions");
    }

    #[test]
    fn source_categories_are_never_overwritten() {
        let rules = java_profile().categories;
        let mut r = record("How does a HashMap work?", "", "Java Basics");
        assert!(!categorize(&mut r, &rules, "General"));
        assert_eq!(r.category, "Java Basics");
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = vec![
            CategoryRule { name: "First".into(), keywords: vec!["thread".into()] },
            CategoryRule { name: "Second".into(), keywords: vec!["thread".into()] },
        ];
        let mut r = record("Thread basics?", "", "General");
        categorize(&mut r, &rules, "General");
        assert_eq!(r.category, "First");
    }

    #[test]
    fn associates_diagram_case_insensitively() {
        let rules = java_profile().images;
        let catalog = catalog_with(&["CheckedVsUncheckedException.png"]);
        let mut r = record("Checked vs Unchecked exceptions?", "", "Exceptions");
        assert!(associate_image(&mut r, &rules, &catalog));
        assert_eq!(
            r.image.as_deref(),
            Some("/images/java-diagrams/CheckedVsUncheckedException.png")
        );
    }

    #[test]
    fn missing_diagram_leaves_image_unset() {
        let rules = java_profile().images;
        let catalog = catalog_with(&["JVMArchitecture.png"]);
        let mut r = record("Checked vs Unchecked exceptions?", "", "Exceptions");
        assert!(!associate_image(&mut r, &rules, &catalog));
        assert!(r.image.is_none());
    }

    #[test]
    fn strips_heading_marks() {
        let mut r = record("# What is JVM?", "## Overview\nThe JVM runs bytecode.", "General");
        strip_heading_marks(&mut r);
        assert_eq!(r.title, "What is JVM?");
        assert_eq!(r.answer, "Overview\nThe JVM runs bytecode.");
    }

    #[test]
    fn enrich_only_touches_profile_technology() {
        let mut corpus = Corpus::from(vec![
            record("How does a HashMap work?", "", "General"),
            QuestionRecord {
                technology: "Docker".into(),
                ..record("How does a HashMap work?", "", "General")
            },
        ]);
        let stats = enrich(&mut corpus, &[java_profile()], &ImageCatalog::default(), "General");
        assert_eq!(stats.categorized, 1);
        assert_eq!(corpus.records()[0].category, "Collections");
        assert_eq!(corpus.records()[1].category, "General");
    }

    #[test]
    fn stage_assets_copies_matching_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let images = dir.path().join("images");
        std::fs::create_dir_all(&images).expect("mkdir");
        std::fs::write(images.join("JVMArchitecture.png"), b"png").expect("write");
        std::fs::write(images.join("notes.txt"), b"txt").expect("write");

        let mut config = AppConfig::default();
        config.defaults.root_dir = dir.path().to_string_lossy().into_owned();

        let catalog = stage_assets(&config, true).expect("stage");
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.public_ref("jvmarchitecture.png"),
            Some("/images/java-diagrams/JVMArchitecture.png")
        );
        assert!(config.resolve(&config.assets.dest_dir).join("JVMArchitecture.png").is_file());
        assert!(!config.resolve(&config.assets.dest_dir).join("notes.txt").exists());
    }

    #[test]
    fn stage_assets_without_copy_writes_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let images = dir.path().join("images");
        std::fs::create_dir_all(&images).expect("mkdir");
        std::fs::write(images.join("JavaIndependent.jpg"), b"jpg").expect("write");

        let mut config = AppConfig::default();
        config.defaults.root_dir = dir.path().to_string_lossy().into_owned();

        let catalog = stage_assets(&config, false).expect("stage");
        assert_eq!(catalog.len(), 1);
        assert!(!config.resolve(&config.assets.dest_dir).exists());
    }

    #[test]
    fn missing_image_directory_is_not_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = AppConfig::default();
        config.defaults.root_dir = dir.path().to_string_lossy().into_owned();
        let catalog = stage_assets(&config, true).expect("stage");
        assert!(catalog.is_empty());
    }
}
