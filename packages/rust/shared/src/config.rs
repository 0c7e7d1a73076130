//! Application configuration for the question bank importer.
//!
//! User config lives at `~/.qabank/qabank.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{QaBankError, Result};
use crate::types::{DEFAULT_CATEGORY, IdScheme};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "qabank.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".qabank";

// ---------------------------------------------------------------------------
// Config structs (matching qabank.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Line classifier settings.
    #[serde(default)]
    pub parsing: ParsingConfig,

    /// Image asset locations.
    #[serde(default)]
    pub assets: AssetsConfig,

    /// Markdown documents to import.
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,

    /// Per-technology categorization and image rules.
    #[serde(default = "default_enrichment")]
    pub enrichment: Vec<EnrichmentProfile>,

    /// Technologies collapsed into a single record after import.
    #[serde(default = "default_consolidate")]
    pub consolidate: Vec<ConsolidateConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            defaults: DefaultsConfig::default(),
            parsing: ParsingConfig::default(),
            assets: AssetsConfig::default(),
            sources: default_sources(),
            enrichment: default_enrichment(),
            consolidate: default_consolidate(),
        }
    }
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Base directory for relative source, asset and output paths.
    #[serde(default = "default_root_dir")]
    pub root_dir: String,

    /// Corpus file read as the merge baseline and rewritten on every run.
    #[serde(default = "default_output")]
    pub output: String,

    /// Category for records found before any category heading.
    #[serde(default = "default_category")]
    pub default_category: String,

    /// How record ids are minted.
    #[serde(default)]
    pub id_scheme: IdScheme,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            output: default_output(),
            default_category: default_category(),
            id_scheme: IdScheme::default(),
        }
    }
}

fn default_root_dir() -> String {
    ".".into()
}
fn default_output() -> String {
    "client/src/data/questions.json".into()
}
fn default_category() -> String {
    DEFAULT_CATEGORY.into()
}

/// `[parsing]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsingConfig {
    /// Heading depths that open a new category.
    #[serde(default = "default_category_levels")]
    pub category_levels: Vec<u8>,

    /// Heading depths that open a new question.
    #[serde(default = "default_question_levels")]
    pub question_levels: Vec<u8>,

    /// Whether `1. Question` list lines open a question.
    #[serde(default = "default_true")]
    pub numbered_questions: bool,

    /// Category headings containing any of these are document titles.
    #[serde(default = "default_title_markers")]
    pub title_markers: Vec<String>,

    /// Lines containing any of these are dropped.
    #[serde(default = "default_skip_markers")]
    pub skip_markers: Vec<String>,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            category_levels: default_category_levels(),
            question_levels: default_question_levels(),
            numbered_questions: true,
            title_markers: default_title_markers(),
            skip_markers: default_skip_markers(),
        }
    }
}

fn default_category_levels() -> Vec<u8> {
    vec![1, 2]
}
fn default_question_levels() -> Vec<u8> {
    vec![3, 4]
}
fn default_true() -> bool {
    true
}
fn default_title_markers() -> Vec<String> {
    vec!["interview".into()]
}
fn default_skip_markers() -> Vec<String> {
    vec!["badgen.net".into(), "Table of Contents".into()]
}

/// `[assets]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Directory holding the original diagram files.
    #[serde(default = "default_asset_source")]
    pub source_dir: String,

    /// Directory the diagrams are copied into.
    #[serde(default = "default_asset_dest")]
    pub dest_dir: String,

    /// URL prefix under which `dest_dir` is served.
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,

    /// File extensions (without dot) treated as images.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            source_dir: default_asset_source(),
            dest_dir: default_asset_dest(),
            public_prefix: default_public_prefix(),
            extensions: default_extensions(),
        }
    }
}

fn default_asset_source() -> String {
    "images".into()
}
fn default_asset_dest() -> String {
    "client/public/images/java-diagrams".into()
}
fn default_public_prefix() -> String {
    "/images/java-diagrams".into()
}
fn default_extensions() -> Vec<String> {
    vec!["png".into(), "jpg".into()]
}

/// `[[sources]]` entry: one markdown document feeding one technology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory (relative to `root_dir`) containing the document.
    pub folder: String,
    /// Document file name inside `folder`.
    pub file: String,
    /// Technology tag stamped on every extracted record.
    pub technology: String,
    /// Level tag stamped on every extracted record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Skip every line before the first one starting with this marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_after: Option<String>,
}

impl SourceConfig {
    fn new(folder: &str, file: &str, technology: &str) -> Self {
        Self {
            folder: folder.into(),
            file: file.into(),
            technology: technology.into(),
            level: None,
            start_after: None,
        }
    }
}

fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::new("java-interview-questions-main", "README.md", "Java"),
        SourceConfig {
            level: Some("Advanced".into()),
            ..SourceConfig::new("custom-content/java", "ADVANCED.md", "Java")
        },
        SourceConfig::new("custom-content/spring-boot", "README.md", "Spring Boot"),
        SourceConfig::new("custom-content/spring-boot", "ADVANCED.md", "Spring Boot"),
        SourceConfig::new("custom-content/spring-boot", "CODING.md", "Spring Boot"),
        SourceConfig::new("custom-content/spring-boot", "EXTRAS.md", "Spring Boot"),
        SourceConfig::new("docker-cheat-sheet-master", "README.md", "Docker"),
        SourceConfig::new("system-design-concepts-main", "README.md", "System Design"),
        SourceConfig::new("javascript-interview-questions-master", "README.md", "JavaScript"),
        SourceConfig {
            start_after: Some("## Core React".into()),
            ..SourceConfig::new("reactjs-interview-questions-master", "README.md", "React")
        },
    ]
}

/// `[[enrichment]]` entry: rules applied to one technology's records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentProfile {
    /// Technology the rules apply to.
    pub technology: String,

    /// Remove stray `#` from titles and `##` from answers.
    #[serde(default)]
    pub strip_heading_marks: bool,

    /// Ordered keyword table for records still in the default category.
    #[serde(default)]
    pub categories: Vec<CategoryRule>,

    /// Ordered title rules mapping to image files.
    #[serde(default)]
    pub images: Vec<ImageRule>,
}

/// Assign `name` when any keyword occurs in the title or answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Associate `file` when every substring in `all` occurs in the lowercased title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRule {
    pub all: Vec<String>,
    pub file: String,
}

fn category(name: &str, keywords: &[&str]) -> CategoryRule {
    CategoryRule {
        name: name.into(),
        keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
    }
}

fn image(all: &[&str], file: &str) -> ImageRule {
    ImageRule {
        all: all.iter().map(|k| (*k).to_string()).collect(),
        file: file.into(),
    }
}

fn default_enrichment() -> Vec<EnrichmentProfile> {
    vec![EnrichmentProfile {
        technology: "Java".into(),
        strip_heading_marks: true,
        categories: vec![
            category(
                "Collections",
                &[
                    "list", "set", "map", "queue", "collection", "iterator", "arraylist",
                    "hashmap", "hashset", "linkedlist", "treemap",
                ],
            ),
            category(
                "Exceptions",
                &["exception", "error", "throw", "catch", "checked", "unchecked", "try"],
            ),
            category(
                "Threads",
                &[
                    "thread", "runnable", "synchronization", "lock", "concurrency", "executor",
                    "callable", "future", "deadlock",
                ],
            ),
            category(
                "OOP",
                &[
                    "polymorphism", "inheritance", "encapsulation", "abstraction", "interface",
                    "abstract class", "overloading", "overriding",
                ],
            ),
            category(
                "JVM",
                &[
                    "jvm", "jdk", "jre", "memory", "heap", "stack", "garbage collection", "gc",
                    "classloader",
                ],
            ),
            category(
                "Java 8+",
                &[
                    "stream", "lambda", "functional interface", "optional", "method reference",
                    "date time api",
                ],
            ),
            category(
                "String",
                &["string", "stringbuilder", "stringbuffer", "substring", "equals", "intern"],
            ),
            category("Generics", &["generic", "type erasure", "wildcard"]),
            category("Serialization", &["serialization", "serializable", "externalizable"]),
        ],
        images: vec![
            image(&["checked", "unchecked"], "CheckedVsUncheckedException.png"),
            image(&["collection", "hierarchy"], "CollectionsHierarchy.png"),
            image(&["jvm", "architecture"], "JVMArchitecture.png"),
            image(&["jdk", "jre"], "JVM_JRE_JDK.png"),
            image(&["difference between jdk"], "JVM_JRE_JDK.png"),
            image(&["platform independent"], "JavaIndependent.png"),
        ],
    }]
}

/// `[[consolidate]]` entry: the record replacing a whole technology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidateConfig {
    pub technology: String,
    pub id: String,
    pub title: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

fn default_consolidate() -> Vec<ConsolidateConfig> {
    vec![ConsolidateConfig {
        technology: "System Design".into(),
        id: "system-design-master".into(),
        title: "System Design Concepts (Compiled)".into(),
        category: "Architecture".into(),
        level: Some("Advanced".into()),
    }]
}

// ---------------------------------------------------------------------------
// Extract config (runtime, derived from the parsing section)
// ---------------------------------------------------------------------------

/// Runtime line-classifier configuration.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Category before any heading.
    pub default_category: String,
    /// Heading depths that open a category.
    pub category_levels: Vec<u8>,
    /// Heading depths that open a question.
    pub question_levels: Vec<u8>,
    /// Whether numbered list lines open a question.
    pub numbered_questions: bool,
    /// Lowercased document-title markers.
    pub title_markers: Vec<String>,
    /// Boilerplate substrings.
    pub skip_markers: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ExtractConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            default_category: config.defaults.default_category.clone(),
            category_levels: config.parsing.category_levels.clone(),
            question_levels: config.parsing.question_levels.clone(),
            numbered_questions: config.parsing.numbered_questions,
            title_markers: config
                .parsing
                .title_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
            skip_markers: config.parsing.skip_markers.clone(),
        }
    }
}

impl AppConfig {
    /// Resolve a configured path against `root_dir`.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            Path::new(&self.defaults.root_dir).join(p)
        }
    }

    /// Absolute-or-root-relative path of the output corpus.
    pub fn output_path(&self) -> PathBuf {
        self.resolve(&self.defaults.output)
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let levels = self
            .parsing
            .category_levels
            .iter()
            .chain(&self.parsing.question_levels);
        for level in levels {
            if !(1..=6).contains(level) {
                return Err(QaBankError::config(format!(
                    "heading level {level} out of range 1-6"
                )));
            }
        }
        if let Some(level) = self
            .parsing
            .category_levels
            .iter()
            .find(|l| self.parsing.question_levels.contains(l))
        {
            return Err(QaBankError::config(format!(
                "heading level {level} is both a category and a question level"
            )));
        }
        if self.defaults.default_category.trim().is_empty() {
            return Err(QaBankError::config("default_category must not be empty"));
        }
        if let Some(source) = self.sources.iter().find(|s| s.technology.trim().is_empty()) {
            return Err(QaBankError::config(format!(
                "source {}/{} has an empty technology",
                source.folder, source.file
            )));
        }
        if let Some(club) = self
            .consolidate
            .iter()
            .find(|c| c.id.trim().is_empty() || c.title.trim().is_empty())
        {
            return Err(QaBankError::config(format!(
                "consolidation of '{}' needs a non-empty id and title",
                club.technology
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.qabank/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| QaBankError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.qabank/qabank.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| QaBankError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        QaBankError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| QaBankError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| QaBankError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| QaBankError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("output"));
        assert!(toml_str.contains("System Design"));
        assert!(toml_str.contains("CheckedVsUncheckedException.png"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.parsing.category_levels, vec![1, 2]);
        assert_eq!(parsed.sources, config.sources);
        assert_eq!(parsed.consolidate, config.consolidate);
        assert_eq!(parsed.enrichment[0].categories.len(), 9);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[defaults]
root_dir = "/srv/interview"
id_scheme = "deterministic"

[[sources]]
folder = "kotlin-interview-questions"
file = "README.md"
technology = "Kotlin"
level = "Beginner"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.id_scheme, IdScheme::Deterministic);
        assert_eq!(config.defaults.default_category, "General");
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].level.as_deref(), Some("Beginner"));
        // Omitted tables fall back to the built-in set.
        assert_eq!(config.enrichment[0].technology, "Java");
        assert_eq!(
            config.output_path(),
            PathBuf::from("/srv/interview/client/src/data/questions.json")
        );
    }

    #[test]
    fn extract_config_from_app_config() {
        let mut app = AppConfig::default();
        app.parsing.title_markers = vec!["Cheat Sheet".into()];
        let extract = ExtractConfig::from(&app);
        assert_eq!(extract.default_category, "General");
        assert_eq!(extract.question_levels, vec![3, 4]);
        assert_eq!(extract.title_markers, vec!["cheat sheet"]);
    }

    #[test]
    fn validate_rejects_overlapping_levels() {
        let mut config = AppConfig::default();
        config.parsing.question_levels = vec![2, 3];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("both a category and a question level"));
    }

    #[test]
    fn validate_rejects_out_of_range_levels() {
        let mut config = AppConfig::default();
        config.parsing.question_levels = vec![7];
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn resolve_keeps_absolute_paths() {
        let config = AppConfig::default();
        assert_eq!(config.resolve("/tmp/x.json"), PathBuf::from("/tmp/x.json"));
        assert_eq!(config.resolve("images"), PathBuf::from("./images"));
    }
}
