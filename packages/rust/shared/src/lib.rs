//! Shared types, error model, and configuration for the question bank importer.
//!
//! This crate is the foundation depended on by all other qabank crates.
//! It provides:
//! - [`QaBankError`], the unified error type
//! - Domain types ([`QuestionRecord`], [`Corpus`], [`IdScheme`])
//! - Configuration ([`AppConfig`], [`ExtractConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, AssetsConfig, CategoryRule, ConsolidateConfig, DefaultsConfig, EnrichmentProfile,
    ExtractConfig, ImageRule, ParsingConfig, SourceConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{QaBankError, Result};
pub use types::{Corpus, DEFAULT_CATEGORY, IdScheme, QuestionRecord, slugify};
