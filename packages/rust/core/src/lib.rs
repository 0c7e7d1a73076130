//! Core pipeline orchestration and domain logic for qabank.
//!
//! This crate ties together source reading, markdown extraction, corpus
//! merging, enrichment and persistence into end-to-end workflows
//! (`run_import`) and the standalone maintenance commands.

pub mod consolidate;
pub mod enrichment;
pub mod maintenance;
pub mod merge;
pub mod pipeline;
pub mod reader;
pub mod writer;

pub use maintenance::{
    MaintenanceReport, corpus_stats, run_append, run_cleanup, run_club, run_enrich,
};
pub use pipeline::{ImportOptions, ImportReport, ProgressReporter, SilentProgress, run_import};
pub use writer::Defect;
