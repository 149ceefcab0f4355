//! Sentiwatch Runner: pipeline orchestration, configuration, summary, export.
//!
//! This crate builds on `sentiwatch-core` to provide:
//! - Run configuration, settings file, and credential resolution
//! - The pipeline orchestrator with its busy guard and issue list
//! - Run summary scalars and a determinism digest
//! - JSON, CSV, and Markdown artifacts of a run

pub mod config;
pub mod export;
pub mod pipeline;
pub mod summary;

pub use config::{ConfigError, Credentials, RunConfig, Settings};
pub use export::{export_aligned_csv, export_json, generate_report, save_artifacts};
pub use pipeline::{
    ArticleReport, IssueKind, Pipeline, PipelineError, PipelineIssue, PipelineOutput,
    SCHEMA_VERSION,
};
pub use summary::{digest, RunSummary, TechniqueSummary};
