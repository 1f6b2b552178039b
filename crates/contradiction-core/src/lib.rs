//! Shared data model, error types, and configuration for the contradiction
//! detection pipeline.
//!
//! Downstream crates (`contradiction-nlp`, `contradiction-pipeline`) build
//! on the types here rather than redefining them, so a clause or
//! contradiction has exactly one shape across extraction, scoring, and
//! storage.

pub mod config;
pub mod error;
pub mod model;

pub use config::Settings;
pub use error::{CoreError, Result};
pub use model::{
    Clause, Contradiction, ContradictionOwner, ContradictionType, ComparisonSession,
    DocumentRecord, DocumentStatus, ProcessingStage, Severity, EMBEDDING_DIM,
};
