//! Orchestrates the contradiction detection pipeline end to end: the
//! single-document run (C10) and the cross-document comparison run (C11),
//! plus the `Repository`/`ObjectStore` boundary both depend on.
//!
//! Everything model-backed (embedding, NER, NLI) is injected into
//! [`Pipeline`] as a trait object at construction time, so this crate never
//! hard-codes a specific inference runtime.

mod cross_doc;
pub mod error;
mod orchestrator;
pub mod repository;
mod scoring;

pub use error::{PipelineError, Result, ERROR_MESSAGE_MAX_LEN};
pub use orchestrator::Pipeline;
pub use repository::{InMemoryObjectStore, InMemoryRepository, ObjectStore, Repository};
