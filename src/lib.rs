//! PHI redaction engine: multi-filter span detection, context-aware
//! confidence scoring, adaptive thresholds, conflict resolution and
//! idempotent text redaction.
//!
//! [`Engine::process`] is the single entry point (spec.md §4.I);
//! everything else is exposed for embedders who want to drive the
//! pipeline's stages individually (custom filters, a different
//! persistence layer for the feedback store, DICOM-tag anonymization
//! via [`dicom`]).

pub mod apply;
pub mod crypto;
pub mod dicom;
pub mod document;
pub mod engine;
pub mod errors;
pub mod feedback;
pub mod filters;
pub mod policy;
pub mod pool;
pub mod resolver;
pub mod scorer;
pub mod span;
pub mod threshold;
pub mod vocabulary;

pub use document::{classify, Classification, ContextStrength, Document, DocumentType, PurposeOfUse, Specialty};
pub use engine::{Engine, EngineConfig, ProcessOutput, Stats};
pub use errors::{EngineError, Warning};
pub use policy::{PlaceholderStyle, Policy};
pub use span::{Category, Redaction};

/// Initializes global tracing for embedders that don't already run a
/// subscriber (mirrors the teacher's `init_core`). Safe to call more
/// than once; subsequent calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    tracing::info!("vulpes-phi-core tracing initialized");
}
