//! Typed error kinds at the engine boundary (spec.md §7).

use thiserror::Error;

/// Fatal error: the call returns no redacted text and the caller must
/// re-submit. Corresponds to spec.md §7's InvariantViolation,
/// CancellationError and TimeoutError kinds.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invariant violation in phase `{phase}`: {detail}")]
    InvariantViolation { phase: &'static str, detail: String },

    #[error("processing cancelled")]
    Cancelled,

    #[error("processing timed out after {elapsed_ms}ms (limit {limit_ms}ms)")]
    Timeout { elapsed_ms: u64, limit_ms: u64 },

    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Non-fatal conditions surfaced alongside a successful `process()` result
/// (spec.md §7: "on any non-fatal error, the call returns a redacted text
/// plus a warnings[] list").
#[derive(Debug, Clone, Error)]
pub enum Warning {
    #[error("filter `{filter_id}` failed and was skipped: {detail}")]
    FilterFailed { filter_id: String, detail: String },

    #[error("unknown configuration value `{value}` for `{field}`, using default")]
    ConfigurationFallback { field: &'static str, value: String },

    #[error("feedback store persistence failed: {0}")]
    PersistenceFailed(String),
}
