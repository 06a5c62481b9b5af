//! Engine Facade (spec.md §4.I): the single entry point. Orchestrates
//! A (classify) → B (filter dispatch, parallel) → C (candidate pool) →
//! D (context scoring, parallel) / E (adaptive threshold, inline with D)
//! → F (conflict resolution) → G (replacement application).

use crate::apply::apply_redactions;
use crate::crypto::Salt;
use crate::document::{classify, Classification, Document};
use crate::errors::{EngineError, Warning};
use crate::feedback::FeedbackStore;
use crate::filters::run_filters;
use crate::policy::Policy;
use crate::pool::CandidatePool;
use crate::resolver::resolve;
use crate::scorer::ContextScorer;
use crate::span::{Category, Redaction};
use crate::threshold::AdaptiveThresholdService;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

/// Bounds the worker pool sizing both filter dispatch (phase B) and span
/// scoring (phase D); spec.md §5: "hardware parallelism with an upper
/// cap (default 8)".
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub max_parallelism: usize,
    /// Soft wall-clock budget for a single `process()` call, checked at
    /// phase boundaries (spec.md §5). `None` disables the check.
    pub timeout_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig { max_parallelism: 8, timeout_ms: None }
    }
}

/// Per-call diagnostics (spec.md §4.I, §6: "implementers may additionally
/// report the set of vocabulary vetoes and threshold rejections").
#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub category_counts: HashMap<Category, usize>,
    pub elapsed_ms: u64,
    pub vocabulary_vetoes: usize,
    pub threshold_rejections: usize,
    pub degraded_filters: Vec<String>,
    /// Per-redaction correlation id, keyed to each entry in
    /// `ProcessOutput::redactions` by index: a salted, non-reversible
    /// hash of the redacted span's original surface text (SPEC_FULL.md
    /// supplement to spec.md §1's stable-per-process-salt carve-out).
    pub correlation_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub text: String,
    pub redactions: Vec<Redaction>,
    pub classification: Classification,
    pub stats: Stats,
    pub warnings: Vec<Warning>,
}

/// The engine facade (spec.md §4.I). Filters are process-wide and
/// shared read-only (spec.md §5); the feedback store is process-wide
/// with single-writer/multi-reader semantics.
pub struct Engine {
    config: EngineConfig,
    feedback: FeedbackStore,
    pool: rayon::ThreadPool,
    salt: Salt,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            pool: build_pool(config.max_parallelism),
            config,
            feedback: FeedbackStore::in_memory(),
            salt: Salt::generate(),
        }
    }

    /// Loads a persisted feedback store from `path` (missing/corrupt is
    /// treated as empty per spec.md §4.H).
    pub fn with_feedback_store(config: EngineConfig, path: impl AsRef<Path>) -> Self {
        Engine {
            pool: build_pool(config.max_parallelism),
            config,
            feedback: FeedbackStore::load(path),
            salt: Salt::generate(),
        }
    }

    pub fn feedback_store(&self) -> &FeedbackStore {
        &self.feedback
    }

    /// `process(text, policy?) -> {text, redactions, classification,
    /// stats}` (spec.md §4.I). Never returns a partial redaction set: a
    /// fatal error means the original text is untouched by the caller.
    pub fn process(&self, text: &str, policy: &Policy) -> Result<ProcessOutput, EngineError> {
        let start = Instant::now();
        let mut warnings = Vec::new();

        // A: classify.
        let classification_span = tracing::info_span!("classify");
        let _guard = classification_span.enter();
        let classification = classify(text, policy.purpose_of_use);
        drop(_guard);
        check_timeout(start, self.config.timeout_ms)?;

        let mut document = Document::new(text);
        document.set_classification(classification.clone());

        // B: filter dispatch, parallel on the bounded pool.
        let dispatch_span = tracing::info_span!("filter_dispatch");
        let _guard = dispatch_span.enter();
        let outcomes = run_filters(document.text(), policy, &self.pool);
        drop(_guard);
        check_timeout(start, self.config.timeout_ms)?;

        let mut pool = CandidatePool::new();
        let mut degraded_filters = Vec::new();
        for outcome in outcomes {
            if outcome.failed {
                degraded_filters.push(outcome.filter_id.to_string());
                warnings.push(Warning::FilterFailed {
                    filter_id: outcome.filter_id.to_string(),
                    detail: "filter panicked during scan".to_string(),
                });
                continue;
            }
            pool.extend(outcome.spans);
        }
        let candidates = pool.freeze();

        // D: context scoring, parallel. E: adaptive threshold, inline
        // with D, per spec.md §4.I orchestration note.
        let scoring_span = tracing::info_span!("context_scoring");
        let _guard = scoring_span.enter();
        let scorer = ContextScorer::default();
        let threshold_service = AdaptiveThresholdService::new(Some(&self.feedback));

        let scored: Vec<_> = self.pool.install(|| {
            use rayon::prelude::*;
            candidates
                .into_par_iter()
                .map(|candidate| {
                    let mut scored = scorer.score(&document, candidate);
                    scored.threshold = threshold_service.threshold_for(&classification, scored.span.category);
                    scored
                })
                .collect()
        });
        drop(_guard);
        check_timeout(start, self.config.timeout_ms)?;

        let mut vocabulary_vetoes = 0usize;
        let mut threshold_rejections = 0usize;
        let surviving: Vec<_> = scored
            .into_iter()
            .filter(|s| {
                let vetoed = s
                    .context_signals
                    .iter()
                    .any(|sig| sig.source == "vocabulary" && sig.delta < 0.0);
                if vetoed {
                    vocabulary_vetoes += 1;
                }
                let passes = s.passes() && s.confidence >= policy.min_confidence;
                if !passes {
                    threshold_rejections += 1;
                }
                passes
            })
            .collect();

        // F: conflict resolution.
        let resolve_span = tracing::info_span!("conflict_resolution");
        let _guard = resolve_span.enter();
        let redactions = resolve(surviving);
        drop(_guard);
        check_timeout(start, self.config.timeout_ms)?;

        check_invariants(text, &redactions)?;

        // G: replacement application.
        let apply_span = tracing::info_span!("apply");
        let _guard = apply_span.enter();
        let redacted_text = apply_redactions(&document, &redactions, policy)?;
        drop(_guard);

        let mut category_counts: HashMap<Category, usize> = HashMap::new();
        for r in &redactions {
            *category_counts.entry(r.category).or_insert(0) += 1;
        }
        let correlation_ids: Vec<String> = redactions
            .iter()
            .map(|r| self.salt.correlate(document.slice(r.start, r.end)))
            .collect();

        let stats = Stats {
            category_counts,
            elapsed_ms: start.elapsed().as_millis() as u64,
            vocabulary_vetoes,
            threshold_rejections,
            degraded_filters,
            correlation_ids,
        };

        Ok(ProcessOutput {
            text: redacted_text,
            redactions,
            classification,
            stats,
            warnings,
        })
    }
}

/// Checked at each phase boundary (spec.md §5: "configurable soft
/// timeout"). A `None` limit never fires.
fn check_timeout(start: Instant, limit_ms: Option<u64>) -> Result<(), EngineError> {
    let Some(limit_ms) = limit_ms else {
        return Ok(());
    };
    let elapsed_ms = start.elapsed().as_millis() as u64;
    if elapsed_ms > limit_ms {
        return Err(EngineError::Timeout { elapsed_ms, limit_ms });
    }
    Ok(())
}

/// Defensive re-verification of the resolver's non-overlap and
/// coverage-bound guarantees (spec.md §8 invariants 1-2). Should never
/// trip; if it does, this is an `InvariantViolation`, not a panic,
/// matching spec.md §7's "Failure mode" note.
fn check_invariants(text: &str, redactions: &[Redaction]) -> Result<(), EngineError> {
    let mut sorted: Vec<&Redaction> = redactions.iter().collect();
    sorted.sort_by_key(|r| r.start);

    let mut covered = 0usize;
    let text_len = text.chars().count();
    for pair in sorted.windows(2) {
        if pair[0].end > pair[1].start {
            return Err(EngineError::InvariantViolation {
                phase: "conflict_resolution",
                detail: format!(
                    "overlapping redactions: [{}, {}) and [{}, {})",
                    pair[0].start, pair[0].end, pair[1].start, pair[1].end
                ),
            });
        }
    }
    for r in &sorted {
        if r.end > text_len || r.start > r.end {
            return Err(EngineError::InvariantViolation {
                phase: "conflict_resolution",
                detail: format!("out-of-range redaction [{}, {}) over {}-char text", r.start, r.end, text_len),
            });
        }
        covered += r.end - r.start;
    }
    if covered > text_len {
        return Err(EngineError::InvariantViolation {
            phase: "conflict_resolution",
            detail: format!("coverage {} exceeds text length {}", covered, text_len),
        });
    }
    Ok(())
}

fn build_pool(max_parallelism: usize) -> rayon::ThreadPool {
    let available = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    let threads = available.min(max_parallelism).max(1);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .expect("failed to build worker pool")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_to_end_scenario_one_finds_four_categories_in_order() {
        let engine = Engine::new(EngineConfig::default());
        let policy = Policy::default();
        let text = "Patient: John Smith\nDOB: 04/22/1978\nMRN: 7834921\nSSN: 456-78-9012";
        let out = engine.process(text, &policy).expect("process should succeed");
        let categories: Vec<_> = out.redactions.iter().map(|r| r.category).collect();
        assert_eq!(categories, vec![Category::Name, Category::Date, Category::Mrn, Category::Ssn]);
    }

    #[test]
    fn end_to_end_scenario_two_vocabulary_preserves_diagnosis() {
        let engine = Engine::new(EngineConfig::default());
        let policy = Policy::default();
        let text = "Diagnosis: Invasive Ductal Carcinoma. Patient: John Smith.";
        let out = engine.process(text, &policy).expect("process should succeed");
        assert_eq!(out.redactions.len(), 1);
        assert_eq!(out.redactions[0].category, Category::Name);
        assert!(out.text.contains("Invasive Ductal Carcinoma"));
    }

    #[test]
    fn end_to_end_scenario_three_structured_noise_yields_no_redactions() {
        let engine = Engine::new(EngineConfig::default());
        let policy = Policy::default();
        let text = "Model: S-100  Serial: 8849-221-00  Room: 404  Call Button: 555";
        let out = engine.process(text, &policy).expect("process should succeed");
        assert!(out.redactions.is_empty());
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let engine = Engine::new(EngineConfig::default());
        let policy = Policy::default();
        let out = engine.process("", &policy).expect("process should succeed");
        assert!(out.redactions.is_empty());
        assert_eq!(out.text, "");
    }

    #[test]
    fn processing_is_idempotent() {
        let engine = Engine::new(EngineConfig::default());
        let policy = Policy::default();
        let text = "Patient: John Smith\nSSN: 456-78-9012";
        let first = engine.process(text, &policy).expect("first process");
        let second = engine.process(&first.text, &policy).expect("second process");
        assert_eq!(second.text, first.text);
    }

    #[test]
    fn processing_is_deterministic() {
        let engine = Engine::new(EngineConfig::default());
        let policy = Policy::default();
        let text = "Patient: John Smith\nSSN: 456-78-9012";
        let a = engine.process(text, &policy).expect("process a");
        let b = engine.process(text, &policy).expect("process b");
        assert_eq!(a.text, b.text);
    }

    #[test]
    fn disabling_a_category_never_adds_redactions() {
        let engine = Engine::new(EngineConfig::default());
        let text = "Patient: John Smith\nSSN: 456-78-9012";
        let full = engine.process(text, &Policy::default()).expect("full policy");

        let mut restricted = Policy::default();
        restricted.identifiers.insert(Category::Ssn, false);
        let without_ssn = engine.process(text, &restricted).expect("restricted policy");

        assert!(without_ssn.redactions.len() <= full.redactions.len());
        assert!(!without_ssn.redactions.iter().any(|r| r.category == Category::Ssn));
    }

    #[test]
    fn zero_timeout_aborts_with_a_timeout_error() {
        let config = EngineConfig { max_parallelism: 8, timeout_ms: Some(0) };
        let engine = Engine::new(config);
        let text = "Patient: John Smith\nSSN: 456-78-9012";
        let err = engine.process(text, &Policy::default()).expect_err("should time out");
        assert!(matches!(err, EngineError::Timeout { .. }));
    }

    #[test]
    fn generous_timeout_never_fires() {
        let config = EngineConfig { max_parallelism: 8, timeout_ms: Some(60_000) };
        let engine = Engine::new(config);
        let text = "Patient: John Smith\nSSN: 456-78-9012";
        let out = engine.process(text, &Policy::default()).expect("process should succeed");
        assert!(!out.redactions.is_empty());
    }

    #[test]
    fn stats_carry_one_correlation_id_per_redaction() {
        let engine = Engine::new(EngineConfig::default());
        let text = "Patient: John Smith\nSSN: 456-78-9012";
        let out = engine.process(text, &Policy::default()).expect("process should succeed");
        assert_eq!(out.stats.correlation_ids.len(), out.redactions.len());
    }

    #[test]
    fn correlation_id_is_stable_across_identical_runs() {
        let engine = Engine::new(EngineConfig::default());
        let text = "Patient: John Smith\nSSN: 456-78-9012";
        let a = engine.process(text, &Policy::default()).expect("process a");
        let b = engine.process(text, &Policy::default()).expect("process b");
        assert_eq!(a.stats.correlation_ids, b.stats.correlation_ids);
    }

    #[test]
    fn lowering_min_confidence_never_removes_redactions() {
        let engine = Engine::new(EngineConfig::default());
        let text = "Patient: John Smith\nSSN: 456-78-9012";

        let mut strict = Policy::default();
        strict.min_confidence = 0.99;
        let strict_out = engine.process(text, &strict).expect("strict policy");

        let mut lenient = Policy::default();
        lenient.min_confidence = 0.0;
        let lenient_out = engine.process(text, &lenient).expect("lenient policy");

        assert!(lenient_out.redactions.len() >= strict_out.redactions.len());
    }
}
