//! Feedback Store (spec.md §4.H): persists per-context observation
//! counts and a learned threshold modifier, single-writer/multi-reader,
//! loaded at startup and flushed on each update. Corruption or absence
//! of the persisted file is non-fatal — the store simply starts empty,
//! per spec.md §4.H.

use crate::document::{ContextStrength, DocumentType, Specialty};
use crate::span::Category;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// `(documentType, specialty, contextStrength, category)` per spec.md §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextKey {
    pub document_type: DocumentType,
    pub specialty: Specialty,
    pub context_strength: ContextStrength,
    pub category: Category,
}

impl ContextKey {
    pub fn new(
        document_type: DocumentType,
        specialty: Specialty,
        context_strength: ContextStrength,
        category: Category,
    ) -> Self {
        ContextKey { document_type, specialty, context_strength, category }
    }

    fn as_string_key(&self) -> String {
        format!(
            "{:?}:{:?}:{:?}:{}",
            self.document_type, self.specialty, self.context_strength, self.category.tag()
        )
    }
}

const MIN_SAMPLE_COUNT: u32 = 50;
const TARGET_SENSITIVITY: f64 = 0.98;
const TARGET_SPECIFICITY: f64 = 0.95;
const MAX_ADJUSTMENT: f64 = 0.15;
const MIN_MODIFIER: f64 = 0.8;
const MAX_MODIFIER: f64 = 1.2;

/// One observation reported by a caller after ground truth becomes
/// available (spec.md §4.H contract).
pub struct Observation {
    pub context_key: ContextKey,
    pub confidence: f64,
    pub applied_threshold: f64,
    pub outcome: Outcome,
}

pub enum Outcome {
    TruePositive,
    TrueNegative,
    FalsePositive,
    FalseNegative,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct FeedbackRecord {
    true_positives: u64,
    true_negatives: u64,
    false_positives: u64,
    false_negatives: u64,
    last_updated: u64,
    learned_modifier: f64,
}

impl FeedbackRecord {
    fn sample_count(&self) -> u32 {
        (self.true_positives + self.true_negatives + self.false_positives + self.false_negatives)
            .min(u32::MAX as u64) as u32
    }

    fn recompute_modifier(&mut self, now: u64) {
        let sensitivity = if self.true_positives + self.false_negatives == 0 {
            1.0
        } else {
            self.true_positives as f64 / (self.true_positives + self.false_negatives) as f64
        };
        let specificity = if self.true_negatives + self.false_positives == 0 {
            1.0
        } else {
            self.true_negatives as f64 / (self.true_negatives + self.false_positives) as f64
        };

        let mut m = 1.0;
        if sensitivity < TARGET_SENSITIVITY {
            let gap = TARGET_SENSITIVITY - sensitivity;
            m *= 1.0 - gap.min(MAX_ADJUSTMENT);
        }
        if specificity < TARGET_SPECIFICITY {
            let gap = TARGET_SPECIFICITY - specificity;
            m *= 1.0 + gap.min(MAX_ADJUSTMENT);
        }
        self.learned_modifier = m.clamp(MIN_MODIFIER, MAX_MODIFIER);
        self.last_updated = now;
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FeedbackFile {
    records: HashMap<String, FeedbackRecord>,
}

/// Single-writer/multi-reader persisted feedback store (spec.md §5, §4.H).
pub struct FeedbackStore {
    path: Option<PathBuf>,
    inner: RwLock<FeedbackFile>,
}

impl FeedbackStore {
    /// An in-memory-only store with no backing file; never persists.
    pub fn in_memory() -> Self {
        FeedbackStore {
            path: None,
            inner: RwLock::new(FeedbackFile::default()),
        }
    }

    /// Loads from `path` if it exists and parses; a missing or corrupt
    /// file is treated as empty (spec.md §4.H: "non-fatal").
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let file = fs::read_to_string(&path)
            .ok()
            .and_then(|contents| serde_json::from_str::<FeedbackFile>(&contents).ok())
            .unwrap_or_default();
        FeedbackStore {
            path: Some(path),
            inner: RwLock::new(file),
        }
    }

    /// Modifier for a context key; absence defaults to 1.0 (spec.md §6).
    pub fn modifier_for(
        &self,
        document_type: DocumentType,
        specialty: Specialty,
        context_strength: ContextStrength,
        category: Category,
    ) -> f64 {
        let key = ContextKey::new(document_type, specialty, context_strength, category);
        let guard = self.inner.read().expect("feedback store lock poisoned");
        guard
            .records
            .get(&key.as_string_key())
            .map(|r| r.learned_modifier)
            .filter(|m| *m != 0.0)
            .unwrap_or(1.0)
    }

    /// Records an observation and recomputes the modifier once the
    /// sample count crosses `MIN_SAMPLE_COUNT`, thereafter on every
    /// observation (spec.md §4.H). Flushes to disk if backed by a file;
    /// a write failure is swallowed — callers surface it as a
    /// `Warning::PersistenceFailed` upstream if they choose to check
    /// `flush()`'s return value directly.
    pub fn record(&self, observation: Observation) {
        let now = now_unix();
        let key = observation.context_key.as_string_key();
        let mut guard = self.inner.write().expect("feedback store lock poisoned");
        let record = guard.records.entry(key).or_default();
        match observation.outcome {
            Outcome::TruePositive => record.true_positives += 1,
            Outcome::TrueNegative => record.true_negatives += 1,
            Outcome::FalsePositive => record.false_positives += 1,
            Outcome::FalseNegative => record.false_negatives += 1,
        }
        if record.sample_count() >= MIN_SAMPLE_COUNT {
            record.recompute_modifier(now);
        }
        drop(guard);
        let _ = self.flush();
    }

    /// Atomic replace: write to a sibling temp file, then rename over
    /// the target (spec.md §6 "Atomic replace on write").
    pub fn flush(&self) -> std::io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let guard = self.inner.read().expect("feedback store lock poisoned");
        let serialized = serde_json::to_string_pretty(&*guard)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, serialized)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modifier(store: &FeedbackStore, document_type: DocumentType, category: Category) -> f64 {
        store.modifier_for(document_type, Specialty::Unknown, ContextStrength::Weak, category)
    }

    fn key(document_type: DocumentType, category: Category) -> ContextKey {
        ContextKey::new(document_type, Specialty::Unknown, ContextStrength::Weak, category)
    }

    #[test]
    fn absent_context_key_defaults_to_one() {
        let store = FeedbackStore::in_memory();
        let m = modifier(&store, DocumentType::Unknown, Category::Name);
        assert_eq!(m, 1.0);
    }

    #[test]
    fn low_sensitivity_below_minimum_sample_count_does_not_move_modifier() {
        let store = FeedbackStore::in_memory();
        for _ in 0..10 {
            store.record(Observation {
                context_key: key(DocumentType::ProgressNote, Category::Name),
                confidence: 0.6,
                applied_threshold: 0.5,
                outcome: Outcome::FalseNegative,
            });
        }
        let m = modifier(&store, DocumentType::ProgressNote, Category::Name);
        assert_eq!(m, 1.0);
    }

    #[test]
    fn low_sensitivity_past_minimum_sample_count_lowers_modifier() {
        let store = FeedbackStore::in_memory();
        for _ in 0..60 {
            store.record(Observation {
                context_key: key(DocumentType::ProgressNote, Category::Name),
                confidence: 0.6,
                applied_threshold: 0.5,
                outcome: Outcome::FalseNegative,
            });
        }
        let m = modifier(&store, DocumentType::ProgressNote, Category::Name);
        assert!(m < 1.0);
        assert!(m >= MIN_MODIFIER);
    }

    #[test]
    fn modifier_is_clamped_to_bounds() {
        let store = FeedbackStore::in_memory();
        for _ in 0..200 {
            store.record(Observation {
                context_key: key(DocumentType::Unknown, Category::Ssn),
                confidence: 0.9,
                applied_threshold: 0.5,
                outcome: Outcome::FalsePositive,
            });
        }
        let m = modifier(&store, DocumentType::Unknown, Category::Ssn);
        assert!(m <= MAX_MODIFIER && m >= MIN_MODIFIER);
    }

    #[test]
    fn persists_and_reloads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("feedback.json");
        {
            let store = FeedbackStore::load(&path);
            for _ in 0..60 {
                store.record(Observation {
                    context_key: key(DocumentType::LaboratoryReport, Category::Mrn),
                    confidence: 0.55,
                    applied_threshold: 0.5,
                    outcome: Outcome::FalseNegative,
                });
            }
        }
        let reloaded = FeedbackStore::load(&path);
        let m = modifier(&reloaded, DocumentType::LaboratoryReport, Category::Mrn);
        assert!(m < 1.0);
    }

    #[test]
    fn missing_file_loads_as_empty_store() {
        let store = FeedbackStore::load("/nonexistent/path/feedback.json");
        assert_eq!(modifier(&store, DocumentType::Unknown, Category::Name), 1.0);
    }

    #[test]
    fn distinct_specialty_or_context_strength_are_independent_contexts() {
        let store = FeedbackStore::in_memory();
        for _ in 0..60 {
            store.record(Observation {
                context_key: ContextKey::new(
                    DocumentType::ProgressNote,
                    Specialty::Cardiology,
                    ContextStrength::Strong,
                    Category::Name,
                ),
                confidence: 0.6,
                applied_threshold: 0.5,
                outcome: Outcome::FalseNegative,
            });
        }
        let trained = store.modifier_for(
            DocumentType::ProgressNote,
            Specialty::Cardiology,
            ContextStrength::Strong,
            Category::Name,
        );
        let untouched = store.modifier_for(
            DocumentType::ProgressNote,
            Specialty::Oncology,
            ContextStrength::Strong,
            Category::Name,
        );
        assert!(trained < 1.0);
        assert_eq!(untouched, 1.0);
    }

    #[test]
    fn corrupt_file_loads_as_empty_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("feedback.json");
        fs::write(&path, "not valid json{{{").expect("write corrupt file");
        let store = FeedbackStore::load(&path);
        assert_eq!(modifier(&store, DocumentType::Unknown, Category::Name), 1.0);
    }
}
