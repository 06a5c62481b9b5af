//! Candidate Pool (spec.md §4.C): append-only accumulator for filter
//! output, frozen after dispatch.

use crate::span::CandidateSpan;
use std::collections::HashSet;

/// Accumulates `CandidateSpan`s from the dispatcher, deduplicating exact
/// `(start, end, category, filter_id)` repeats as the teacher's
/// `drop_overlapping_spans` does in its STEP 1 (`span.rs`/`interval.rs`).
#[derive(Default)]
pub struct CandidatePool {
    spans: Vec<CandidateSpan>,
    seen: HashSet<(usize, usize, crate::span::Category, String)>,
    frozen: bool,
}

impl CandidatePool {
    pub fn new() -> Self {
        CandidatePool::default()
    }

    pub fn push(&mut self, span: CandidateSpan) {
        assert!(!self.frozen, "cannot push into a frozen candidate pool");
        let key = (span.start, span.end, span.category, span.filter_id.clone());
        if self.seen.insert(key) {
            self.spans.push(span);
        }
    }

    pub fn extend(&mut self, spans: impl IntoIterator<Item = CandidateSpan>) {
        for s in spans {
            self.push(s);
        }
    }

    /// Freeze the pool; no further pushes are allowed. Returns the
    /// accumulated spans as an unordered multiset (spec.md §4.B: "Order
    /// of return is irrelevant").
    pub fn freeze(mut self) -> Vec<CandidateSpan> {
        self.frozen = true;
        self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}
