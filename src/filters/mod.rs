//! Filter Registry & Dispatcher (spec.md §4.B).
//!
//! A filter is a pure, thread-safe function `(text, policy) ->
//! CandidateSpan[]` (spec.md §6). The dispatcher runs the registered
//! filters concurrently on a bounded worker pool (spec.md §5) and
//! aggregates their output into the candidate pool.

mod contact;
mod date;
mod identifiers;
mod misc;
mod name;

use crate::policy::Policy;
use crate::span::{Category, CandidateSpan};
use regex::Regex;
use std::sync::OnceLock;

/// Scheduling hint for the dispatcher; spec.md §9 Design Notes: "a small
/// enum of filter-kind hints (for scheduling), not via inheritance".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    TextSpan,
    StructuredData,
}

/// The filter plug-in contract (spec.md §6).
pub trait Filter: Send + Sync {
    fn filter_id(&self) -> &'static str;
    fn categories(&self) -> &'static [Category];
    fn kind(&self) -> FilterKind {
        FilterKind::TextSpan
    }
    /// Pure, deterministic, thread-safe scan. Must return spans aligned
    /// to Unicode scalar-value boundaries.
    fn scan(&self, text: &str, policy: &Policy) -> Vec<CandidateSpan>;
}

/// Pushes one candidate span per match of `re` against `text`, preferring
/// capture group 1 (the identifier itself) over the whole match when the
/// pattern defines one — mirrors the teacher's `caps.get(1).unwrap_or(whole)`
/// idiom in `scan.rs`, so a labeled match like `DOB: 03/14/1980` redacts
/// only the date, not the label.
pub fn push_captured(
    text: &str,
    map: &CharMap,
    re: &Regex,
    category: Category,
    filter_id: &'static str,
    confidence: f64,
    out: &mut Vec<CandidateSpan>,
) {
    for caps in re.captures_iter(text) {
        let whole = caps.get(0).expect("group 0 always present");
        let m = caps.get(1).unwrap_or(whole);
        out.push(CandidateSpan::new(
            map.char_offset(m.start()),
            map.char_offset(m.end()),
            category,
            m.as_str(),
            filter_id,
            confidence,
        ));
    }
}

/// Like `push_captured` but takes an explicit capture group index,
/// for patterns with multiple internal groups (e.g. separate
/// month/day/year groups) where group 1 is not the label-exclusion
/// group and the whole match (group 0) is the correct span.
pub fn push_captured_group(
    text: &str,
    map: &CharMap,
    re: &Regex,
    group: usize,
    category: Category,
    filter_id: &'static str,
    confidence: f64,
    out: &mut Vec<CandidateSpan>,
) {
    push_captured_group_sourced(text, text, map, re, group, category, filter_id, confidence, out)
}

/// Like `push_captured_group`, but matches against `search_text` (e.g.
/// an OCR-normalized rewrite) while sourcing `surface_text` from
/// `source_text` at the same byte range. `surface_text` must always be
/// the document's own text (spec.md §3: `surfaceText == document[start:end]`),
/// never a normalized stand-in, even when normalization is what let the
/// pattern match in the first place. Requires `search_text` and
/// `source_text` to share byte length and char boundaries, which holds
/// for `ocr_normalize`'s one-char-for-one-char substitutions.
pub fn push_captured_group_sourced(
    search_text: &str,
    source_text: &str,
    map: &CharMap,
    re: &Regex,
    group: usize,
    category: Category,
    filter_id: &'static str,
    confidence: f64,
    out: &mut Vec<CandidateSpan>,
) {
    for caps in re.captures_iter(search_text) {
        let Some(m) = caps.get(group) else { continue };
        out.push(CandidateSpan::new(
            map.char_offset(m.start()),
            map.char_offset(m.end()),
            category,
            &source_text[m.start()..m.end()],
            filter_id,
            confidence,
        ));
    }
}

/// Maps each OCR-confusable character to its likely intended digit
/// (teacher's `normalize_ocr_map`/`normalize_ocr_text`, `scan.rs`). Every
/// substitution is one ASCII byte for one ASCII byte, so the result has
/// the same length and char boundaries as `text` — a `CharMap` built
/// from `text` stays valid for offsets found in the normalized string.
pub fn ocr_normalize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'O' | 'o' => '0',
            'l' | 'I' | '|' => '1',
            'B' => '8',
            'b' => '6',
            'S' | 's' => '5',
            'Z' | 'z' => '2',
            'G' => '6',
            'g' | 'q' => '9',
            other => other,
        })
        .collect()
}

/// Maps a byte offset (as produced by the `regex` crate, always on a
/// char boundary) to a Unicode scalar-value (char) offset, so filters
/// can report spans the way spec.md §3 requires. Built once per filter
/// invocation and reused across every match produced by that filter.
pub struct CharMap {
    byte_offsets: Vec<usize>,
}

impl CharMap {
    pub fn build(text: &str) -> Self {
        CharMap {
            byte_offsets: text.char_indices().map(|(b, _)| b).collect(),
        }
    }

    /// Convert a byte offset into a char offset. `byte_offsets.len()`
    /// (i.e. the text's byte length position) maps to `char_count`.
    pub fn char_offset(&self, byte_pos: usize) -> usize {
        match self.byte_offsets.binary_search(&byte_pos) {
            Ok(idx) => idx,
            Err(idx) => idx,
        }
    }
}

fn registry() -> &'static Vec<Box<dyn Filter>> {
    static REGISTRY: OnceLock<Vec<Box<dyn Filter>>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let filters: Vec<Box<dyn Filter>> = vec![
            Box::new(name::NameFilter),
            Box::new(date::DateFilter),
            Box::new(identifiers::SsnFilter),
            Box::new(identifiers::MrnFilter),
            Box::new(identifiers::NpiFilter),
            Box::new(identifiers::DeaFilter),
            Box::new(identifiers::CreditCardFilter),
            Box::new(identifiers::AccountNumberFilter),
            Box::new(identifiers::HealthPlanIdFilter),
            Box::new(contact::EmailFilter),
            Box::new(contact::PhoneFilter),
            Box::new(contact::FaxFilter),
            Box::new(contact::AddressFilter),
            Box::new(contact::ZipcodeFilter),
            Box::new(contact::IpFilter),
            Box::new(contact::UrlFilter),
            Box::new(misc::VinFilter),
            Box::new(misc::LicensePlateFilter),
            Box::new(misc::Age90PlusFilter),
            Box::new(misc::BiometricFilter),
            Box::new(misc::DeviceIdFilter),
        ];
        filters
    })
}

/// Result of running one filter: either its spans, or the recovered
/// error if it failed (spec.md §7: FilterError is local and recovered).
pub struct FilterRunOutcome {
    pub filter_id: &'static str,
    pub spans: Vec<CandidateSpan>,
    pub failed: bool,
}

/// `runFilters(text, policy) -> CandidateSpan[]` (spec.md §4.B), run
/// concurrently on a worker pool bounded to `max_parallelism` (spec.md
/// §5, default 8). Filters are expected not to panic; if one does, the
/// panic is caught and surfaced as a degraded-coverage outcome rather
/// than aborting the whole dispatch.
pub fn run_filters(text: &str, policy: &Policy, pool: &rayon::ThreadPool) -> Vec<FilterRunOutcome> {
    use rayon::prelude::*;

    let enabled: Vec<&Box<dyn Filter>> = registry()
        .iter()
        .filter(|f| f.categories().iter().any(|c| policy.is_enabled(*c)))
        .collect();

    pool.install(|| {
        enabled
            .par_iter()
            .map(|f| {
                let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    f.scan(text, policy)
                }));
                match result {
                    Ok(spans) => FilterRunOutcome {
                        filter_id: f.filter_id(),
                        spans,
                        failed: false,
                    },
                    Err(_) => FilterRunOutcome {
                        filter_id: f.filter_id(),
                        spans: Vec::new(),
                        failed: true,
                    },
                }
            })
            .collect()
    })
}
