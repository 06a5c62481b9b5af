//! Conflict Resolver (spec.md §4.F): reduces the scored-and-surviving
//! span set to a non-overlapping set of redactions. Ported from the
//! teacher's `drop_overlapping_spans` (`span.rs`) sweep structure, with
//! the teacher's composite length/confidence/type score replaced by
//! the spec's strict lexicographic priority: confidence decides unless
//! two spans are within a narrow band, in which case specificity, then
//! length, then position, then filter id break the tie.

use crate::span::{Category, Redaction, ScoredSpan};
use std::collections::HashMap;

/// Field-label words that, when present inside a NAME span's surface
/// text, indicate the span over-extended into an adjacent structured
/// field (spec.md §4.F rule 5). Ported from the teacher's
/// `NAME_STRUCTURE_WORDS`.
const NAME_STRUCTURE_WORDS: &[&str] = &[
    "DATE", "BIRTH", "RECORD", "NUMBER", "PHONE", "ADDRESS", "EMAIL", "MEMBER", "ACCOUNT",
    "STATUS", "DOB", "MRN", "SSN", "ID",
];

fn contains_structure_word(text: &str) -> bool {
    let upper = text.to_uppercase();
    upper
        .split_whitespace()
        .any(|w| NAME_STRUCTURE_WORDS.contains(&w.trim_matches(|c: char| !c.is_alphanumeric())))
}

struct Candidate {
    index: usize,
    start: usize,
    end: usize,
    length: usize,
    confidence: f64,
    category: Category,
    filter_id: String,
    name_overextended: bool,
}

/// Confidence band (spec.md §4.F rule 2) within which ties fall through
/// to category specificity rather than raw confidence order.
const CONFIDENCE_TIE_BAND: f64 = 0.05;

/// True when `a` outranks `b` under spec.md §4.F's strict lexicographic
/// priority order: confidence (outside the tie band), then category
/// specificity, then span length, then earlier start, then `filterId`.
/// A NAME span that over-extended into an adjacent structured field
/// (spec.md §4.F rule 5 via the teacher's `NAME_STRUCTURE_WORDS`) is
/// treated as zero-length for the length comparison only.
fn a_outranks_b(a: &Candidate, b: &Candidate) -> bool {
    if (a.confidence - b.confidence).abs() > CONFIDENCE_TIE_BAND {
        return a.confidence > b.confidence;
    }
    if a.category.specificity() != b.category.specificity() {
        return a.category.specificity() > b.category.specificity();
    }
    let a_len = if a.name_overextended { 0 } else { a.length };
    let b_len = if b.name_overextended { 0 } else { b.length };
    if a_len != b_len {
        return a_len > b_len;
    }
    if a.start != b.start {
        return a.start < b.start;
    }
    a.filter_id < b.filter_id
}

fn overlaps(a_start: usize, a_end: usize, b_start: usize, b_end: usize) -> bool {
    a_start < b_end && b_start < a_end
}

/// Resolves overlapping scored spans into the final, non-overlapping
/// redaction set (spec.md §4.F). Spans that failed their adaptive
/// threshold must already be filtered out by the caller — this
/// function assumes every input span is a surviving candidate.
pub fn resolve(spans: Vec<ScoredSpan>) -> Vec<Redaction> {
    if spans.is_empty() {
        return Vec::new();
    }
    if spans.len() == 1 {
        let s = &spans[0];
        return vec![Redaction {
            start: s.span.start,
            end: s.span.end,
            category: s.span.category,
            replacement: String::new(),
            original_length: s.span.len(),
            confidence: s.confidence,
        }];
    }

    // STEP 1: collapse exact (start, end, category) duplicates, keeping
    // the highest-confidence one.
    let mut unique: HashMap<(usize, usize, Category), usize> = HashMap::new();
    for (i, s) in spans.iter().enumerate() {
        let key = (s.span.start, s.span.end, s.span.category);
        match unique.get(&key) {
            None => {
                unique.insert(key, i);
            }
            Some(&existing) => {
                if spans[existing].confidence < s.confidence {
                    unique.insert(key, i);
                }
            }
        }
    }

    let mut scored: Vec<Candidate> = unique
        .values()
        .copied()
        .map(|i| {
            let s = &spans[i];
            Candidate {
                index: i,
                start: s.span.start,
                end: s.span.end,
                length: s.span.len(),
                confidence: s.confidence,
                category: s.span.category,
                filter_id: s.span.filter_id.clone(),
                name_overextended: s.span.category == Category::Name
                    && contains_structure_word(&s.span.surface_text),
            }
        })
        .collect();

    if scored.len() == 1 {
        let c = &scored[0];
        let s = &spans[c.index];
        return vec![Redaction {
            start: s.span.start,
            end: s.span.end,
            category: s.span.category,
            replacement: String::new(),
            original_length: s.span.len(),
            confidence: s.confidence,
        }];
    }

    // STEP 2: sort by the spec.md §4.F priority order, highest priority
    // first, so the greedy sweep below always considers the strongest
    // remaining candidate next.
    scored.sort_by(|a, b| {
        if a_outranks_b(a, b) {
            std::cmp::Ordering::Less
        } else if a_outranks_b(b, a) {
            std::cmp::Ordering::Greater
        } else {
            std::cmp::Ordering::Equal
        }
    });

    // STEP 3: greedy sweep. Every overlap, including full containment, is
    // resolved by the same priority order: within the confidence tie
    // band, rule 2 (specificity) can let a narrower, more specific span
    // beat a broader one; outside the band, rule 3 (length) naturally
    // favors the broader span unless confidence alone already decided it
    // (spec.md §4.F's containment rule is this order applied, not a
    // separate exception to it).
    let mut kept: Vec<Candidate> = Vec::new();
    'outer: for cand in scored {
        let mut replace_idx = None;
        for (i, existing) in kept.iter().enumerate() {
            if !overlaps(cand.start, cand.end, existing.start, existing.end) {
                continue;
            }
            if a_outranks_b(&cand, existing) {
                replace_idx = Some(i);
                break;
            }
            continue 'outer;
        }
        if let Some(i) = replace_idx {
            kept[i] = cand;
        } else {
            kept.push(cand);
        }
    }

    kept.sort_by(|a, b| a.start.cmp(&b.start));
    kept.into_iter()
        .map(|c| {
            let s = &spans[c.index];
            Redaction {
                start: s.span.start,
                end: s.span.end,
                category: s.span.category,
                replacement: String::new(),
                original_length: s.span.len(),
                confidence: s.confidence,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::CandidateSpan;

    fn scored(start: usize, end: usize, category: Category, confidence: f64) -> ScoredSpan {
        ScoredSpan {
            span: CandidateSpan::new(start, end, category, "x", "f", confidence),
            confidence,
            threshold: 0.5,
            context_signals: Vec::new(),
        }
    }

    #[test]
    fn empty_input_yields_no_redactions() {
        assert!(resolve(Vec::new()).is_empty());
    }

    #[test]
    fn non_overlapping_spans_all_survive() {
        let spans = vec![
            scored(0, 4, Category::Name, 0.9),
            scored(10, 21, Category::Ssn, 0.95),
        ];
        let out = resolve(spans);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn more_specific_type_wins_on_overlap() {
        let spans = vec![
            scored(0, 20, Category::Name, 0.6),
            scored(5, 16, Category::Ssn, 0.95),
        ];
        let out = resolve(spans);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].category, Category::Ssn);
    }

    #[test]
    fn output_is_sorted_by_start_offset() {
        let spans = vec![
            scored(10, 21, Category::Ssn, 0.95),
            scored(0, 4, Category::Name, 0.9),
        ];
        let out = resolve(spans);
        assert!(out[0].start < out[1].start);
    }

    #[test]
    fn duplicate_exact_span_collapses_to_one() {
        let spans = vec![
            scored(0, 4, Category::Name, 0.6),
            scored(0, 4, Category::Name, 0.9),
        ];
        let out = resolve(spans);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].confidence, 0.9);
    }

    #[test]
    fn filter_id_breaks_a_tie_when_nothing_else_distinguishes_two_spans() {
        // Same start/end/category/confidence/specificity/length: the
        // only remaining differentiator is filterId, lexicographically.
        let a = Candidate {
            index: 0,
            start: 0,
            end: 4,
            length: 4,
            confidence: 0.8,
            category: Category::Name,
            filter_id: "name-zz".to_string(),
            name_overextended: false,
        };
        let b = Candidate {
            index: 1,
            start: 0,
            end: 4,
            length: 4,
            confidence: 0.8,
            category: Category::Name,
            filter_id: "name-aa".to_string(),
            name_overextended: false,
        };
        assert!(a_outranks_b(&b, &a));
        assert!(!a_outranks_b(&a, &b));
    }

    #[test]
    fn confidence_outside_the_tie_band_beats_a_longer_less_confident_span() {
        let spans = vec![
            scored(0, 50, Category::Address, 0.60),
            scored(5, 9, Category::Name, 0.95),
        ];
        let out = resolve(spans);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].category, Category::Name);
    }
}
