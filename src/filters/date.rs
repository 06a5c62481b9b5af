//! Date filter (spec.md §6 DATE), ported from the teacher's `scan.rs`
//! `DATE_PATTERNS` table.

use super::{ocr_normalize, push_captured_group, push_captured_group_sourced, CharMap, Filter};
use crate::policy::Policy;
use crate::span::{CandidateSpan, Category};
use once_cell::sync::Lazy;
use regex::Regex;

/// `group` is 1 for labeled patterns whose single outer group wraps the
/// date value alone (excluding the `DOB:`/`born`/etc. label text); it is
/// 0 (whole match) for unlabeled patterns whose internal groups only
/// split the date into month/day/year components, with nothing to
/// exclude.
struct DatePattern {
    re: Regex,
    group: usize,
    confidence: f64,
}

static DATE_PATTERNS: Lazy<Vec<DatePattern>> = Lazy::new(|| {
    vec![
        DatePattern {
            re: Regex::new(r"(?i)\b(?:dob|d\.o\.b\.|date\s+of\s+birth)[:\s#-]*((?:0?[1-9]|1[0-2])[\s./-](?:0?[1-9]|[12]\d|3[01])[\s./-](?:\d{2}|(?:19|20)\d{2}))\b")
                .expect("invalid DATE dob"),
            group: 1,
            confidence: 0.97,
        },
        DatePattern {
            re: Regex::new(r"\b(0?[1-9]|1[0-2])[-/](0?[1-9]|[12]\d|3[01])[-/](19|20)\d{2}\b")
                .expect("invalid DATE us long"),
            group: 0,
            confidence: 0.95,
        },
        DatePattern {
            re: Regex::new(r"\b(0?[1-9]|1[0-2])[-/](0?[1-9]|[12]\d|3[01])[-/]\d{2}\b")
                .expect("invalid DATE us short"),
            group: 0,
            confidence: 0.9,
        },
        DatePattern {
            re: Regex::new(r"\b(19|20)\d{2}[-/](0?[1-9]|1[0-2])[-/](0?[1-9]|[12]\d|3[01])\b")
                .expect("invalid DATE iso"),
            group: 0,
            confidence: 0.95,
        },
        DatePattern {
            re: Regex::new(r"(?i)\b(Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|Jun(?:e)?|Jul(?:y)?|Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+(19|20)\d{2}\b")
                .expect("invalid DATE monthname mdy"),
            group: 0,
            confidence: 0.95,
        },
        DatePattern {
            re: Regex::new(r"(?i)\b\d{1,2}(?:st|nd|rd|th)?\s+(?:of\s+)?(Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|Jun(?:e)?|Jul(?:y)?|Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)\.?\s+(19|20)\d{2}\b")
                .expect("invalid DATE monthname dmy"),
            group: 0,
            confidence: 0.95,
        },
        DatePattern {
            re: Regex::new(r"(?i)\b(?:born|admitted|discharged|diagnosed|since)\s+((?:19|20)\d{2})\b")
                .expect("invalid DATE contextual year"),
            group: 1,
            confidence: 0.85,
        },
        DatePattern {
            re: Regex::new(r"\b\d{1,4}[-/]\d{1,4}[-/]\d{1,4}\b").expect("invalid DATE generic"),
            group: 0,
            confidence: 0.8,
        },
    ]
});

pub struct DateFilter;

impl Filter for DateFilter {
    fn filter_id(&self) -> &'static str {
        "date"
    }
    fn categories(&self) -> &'static [Category] {
        &[Category::Date]
    }
    fn scan(&self, text: &str, _policy: &Policy) -> Vec<CandidateSpan> {
        let map = CharMap::build(text);
        let mut out = Vec::new();
        for pattern in DATE_PATTERNS.iter() {
            push_captured_group(
                text,
                &map,
                &pattern.re,
                pattern.group,
                Category::Date,
                self.filter_id(),
                pattern.confidence,
                &mut out,
            );
        }

        // Second pass over OCR-normalized text (teacher's scan.rs: "raw +
        // OCR-normalized" two-pass date matching). The normalization is
        // length- and boundary-preserving, so `map` (built from `text`)
        // stays valid for offsets found in `normalized`; the surface
        // text reported for each match is still sliced from the
        // original `text`, never from `normalized`.
        let normalized = ocr_normalize(text);
        if normalized != text {
            for pattern in DATE_PATTERNS.iter() {
                push_captured_group_sourced(
                    &normalized,
                    text,
                    &map,
                    &pattern.re,
                    pattern.group,
                    Category::Date,
                    self.filter_id(),
                    pattern.confidence * 0.95,
                    &mut out,
                );
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Policy;

    #[test]
    fn matches_dob_label() {
        let spans = DateFilter.scan("DOB: 03/14/1980", &Policy::default());
        assert!(spans.iter().any(|s| s.raw_score >= 0.95));
    }

    #[test]
    fn matches_ocr_corrupted_date() {
        let spans = DateFilter.scan("DOB: O4/22/l978", &Policy::default());
        let hit = spans.iter().find(|s| s.raw_score > 0.0).expect("expected a DATE match");
        assert_eq!(hit.category, Category::Date);
    }

    #[test]
    fn ocr_pass_adds_no_spurious_span_for_a_clean_date() {
        // "DOB:" normalizes to "D08:", but the digits of "03/14/1980"
        // are untouched, so the OCR-normalized pass lands on exactly
        // the same span as the raw pass instead of a different one.
        let spans = DateFilter.scan("DOB: 03/14/1980", &Policy::default());
        assert!(spans.iter().all(|s| s.start == 5 && s.end == 15));
    }

    #[test]
    fn ocr_pass_surface_text_is_sourced_from_the_original_document() {
        // The OCR-normalized pass matches against a corrected rewrite,
        // but surface_text must always be the actual document slice,
        // confusable characters and all.
        let spans = DateFilter.scan("DOB: O4/22/l978", &Policy::default());
        let hit = spans.iter().find(|s| s.raw_score > 0.0).expect("expected a DATE match");
        assert_eq!(hit.surface_text, "O4/22/l978");
    }

    #[test]
    fn matches_month_name_date() {
        let spans = DateFilter.scan("Admitted March 14, 1980 for evaluation.", &Policy::default());
        assert!(!spans.is_empty());
    }
}
