//! Name filter (spec.md §6 NAME), ported from the teacher's `name.rs`
//! pattern library. Patient-name and titled-name patterns carry higher
//! confidence than bare First-Last since the latter is the most
//! false-positive-prone pattern in the registry (any capitalized bigram
//! matches); the context scorer is expected to adjudicate the rest.

use super::{CharMap, Filter};
use crate::policy::Policy;
use crate::span::{CandidateSpan, Category};
use once_cell::sync::Lazy;
use regex::Regex;

static REGEX_LAST_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][A-Za-z'`.-]{1,20})\s*,\s*([A-Z][A-Za-z'`.-]{1,30})(?:\s+[A-Z][A-Za-z'`.-]{1,30})?\b")
        .expect("invalid REGEX_LAST_FIRST")
});

static REGEX_TITLED_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:Dr|Mr|Mrs|Ms|Miss|Prof|Rev|Hon|Capt|Lt|Sgt|Col|Gen)\.?\s+([A-Z][A-Za-z'`.-]{1,30}(?:\s+[A-Z][A-Za-z'`.-]{1,30}){0,2})\b")
        .expect("invalid REGEX_TITLED_NAME")
});

static REGEX_PATIENT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:Patient|Pt|Subject|Individual|Client)\s*[:\t ]+\s*([A-Z][a-z]{2,}(?:[ \t]+[A-Z]\.?)?(?:[ \t]+[A-Z][a-z]{2,}){1,2})\b")
        .expect("invalid REGEX_PATIENT_NAME")
});

static REGEX_PATIENT_ALLCAPS_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:Patient|Pt|Subject|Individual|Client)\s*[:]\s*([A-Z]{2,}(?:\s+[A-Z]{2,}){1,2})\b")
        .expect("invalid REGEX_PATIENT_ALLCAPS_NAME")
});

static REGEX_FAMILY_MEMBER_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:mother|father|mom|dad|sister|brother|spouse|wife|husband|son|daughter)\s*[:\t -]*([A-Z][a-z]{2,}(?:\s+[A-Z][a-z]{2,}){0,2})\b")
        .expect("invalid REGEX_FAMILY_MEMBER_NAME")
});

static REGEX_NAME_WITH_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][A-Za-z'`.-]{1,30}(?:\s+[A-Z][A-Za-z'`.-]{1,30}){1,2})(?:,\s*)?(?:Jr|Sr|II|III|IV)\.?\b")
        .expect("invalid REGEX_NAME_WITH_SUFFIX")
});

static REGEX_AGE_GENDER_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:\d{1,3}\s*(?:yo|y/o|year[- ]old|yr[- ]old)|male|female|man|woman|boy|girl)\s+(?:named\s+)?([A-Z][a-z]{2,}(?:\s+[A-Z]\.?)?(?:\s+[A-Z][a-z]{2,}){1,2})\b")
        .expect("invalid REGEX_AGE_GENDER_NAME")
});

static REGEX_HYPHENATED_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][a-z]{1,}(?:-[A-Z][a-z]{1,})+(?:\s+[A-Z][a-z]{2,})?)\b")
        .expect("invalid REGEX_HYPHENATED_NAME")
});

static REGEX_APOSTROPHE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][A-Za-z]{1,}'[A-Za-z]{1,}(?:\s+[A-Z][A-Za-z'`.-]{1,30})?)\b")
        .expect("invalid REGEX_APOSTROPHE_NAME")
});

static REGEX_FIRST_LAST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][A-Za-z'`.-]{1,30})(?:\s+[A-Z]\.)?\s+([A-Z][A-Za-z'`.-]{1,30})\b")
        .expect("invalid REGEX_FIRST_LAST")
});

fn is_excluded_allcaps_acronym(s: &str) -> bool {
    const EXCLUDED: &[&str] = &["CT", "MRI", "PET", "EKG", "ECG", "CBC", "USA", "FBI", "CIA", "ER", "IV"];
    EXCLUDED.contains(&s)
}

/// `group` selects which capture group is the actual span: labeled
/// patterns (`Patient:`, `Dr.`, family terms) capture the name alone in
/// group 1 so the label is excluded from the redaction; two-name
/// patterns (`Last, First`, bare `First Last`) have no label to strip,
/// so the whole match (group 0) is the span — ported from the
/// teacher's per-pattern `(re, group, confidence)` table in `name.rs`.
struct NamePattern {
    re: &'static Lazy<Regex>,
    group: usize,
    confidence: f64,
}

static PATTERNS: &[NamePattern] = &[
    NamePattern { re: &REGEX_PATIENT_NAME, group: 1, confidence: 0.95 },
    NamePattern { re: &REGEX_TITLED_NAME, group: 1, confidence: 0.9 },
    NamePattern { re: &REGEX_LAST_FIRST, group: 0, confidence: 0.85 },
    NamePattern { re: &REGEX_FAMILY_MEMBER_NAME, group: 1, confidence: 0.8 },
    NamePattern { re: &REGEX_NAME_WITH_SUFFIX, group: 1, confidence: 0.85 },
    NamePattern { re: &REGEX_AGE_GENDER_NAME, group: 1, confidence: 0.8 },
    NamePattern { re: &REGEX_HYPHENATED_NAME, group: 1, confidence: 0.7 },
    NamePattern { re: &REGEX_APOSTROPHE_NAME, group: 1, confidence: 0.65 },
    NamePattern { re: &REGEX_FIRST_LAST, group: 0, confidence: 0.55 },
];

pub struct NameFilter;

impl Filter for NameFilter {
    fn filter_id(&self) -> &'static str {
        "name"
    }
    fn categories(&self) -> &'static [Category] {
        &[Category::Name]
    }
    fn scan(&self, text: &str, _policy: &Policy) -> Vec<CandidateSpan> {
        let map = CharMap::build(text);
        let mut out = Vec::new();
        for pattern in PATTERNS {
            for caps in pattern.re.captures_iter(text) {
                let Some(m) = caps.get(pattern.group) else { continue };
                if is_excluded_allcaps_acronym(m.as_str()) {
                    continue;
                }
                out.push(CandidateSpan::new(
                    map.char_offset(m.start()),
                    map.char_offset(m.end()),
                    Category::Name,
                    m.as_str(),
                    self.filter_id(),
                    pattern.confidence,
                ));
            }
        }
        for caps in REGEX_PATIENT_ALLCAPS_NAME.captures_iter(text) {
            let Some(m) = caps.get(1) else { continue };
            if m.as_str().split_whitespace().any(is_excluded_allcaps_acronym) {
                continue;
            }
            out.push(CandidateSpan::new(
                map.char_offset(m.start()),
                map.char_offset(m.end()),
                Category::Name,
                m.as_str(),
                self.filter_id(),
                0.85,
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Policy;

    #[test]
    fn matches_labeled_patient_name() {
        let spans = NameFilter.scan("Patient: John Smith", &Policy::default());
        assert!(spans.iter().any(|s| s.surface_text == "John Smith"));
    }

    #[test]
    fn matches_titled_name() {
        let spans = NameFilter.scan("Seen by Dr. Alice Nguyen today.", &Policy::default());
        assert!(spans.iter().any(|s| s.surface_text.contains("Alice Nguyen")));
    }

    #[test]
    fn excludes_common_acronyms_from_allcaps_match() {
        let spans = NameFilter.scan("Patient: CT MRI", &Policy::default());
        assert!(spans.is_empty());
    }

    #[test]
    fn matches_last_comma_first() {
        let spans = NameFilter.scan("Attending: Johnson, Mary", &Policy::default());
        assert!(spans.iter().any(|s| s.surface_text == "Johnson, Mary"));
    }

    #[test]
    fn matches_allcaps_patient_label() {
        let spans = NameFilter.scan("PATIENT: JOHNSON, MARY ELIZABETH", &Policy::default());
        assert!(spans.iter().any(|s| s.surface_text.contains("JOHNSON")));
    }
}
