//! Document data model and classification types (spec.md §3, §4.A).

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Document-type signatures, first-match-wins by byte offset, ported from
/// the heading vocabulary in `postfilter.rs`'s `SECTION_HEADINGS`.
static DOCUMENT_TYPE_SIGNATURES: Lazy<Vec<(&'static str, DocumentType)>> = Lazy::new(|| {
    vec![
        ("DISCHARGE SUMMARY", DocumentType::DischargeSummary),
        ("OPERATIVE REPORT", DocumentType::OperativeReport),
        ("PROGRESS NOTE", DocumentType::ProgressNote),
        ("LABORATORY REPORT", DocumentType::LaboratoryReport),
        ("RADIOLOGY REPORT", DocumentType::RadiologyReport),
        ("PRESCRIPTION", DocumentType::Prescription),
        (
            "EMERGENCY DEPARTMENT NOTE",
            DocumentType::EmergencyDepartmentNote,
        ),
        (
            "NURSING ADMISSION ASSESSMENT",
            DocumentType::NursingAdmissionAssessment,
        ),
        ("CONSULTATION NOTE", DocumentType::ConsultationNote),
    ]
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    DischargeSummary,
    OperativeReport,
    ProgressNote,
    LaboratoryReport,
    RadiologyReport,
    Prescription,
    EmergencyDepartmentNote,
    NursingAdmissionAssessment,
    ConsultationNote,
    Unknown,
}

impl Default for DocumentType {
    fn default() -> Self {
        DocumentType::Unknown
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Specialty {
    Cardiology,
    Oncology,
    Radiology,
    Pediatrics,
    Emergency,
    Psychiatry,
    Unknown,
}

impl Default for Specialty {
    fn default() -> Self {
        Specialty::Unknown
    }
}

/// Strength of clinical context surrounding a candidate, used by the
/// adaptive threshold service (spec.md §4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextStrength {
    Strong,
    Moderate,
    Weak,
    None,
}

impl Default for ContextStrength {
    fn default() -> Self {
        ContextStrength::Weak
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PurposeOfUse {
    Treatment,
    Payment,
    Operations,
    Research,
    PublicHealth,
    Marketing,
}

impl Default for PurposeOfUse {
    fn default() -> Self {
        PurposeOfUse::Treatment
    }
}

/// Weighted keyword table for specialty detection (spec.md §4.A.2).
/// Weights and keyword lists are illustrative per spec.md's Open
/// Questions; externalized here as a data table rather than hardcoded
/// branching, so a deployment can swap it without touching the scanner.
static SPECIALTY_KEYWORDS: Lazy<Vec<(Specialty, Vec<(&'static str, u32)>)>> = Lazy::new(|| {
    vec![
        (
            Specialty::Cardiology,
            vec![
                ("cardio", 2),
                ("ekg", 2),
                ("ecg", 2),
                ("stemi", 3),
                ("nstemi", 3),
                ("chf", 2),
                ("afib", 2),
                (" mi ", 1),
                ("echocardiogram", 2),
                ("cardiologist", 2),
            ],
        ),
        (
            Specialty::Oncology,
            vec![
                ("oncolog", 3),
                ("chemotherapy", 2),
                ("carcinoma", 2),
                ("tumor", 1),
                ("metasta", 2),
                ("lymphoma", 2),
                ("biopsy", 1),
                ("radiation oncology", 3),
            ],
        ),
        (
            Specialty::Radiology,
            vec![
                ("radiolog", 3),
                ("ct scan", 2),
                ("mri", 2),
                ("x-ray", 1),
                ("contrast", 1),
                ("impression:", 2),
                ("findings:", 2),
            ],
        ),
        (
            Specialty::Pediatrics,
            vec![
                ("pediatric", 3),
                ("newborn", 2),
                ("infant", 2),
                ("well-child", 2),
                ("immunization", 1),
                ("growth chart", 2),
            ],
        ),
        (
            Specialty::Emergency,
            vec![
                ("emergency department", 3),
                ("triage", 2),
                ("chief complaint", 1),
                ("trauma", 2),
                ("ed course", 2),
            ],
        ),
        (
            Specialty::Psychiatry,
            vec![
                ("psychiatr", 3),
                ("depression", 1),
                ("anxiety disorder", 2),
                ("mental status exam", 2),
                ("suicidal ideation", 2),
            ],
        ),
    ]
});

/// Classification record attached to a Document once classification
/// begins (spec.md §3: "Documents are immutable once classification
/// begins").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub document_type: DocumentType,
    pub specialty: Specialty,
    pub specialty_confidence: f64,
    pub context_strength: ContextStrength,
    pub purpose_of_use: PurposeOfUse,
    pub is_ocr: bool,
    /// Continuous OCR/chaos severity in [0,1]; supplements the boolean
    /// `is_ocr` flag (see SPEC_FULL.md §A).
    pub ocr_severity: f64,
    pub length: usize,
}

impl Default for Classification {
    fn default() -> Self {
        Classification {
            document_type: DocumentType::Unknown,
            specialty: Specialty::Unknown,
            specialty_confidence: 0.0,
            context_strength: ContextStrength::Weak,
            purpose_of_use: PurposeOfUse::Treatment,
            is_ocr: false,
            ocr_severity: 0.0,
            length: 0,
        }
    }
}

/// An immutable document: its text plus its classification, once
/// computed. Spans over `text` are expressed as half-open
/// `[start, end)` Unicode scalar-value (char) offsets, per spec.md §3.
pub struct Document {
    text: String,
    chars: Vec<usize>, // byte offset of the start of each char, indexed by char position
    classification: Option<Classification>,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let chars: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        Document {
            text,
            chars,
            classification: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len_chars(&self) -> usize {
        self.chars.len()
    }

    /// Byte offset in `text()` for the given char offset; `char_len()` is
    /// a valid input and returns `text.len()`.
    pub fn byte_offset(&self, char_idx: usize) -> usize {
        if char_idx >= self.chars.len() {
            self.text.len()
        } else {
            self.chars[char_idx]
        }
    }

    /// Slice the document by half-open char offsets.
    pub fn slice(&self, start: usize, end: usize) -> &str {
        let b_start = self.byte_offset(start);
        let b_end = self.byte_offset(end);
        &self.text[b_start..b_end]
    }

    /// A window of `radius` chars on each side of `[start, end)`, clamped
    /// to document bounds. Used by the context scorer's keyword
    /// neighborhood rule (spec.md §4.D rule 3).
    pub fn window(&self, start: usize, end: usize, radius: usize) -> &str {
        let w_start = start.saturating_sub(radius);
        let w_end = (end + radius).min(self.len_chars());
        self.slice(w_start, w_end)
    }

    /// The `radius` chars immediately before `start`, clamped to the
    /// document's beginning. Unlike `window`, this is one-sided: used
    /// by the context scorer's structural boost rule (spec.md §4.D rule
    /// 2), which only ever looks at what immediately precedes a span.
    pub fn preceding(&self, start: usize, radius: usize) -> &str {
        let w_start = start.saturating_sub(radius);
        self.slice(w_start, start)
    }

    pub fn set_classification(&mut self, classification: Classification) {
        self.classification = Some(classification);
    }

    pub fn classification(&self) -> Option<&Classification> {
        self.classification.as_ref()
    }
}

/// Count occurrences of `needle` (case-insensitive) in `haystack`.
fn count_occurrences(haystack_lower: &str, needle: &str) -> u32 {
    if needle.is_empty() {
        return 0;
    }
    haystack_lower.matches(needle).count() as u32
}

/// `classify(text) -> Classification`: deterministic, no side effects
/// (spec.md §4.A).
pub fn classify(text: &str, purpose_of_use: PurposeOfUse) -> Classification {
    let lower = text.to_lowercase();

    let document_type = DOCUMENT_TYPE_SIGNATURES
        .iter()
        .filter_map(|(sig, ty)| text.find(sig).map(|pos| (pos, *ty)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, ty)| ty)
        .unwrap_or(DocumentType::Unknown);

    let mut scores: HashMap<Specialty, u32> = HashMap::new();
    let mut total = 0u32;
    for (specialty, keywords) in SPECIALTY_KEYWORDS.iter() {
        let mut score = 0u32;
        for (kw, weight) in keywords {
            let matches = count_occurrences(&lower, kw);
            score += matches * weight;
        }
        if score > 0 {
            total += score;
            scores.insert(*specialty, score);
        }
    }
    let (specialty, specialty_confidence) = scores
        .iter()
        .max_by_key(|(_, score)| **score)
        .filter(|(_, score)| **score >= 2)
        .map(|(sp, score)| (*sp, *score as f64 / total.max(1) as f64))
        .unwrap_or((Specialty::Unknown, 0.0));

    let (is_ocr, ocr_severity) = detect_ocr(text);

    let context_strength = estimate_context_strength(&lower, document_type);

    Classification {
        document_type,
        specialty,
        specialty_confidence,
        context_strength,
        purpose_of_use,
        is_ocr,
        ocr_severity,
        length: text.chars().count(),
    }
}

static OCR_CONFUSABLE_RE: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"[O0Il1][0-9A-Za-z]*[O0Il1]").unwrap());

static OCR_CAPS_RUN_RE: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"\b([A-Z]{2,}\s+){2,}[A-Z]{2,}\b").unwrap());

/// OCR indicator scan (spec.md §4.A.3): four indicators, flag when >= 2
/// fire. `ocr_severity` is the fraction of indicators that fired,
/// supplementing the boolean per SPEC_FULL.md.
fn detect_ocr(text: &str) -> (bool, f64) {
    let mut indicators = 0u32;

    // 1. Runs of O/0/I/1 confusion inside a token.
    if OCR_CONFUSABLE_RE.find_iter(text).count() >= 3 {
        indicators += 1;
    }

    // 2. Multiple consecutive spaces.
    if text.contains("   ") {
        indicators += 1;
    }

    // 3. Non-ASCII characters present.
    if text.chars().any(|c| !c.is_ascii()) {
        indicators += 1;
    }

    // 4. Runs of >= 3 consecutive all-caps words.
    if OCR_CAPS_RUN_RE.is_match(text) {
        indicators += 1;
    }

    (indicators >= 2, indicators as f64 / 4.0)
}

fn estimate_context_strength(lower: &str, document_type: DocumentType) -> ContextStrength {
    let label_hits = ["patient:", "dob:", "mrn:", "ssn:", "attending:"]
        .iter()
        .filter(|l| lower.contains(*l))
        .count();

    match (document_type, label_hits) {
        (DocumentType::Unknown, 0) => ContextStrength::None,
        (_, 0) => ContextStrength::Weak,
        (_, 1) => ContextStrength::Moderate,
        _ => ContextStrength::Strong,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_document_type() {
        let c = classify(
            "DISCHARGE SUMMARY\nPatient: John Smith",
            PurposeOfUse::Treatment,
        );
        assert_eq!(c.document_type, DocumentType::DischargeSummary);
    }

    #[test]
    fn unknown_document_type_has_no_signature() {
        let c = classify("Hello world", PurposeOfUse::Treatment);
        assert_eq!(c.document_type, DocumentType::Unknown);
    }

    #[test]
    fn detects_cardiology_specialty() {
        let c = classify(
            "Cardiology consult: STEMI, NSTEMI, CHF, AFib noted on EKG.",
            PurposeOfUse::Treatment,
        );
        assert_eq!(c.specialty, Specialty::Cardiology);
    }

    #[test]
    fn flags_ocr_when_two_indicators_fire() {
        // Multiple consecutive spaces + a non-ASCII character: two of the
        // four indicators fire, which is the documented threshold.
        let (is_ocr, severity) = detect_ocr("PATIENT   NAME: José   Smith");
        assert!(is_ocr);
        assert!(severity > 0.0);
    }

    #[test]
    fn clean_text_is_not_flagged_as_ocr() {
        let (is_ocr, _) = detect_ocr("Patient: John Smith, DOB 04/22/1978.");
        assert!(!is_ocr);
    }

    #[test]
    fn document_window_is_clamped_to_bounds() {
        let doc = Document::new("hello");
        assert_eq!(doc.window(0, 5, 40), "hello");
    }

    #[test]
    fn preceding_only_looks_backward() {
        let doc = Document::new("Patient: John Smith is here");
        assert_eq!(doc.preceding(9, 40), "Patient: ");
    }

    #[test]
    fn preceding_is_clamped_at_document_start() {
        let doc = Document::new("abc");
        assert_eq!(doc.preceding(1, 40), "a");
    }
}
