//! Adaptive Threshold Service (spec.md §4.E): computes the minimum
//! confidence a scored span must clear to survive into the redaction
//! set. The threshold is a composite of multiplicative modifiers drawn
//! from document classification, category sensitivity, and accumulated
//! feedback — conceptually the counterpart of the teacher's
//! `chaos.rs` sigmoid threshold mapping, generalized from an
//! OCR-only axis to the full set of context dimensions spec.md §4.E
//! names.

use crate::document::{Classification, ContextStrength, DocumentType, PurposeOfUse, Specialty};
use crate::feedback::FeedbackStore;
use crate::span::Category;

/// Floor below which no threshold may fall, and ceiling above which
/// none may rise (spec.md §4.E).
const MIN_THRESHOLD: f64 = 0.3;
const MAX_THRESHOLD: f64 = 0.99;

/// The threshold used before any modifier is applied.
const BASE_THRESHOLD: f64 = 0.5;

pub struct AdaptiveThresholdService<'a> {
    feedback: Option<&'a FeedbackStore>,
}

impl<'a> AdaptiveThresholdService<'a> {
    pub fn new(feedback: Option<&'a FeedbackStore>) -> Self {
        AdaptiveThresholdService { feedback }
    }

    /// `τ = clamp(BASE · m_dt · m_cs · m_sp · m_po · m_cat · m_ocr · m_fb,
    /// MIN, MAX)` (spec.md §4.E).
    pub fn threshold_for(&self, classification: &Classification, category: Category) -> f64 {
        let m_dt = document_type_modifier(classification.document_type);
        let m_cs = context_strength_modifier(classification.context_strength);
        let m_sp = specialty_modifier(classification.specialty, category);
        let m_po = purpose_of_use_modifier(classification.purpose_of_use);
        let m_cat = category_modifier(category);
        let m_ocr = ocr_modifier(classification.ocr_severity);
        let m_fb = self
            .feedback
            .map(|store| {
                store.modifier_for(
                    classification.document_type,
                    classification.specialty,
                    classification.context_strength,
                    category,
                )
            })
            .unwrap_or(1.0);

        (BASE_THRESHOLD * m_dt * m_cs * m_sp * m_po * m_cat * m_ocr * m_fb)
            .clamp(MIN_THRESHOLD, MAX_THRESHOLD)
    }
}

/// Clinical note types with dense free text (progress notes, ED notes)
/// tolerate a slightly higher bar than structured reports, where a
/// match is rarely incidental.
fn document_type_modifier(document_type: DocumentType) -> f64 {
    match document_type {
        DocumentType::LaboratoryReport | DocumentType::RadiologyReport | DocumentType::Prescription => 0.95,
        DocumentType::DischargeSummary | DocumentType::OperativeReport | DocumentType::ConsultationNote => 1.0,
        DocumentType::ProgressNote | DocumentType::NursingAdmissionAssessment | DocumentType::EmergencyDepartmentNote => 1.05,
        DocumentType::Unknown => 1.1,
    }
}

/// Strong explicit field labels (`Patient:`, `MRN:`) lower the bar
/// since the match is already corroborated structurally.
fn context_strength_modifier(strength: ContextStrength) -> f64 {
    match strength {
        ContextStrength::Strong => 0.85,
        ContextStrength::Moderate => 0.95,
        ContextStrength::Weak => 1.05,
        ContextStrength::None => 1.15,
    }
}

fn specialty_modifier(specialty: Specialty, category: Category) -> f64 {
    match (specialty, category) {
        (Specialty::Cardiology, Category::DeviceId) => 0.9,
        (Specialty::Oncology, Category::Date) => 0.95,
        (Specialty::Radiology, Category::DeviceId) => 0.9,
        _ => 1.0,
    }
}

/// Research/marketing purposes of use demand stricter redaction than
/// routine treatment (spec.md §6 PurposeOfUse).
fn purpose_of_use_modifier(purpose: PurposeOfUse) -> f64 {
    match purpose {
        PurposeOfUse::Treatment => 1.0,
        PurposeOfUse::Payment | PurposeOfUse::Operations => 0.97,
        PurposeOfUse::PublicHealth => 0.95,
        PurposeOfUse::Research | PurposeOfUse::Marketing => 0.85,
    }
}

/// Structured identifiers need less corroboration than free-text NAME
/// matches, which are the most false-positive prone (spec.md §4.D/§4.E).
fn category_modifier(category: Category) -> f64 {
    if category.specificity() >= 75 {
        0.9
    } else if category == Category::Name {
        1.1
    } else {
        1.0
    }
}

/// Documents flagged as OCR-corrupted (spec.md supplement,
/// `document::detect_ocr`) relax the threshold proportionally to the
/// severity score, mirroring the teacher's chaos-score-driven sigmoid
/// in `chaos.rs`.
fn ocr_modifier(ocr_severity: f64) -> f64 {
    1.0 - (ocr_severity.clamp(0.0, 1.0) * 0.25)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{classify, PurposeOfUse};

    #[test]
    fn clean_structured_report_has_moderate_threshold() {
        let classification = classify("Laboratory Report\nPatient: Jane Doe", PurposeOfUse::Treatment);
        let service = AdaptiveThresholdService::new(None);
        let threshold = service.threshold_for(&classification, Category::Ssn);
        assert!(threshold >= MIN_THRESHOLD && threshold <= MAX_THRESHOLD);
    }

    #[test]
    fn research_purpose_lowers_threshold_relative_to_treatment() {
        let classification_research = classify("Note text", PurposeOfUse::Research);
        let classification_treatment = classify("Note text", PurposeOfUse::Treatment);
        let service = AdaptiveThresholdService::new(None);
        let t_research = service.threshold_for(&classification_research, Category::Name);
        let t_treatment = service.threshold_for(&classification_treatment, Category::Name);
        assert!(t_research < t_treatment);
    }

    #[test]
    fn ocr_corrupted_document_relaxes_threshold() {
        let mut clean = classify("Clean plain text with no issues at all.", PurposeOfUse::Treatment);
        let mut corrupted = classify("PATIENT   NAME: José   L0UISE", PurposeOfUse::Treatment);
        clean.ocr_severity = 0.0;
        corrupted.ocr_severity = 1.0;
        let service = AdaptiveThresholdService::new(None);
        let t_clean = service.threshold_for(&clean, Category::Name);
        let t_corrupted = service.threshold_for(&corrupted, Category::Name);
        assert!(t_corrupted < t_clean);
    }

    #[test]
    fn threshold_never_exceeds_bounds() {
        let classification = classify("", PurposeOfUse::Marketing);
        let service = AdaptiveThresholdService::new(None);
        for category in [Category::Ssn, Category::Name, Category::Other] {
            let t = service.threshold_for(&classification, category);
            assert!(t >= MIN_THRESHOLD - 1e-9 && t <= MAX_THRESHOLD + 1e-9);
        }
    }
}
