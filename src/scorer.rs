//! Context Scorer (spec.md §4.D): combines each candidate span's raw
//! filter confidence with surrounding-text context signals into a
//! final confidence in `[0, 1]`. Grounded in the teacher's
//! `VulpesPHIScorer` (`scorer.rs`): base score by pattern type, context
//! bonuses (title/family/label/clinical-role proximity), and a
//! vocabulary-whitelist veto for NAME-type spans.

use crate::document::{Document, Specialty};
use crate::span::{CandidateSpan, Category, ContextSignal, ScoredSpan};
use crate::vocabulary::is_vocabulary_member;
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone)]
pub struct ScoringWeights {
    pub high_precision_pattern: f64,
    /// Rule 2 (spec.md §4.D): bonus for an immediately-preceding field
    /// label, capped at 1.0 overall by the final `clamp`.
    pub structural_boost: f64,
    /// Rule 3: per-keyword-match increment in the ±40 char window.
    pub keyword_bonus_step: f64,
    /// Rule 3: ceiling on the total keyword-neighborhood bonus.
    pub keyword_bonus_cap: f64,
    pub specialty_affinity_bonus: f64,
    /// Rule 5: bonus applied to raw scores below 0.7 on OCR documents.
    pub ocr_allowance: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        ScoringWeights {
            high_precision_pattern: 0.95,
            structural_boost: 0.15,
            keyword_bonus_step: 0.05,
            keyword_bonus_cap: 0.20,
            specialty_affinity_bonus: 0.05,
            ocr_allowance: 0.05,
        }
    }
}

/// Field labels recognized as an immediately-preceding structural cue
/// (spec.md §4.D rule 2), anchored to the end of the preceding text so
/// a label appearing elsewhere in a wider window can't satisfy it.
/// Allows up to 3 whitespace characters between the label's colon and
/// the candidate, per spec.
static STRUCTURAL_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(patient|dob|ssn|mrn|phone|email|address|zip|attending|surgeon|prescriber|ordering physician|emergency contact)\s*:\s{0,3}$",
    )
    .expect("invalid STRUCTURAL_LABEL_RE")
});

/// Rule 3 keyword tables, category-specific (spec.md §4.D: "for NAME:
/// titles like Dr., Mr., suffixes like MD, RN; for DATE: DOB,
/// Admission, Discharge").
static NAME_KEYWORDS: &[&str] = &[
    "dr.", "mr.", "mrs.", "ms.", "prof.", "md", "rn", "do", "np", "pa", "husband", "wife",
    "spouse", "son", "daughter", "mother", "father", "parent", "child", "sibling", "brother",
    "sister", "guardian", "performed by", "verified by", "signed by", "reviewed by",
];
static DATE_KEYWORDS: &[&str] = &["dob", "admission", "discharge", "birth", "admitted", "discharged"];

fn keyword_table(category: Category) -> &'static [&'static str] {
    match category {
        Category::Name => NAME_KEYWORDS,
        Category::Date => DATE_KEYWORDS,
        _ => &[],
    }
}

const HIGH_PRECISION: &[Category] = &[
    Category::Ssn,
    Category::Email,
    Category::Phone,
    Category::Fax,
    Category::Mrn,
    Category::Npi,
    Category::CreditCard,
    Category::AccountNumber,
    Category::Ip,
    Category::Url,
];

/// Categories the vocabulary veto (rule 1) applies to: NAME and the
/// catch-all OTHER bucket, since structured identifiers can't collide
/// with medical vocabulary terms.
const VOCABULARY_VETO_CATEGORIES: &[Category] = &[Category::Name, Category::Other];

/// How far (in chars) the keyword-neighborhood rule looks to either
/// side of a span (spec.md §4.D: "default 40 code points on each
/// side").
const CONTEXT_WINDOW_CHARS: usize = 40;

/// How far back the structural-boost rule looks for a preceding label.
/// Generous enough to cover the longest recognized label
/// ("Ordering Physician:") plus the allowed whitespace run.
const STRUCTURAL_LOOKBACK_CHARS: usize = 24;

pub struct ContextScorer {
    weights: ScoringWeights,
}

impl Default for ContextScorer {
    fn default() -> Self {
        ContextScorer { weights: ScoringWeights::default() }
    }
}

impl ContextScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        ContextScorer { weights }
    }

    /// Score a single candidate against its document context (spec.md
    /// §4.D rules 1-5). Returns a `ScoredSpan` with confidence set but
    /// `threshold` left at 0.0 — the threshold service fills it in.
    pub fn score(&self, document: &Document, candidate: CandidateSpan) -> ScoredSpan {
        let mut signals = Vec::new();

        // Rule 1: vocabulary veto is an absolute override, not a term in
        // the additive sum — a recognized medical phrase is never PHI.
        if self.vocabulary_veto(&candidate, &mut signals) {
            return ScoredSpan { span: candidate, confidence: 0.0, threshold: 0.0, context_signals: signals };
        }

        let mut score = self.base_score(&candidate, &mut signals);
        score += self.structural_boost(document, &candidate, &mut signals);
        score += self.keyword_neighborhood(document, &candidate, &mut signals);
        score += self.specialty_affinity(document, &candidate, &mut signals);
        score += self.ocr_allowance(document, &candidate, &mut signals);
        let confidence = score.clamp(0.0, 1.0);
        ScoredSpan { span: candidate, confidence, threshold: 0.0, context_signals: signals }
    }

    fn base_score(&self, candidate: &CandidateSpan, signals: &mut Vec<ContextSignal>) -> f64 {
        if HIGH_PRECISION.contains(&candidate.category) {
            signals.push(ContextSignal {
                source: "pattern",
                delta: self.weights.high_precision_pattern,
                reason: format!("high-precision {} pattern", candidate.category),
            });
            return self.weights.high_precision_pattern;
        }
        candidate.raw_score
    }

    /// Rule 1: if the candidate's surface text is a recognized medical
    /// vocabulary member and its category can plausibly collide with
    /// one (NAME, OTHER), veto it outright.
    fn vocabulary_veto(&self, candidate: &CandidateSpan, signals: &mut Vec<ContextSignal>) -> bool {
        if !VOCABULARY_VETO_CATEGORIES.contains(&candidate.category) {
            return false;
        }
        if is_vocabulary_member(&candidate.surface_text) {
            signals.push(ContextSignal {
                source: "vocabulary",
                delta: -candidate.raw_score,
                reason: format!("recognized medical vocabulary, confidence forced to 0: {}", candidate.surface_text),
            });
            return true;
        }
        false
    }

    /// Rule 2: a recognized field label immediately preceding the
    /// candidate (end-anchored, up to 3 whitespace characters after the
    /// colon) boosts confidence by a fixed amount. Titles (`Dr.`,
    /// `Mr.`) are a rule-3 keyword-neighborhood cue, not a rule-2
    /// structural one, so they're handled there instead.
    fn structural_boost(&self, document: &Document, candidate: &CandidateSpan, signals: &mut Vec<ContextSignal>) -> f64 {
        let preceding = document.preceding(candidate.start, STRUCTURAL_LOOKBACK_CHARS);
        if !STRUCTURAL_LABEL_RE.is_match(preceding) {
            return 0.0;
        }
        signals.push(ContextSignal {
            source: "context",
            delta: self.weights.structural_boost,
            reason: "recognized field label immediately precedes the candidate".to_string(),
        });
        self.weights.structural_boost
    }

    /// Rule 3: count category-specific keyword matches in a symmetric
    /// ±40-char window, each adding a fixed increment up to a cap.
    fn keyword_neighborhood(&self, document: &Document, candidate: &CandidateSpan, signals: &mut Vec<ContextSignal>) -> f64 {
        let table = keyword_table(candidate.category);
        if table.is_empty() {
            return 0.0;
        }
        let window = document.window(candidate.start, candidate.end, CONTEXT_WINDOW_CHARS).to_lowercase();
        let matches: u32 = table.iter().map(|kw| window.matches(kw).count() as u32).sum();
        if matches == 0 {
            return 0.0;
        }
        let bonus = (matches as f64 * self.weights.keyword_bonus_step).min(self.weights.keyword_bonus_cap);
        signals.push(ContextSignal {
            source: "context",
            delta: bonus,
            reason: format!("{matches} keyword neighborhood match(es) in \u{00b1}{CONTEXT_WINDOW_CHARS} char window"),
        });
        bonus
    }

    /// Rule 4: specialty affinity. A small bonus when the candidate's
    /// category commonly co-occurs with the document's classified
    /// specialty (e.g. device identifiers in cardiology notes).
    fn specialty_affinity(&self, document: &Document, candidate: &CandidateSpan, signals: &mut Vec<ContextSignal>) -> f64 {
        let Some(classification) = document.classification() else {
            return 0.0;
        };
        let affinity = matches!(
            (classification.specialty, candidate.category),
            (Specialty::Cardiology, Category::DeviceId)
                | (Specialty::Oncology, Category::Date)
                | (Specialty::Radiology, Category::DeviceId)
        );
        if affinity {
            signals.push(ContextSignal {
                source: "specialty",
                delta: self.weights.specialty_affinity_bonus,
                reason: format!("{:?} specialty affinity for {}", classification.specialty, candidate.category),
            });
            return self.weights.specialty_affinity_bonus;
        }
        0.0
    }

    /// Rule 5: OCR allowance. Borderline raw scores on an OCR-flagged
    /// document get a small nudge, since OCR matches are inherently
    /// fuzzier than clean-text ones.
    fn ocr_allowance(&self, document: &Document, candidate: &CandidateSpan, signals: &mut Vec<ContextSignal>) -> f64 {
        let Some(classification) = document.classification() else {
            return 0.0;
        };
        if classification.is_ocr && candidate.raw_score < 0.7 {
            signals.push(ContextSignal {
                source: "ocr",
                delta: self.weights.ocr_allowance,
                reason: "OCR-flagged document, raw score below 0.7".to_string(),
            });
            return self.weights.ocr_allowance;
        }
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{classify, Document, PurposeOfUse};

    fn doc(text: &str) -> Document {
        let mut d = Document::new(text);
        let c = classify(d.text(), PurposeOfUse::Treatment);
        d.set_classification(c);
        d
    }

    #[test]
    fn high_precision_pattern_scores_near_ceiling() {
        let d = doc("SSN: 456-78-9012");
        let candidate = CandidateSpan::new(5, 16, Category::Ssn, "456-78-9012", "ssn", 0.9);
        let scorer = ContextScorer::default();
        let scored = scorer.score(&d, candidate);
        assert!(scored.confidence >= 0.9);
    }

    #[test]
    fn vocabulary_member_name_is_suppressed_to_exactly_zero() {
        let d = doc("Diagnosis: Invasive Ductal Carcinoma");
        let candidate = CandidateSpan::new(11, 37, Category::Name, "Invasive Ductal Carcinoma", "name", 0.95);
        let scorer = ContextScorer::default();
        let scored = scorer.score(&d, candidate);
        assert_eq!(scored.confidence, 0.0);
    }

    #[test]
    fn vocabulary_veto_overrides_every_context_bonus_stacked() {
        // Raw score 0.95 plus every possible context bonus would clear
        // 1.0 long before the veto if it were additive; it must still
        // land at exactly 0 since the veto is a short-circuit.
        let d = doc("Dr. Performed by: Attending: Diagnosis: Invasive Ductal Carcinoma");
        let candidate = CandidateSpan::new(41, 67, Category::Name, "Invasive Ductal Carcinoma", "name", 0.95);
        let scorer = ContextScorer::default();
        let scored = scorer.score(&d, candidate);
        assert_eq!(scored.confidence, 0.0);
    }

    #[test]
    fn structural_label_immediately_preceding_boosts_name_confidence() {
        let d = doc("Patient: John Smith");
        let candidate = CandidateSpan::new(9, 19, Category::Name, "John Smith", "name", 0.55);
        let scorer = ContextScorer::default();
        let scored = scorer.score(&d, candidate);
        assert!(scored.confidence > 0.55);
        assert!(scored.context_signals.iter().any(|s| s.source == "context"));
    }

    #[test]
    fn label_after_the_candidate_does_not_count_as_structural_boost() {
        // "Patient:" appears in the document but after the candidate,
        // not immediately preceding it; rule 2 must not fire here.
        let d = doc("John Smith is listed as Patient: yes");
        let candidate = CandidateSpan::new(0, 10, Category::Name, "John Smith", "name", 0.55);
        let scorer = ContextScorer::default();
        let scored = scorer.score(&d, candidate);
        assert!(!scored.context_signals.iter().any(|s| s.reason.contains("field label")));
    }

    #[test]
    fn keyword_neighborhood_is_capped() {
        let d = doc("Dr. Mr. MD RN husband wife son daughter John Smith");
        let candidate = CandidateSpan::new(40, 50, Category::Name, "John Smith", "name", 0.5);
        let scorer = ContextScorer::default();
        let scored = scorer.score(&d, candidate);
        let keyword_bonus: f64 = scored
            .context_signals
            .iter()
            .filter(|s| s.reason.contains("keyword neighborhood"))
            .map(|s| s.delta)
            .sum();
        assert!(keyword_bonus <= 0.20 + 1e-9);
    }

    #[test]
    fn ocr_allowance_nudges_a_borderline_raw_score() {
        let mut d = doc("PATIENT   NAME: José   L0UISE");
        let mut classification = d.classification().unwrap().clone();
        classification.is_ocr = true;
        d.set_classification(classification);
        let candidate = CandidateSpan::new(0, 4, Category::Other, "xxxx", "misc", 0.5);
        let scorer = ContextScorer::default();
        let scored = scorer.score(&d, candidate);
        assert!(scored.context_signals.iter().any(|s| s.source == "ocr"));
    }

    #[test]
    fn ocr_allowance_does_not_apply_above_the_threshold() {
        let mut d = doc("clean");
        let mut classification = d.classification().unwrap().clone();
        classification.is_ocr = true;
        d.set_classification(classification);
        let candidate = CandidateSpan::new(0, 4, Category::Other, "xxxx", "misc", 0.8);
        let scorer = ContextScorer::default();
        let scored = scorer.score(&d, candidate);
        assert!(!scored.context_signals.iter().any(|s| s.source == "ocr"));
    }
}
