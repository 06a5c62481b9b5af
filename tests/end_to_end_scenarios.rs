//! End-to-end scenarios 4-6 (spec.md §8). Scenarios 1-3 are covered as
//! unit tests in `src/engine.rs`.

use vulpes_phi_core::{Category, Engine, EngineConfig, Policy};

fn redacted_categories(text: &str) -> Vec<Category> {
    let engine = Engine::new(EngineConfig::default());
    let policy = Policy::default();
    let out = engine.process(text, &policy).expect("process should succeed");
    out.redactions.iter().map(|r| r.category).collect()
}

#[test]
fn scenario_four_prescriber_dea_and_npi() {
    let text = "Rx: Lisinopril 10mg. Prescriber: Dr. Robert Williams DEA: AB1234567 NPI: 1234567890";
    let engine = Engine::new(EngineConfig::default());
    let policy = Policy::default();
    let out = engine.process(text, &policy).expect("process should succeed");

    let categories: Vec<_> = out.redactions.iter().map(|r| r.category).collect();
    assert!(categories.contains(&Category::Name), "{categories:?}");
    assert!(categories.contains(&Category::Dea), "{categories:?}");
    assert!(categories.contains(&Category::Npi), "{categories:?}");
    assert!(out.text.contains("Lisinopril"), "drug name must survive: {}", out.text);
    assert!(!out.text.contains("Robert Williams"));
    assert!(!out.text.contains("AB1234567"));
    assert!(!out.text.contains("1234567890"));
}

#[test]
fn scenario_five_allcaps_last_first_name_and_date() {
    let text = "PATIENT: JOHNSON, MARY ELIZABETH\nDOB: 04/22/1978";
    let categories = redacted_categories(text);
    assert!(categories.contains(&Category::Name));
    assert!(categories.contains(&Category::Date));
}

#[test]
fn scenario_six_ocr_corrupted_date_is_redacted() {
    // Embedded in a document with enough surrounding OCR noise to trip
    // the document-level isOCR detector (spec.md §4.A: >= 2 of 4
    // indicators), so the adaptive threshold's OCR allowance applies
    // to the corrupted date itself, not just the filter's own pass.
    let text = "PATIENT   RECORD\nDOB: O4/22/l978\nNOTE: image quality poor, CAPS RUN HERE TOO";
    let engine = Engine::new(EngineConfig::default());
    let policy = Policy::default();
    let out = engine.process(text, &policy).expect("process should succeed");

    assert!(out.classification.is_ocr, "expected the document to be flagged OCR-corrupted");
    let date_redactions: Vec<_> = out.redactions.iter().filter(|r| r.category == Category::Date).collect();
    assert_eq!(date_redactions.len(), 1, "{:?}", out.redactions);
}
