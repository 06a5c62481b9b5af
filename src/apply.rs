//! Replacement Applier (spec.md §4.G): applies a non-overlapping
//! redaction set to a document's text. Ported from the teacher's
//! `apply_replacements`, adapted from UTF-16 code-unit offsets (the
//! teacher serves a JS/NAPI host) to Unicode scalar-value (`char`)
//! offsets, since this crate has no such host (see DESIGN.md). The
//! zeroize-on-replace behavior is kept: each excised PHI segment is
//! scrubbed from memory immediately after substitution.

use crate::document::Document;
use crate::errors::EngineError;
use crate::policy::Policy;
use crate::span::Redaction;
use zeroize::Zeroize;

/// Applies `redactions` to `document`'s text, replacing each span with
/// its policy-rendered placeholder. `redactions` need not be sorted;
/// they are processed highest-offset-first so earlier offsets remain
/// valid as the string shrinks or grows (spec.md §4.G).
///
/// Returns `Err(EngineError::InvariantViolation)` — never panics — if an
/// overlapping redaction pair reaches the applier; this should be
/// impossible post-resolver, but spec.md §4.G's "Failure mode" note
/// requires an abortable error here rather than a process crash.
pub fn apply_redactions(
    document: &Document,
    redactions: &[Redaction],
    policy: &Policy,
) -> Result<String, EngineError> {
    if redactions.is_empty() {
        return Ok(document.text().to_string());
    }

    let mut sorted: Vec<&Redaction> = redactions.iter().collect();
    sorted.sort_by(|a, b| b.start.cmp(&a.start));

    for pair in sorted.windows(2) {
        let (later, earlier) = (pair[0], pair[1]);
        if earlier.end > later.start {
            return Err(EngineError::InvariantViolation {
                phase: "apply",
                detail: format!(
                    "overlapping redactions reached the applier: [{}, {}) and [{}, {})",
                    earlier.start, earlier.end, later.start, later.end
                ),
            });
        }
    }

    let mut out = document.text().to_string();
    for r in sorted {
        let start_b = document.byte_offset(r.start).min(out.len());
        let end_b = document.byte_offset(r.end).min(out.len());
        if end_b <= start_b || !out.is_char_boundary(start_b) || !out.is_char_boundary(end_b) {
            continue;
        }

        let placeholder = policy
            .placeholder_style
            .render(r.category, r.original_length, policy.preserve_length);

        let mut phi_segment = out[start_b..end_b].to_string();
        out.replace_range(start_b..end_b, &placeholder);
        phi_segment.zeroize();
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PlaceholderStyle;
    use crate::span::Category;

    fn redaction(start: usize, end: usize, category: Category) -> Redaction {
        Redaction {
            start,
            end,
            category,
            replacement: String::new(),
            original_length: end - start,
            confidence: 0.9,
        }
    }

    #[test]
    fn applies_single_redaction() {
        let doc = Document::new("SSN: 456-78-9012");
        let policy = Policy::default();
        let out = apply_redactions(&doc, &[redaction(5, 16, Category::Ssn)], &policy).expect("apply");
        assert_eq!(out, "SSN: [SSN]");
    }

    #[test]
    fn applies_multiple_non_overlapping_redactions_in_any_order() {
        let doc = Document::new("Patient: John Smith, DOB: 1940-01-01");
        let policy = Policy::default();
        let rs = vec![
            redaction(9, 19, Category::Name),
            redaction(26, 36, Category::Date),
        ];
        let out = apply_redactions(&doc, &rs, &policy).expect("apply");
        assert_eq!(out, "Patient: [NAME], DOB: [DATE]");
    }

    #[test]
    fn empty_redaction_list_returns_text_unchanged() {
        let doc = Document::new("No PHI here.");
        let policy = Policy::default();
        let out = apply_redactions(&doc, &[], &policy).expect("apply");
        assert_eq!(out, "No PHI here.");
    }

    #[test]
    fn honors_placeholder_style_override() {
        let doc = Document::new("SSN: 456-78-9012");
        let mut policy = Policy::default();
        policy.placeholder_style = PlaceholderStyle::Redacted;
        let out = apply_redactions(&doc, &[redaction(5, 16, Category::Ssn)], &policy).expect("apply");
        assert_eq!(out, "SSN: ***REDACTED***");
    }

    #[test]
    fn handles_multibyte_characters_correctly() {
        let doc = Document::new("Patient: José García, DOB: 1940-01-01");
        let policy = Policy::default();
        let name_len = "José García".chars().count();
        let out = apply_redactions(&doc, &[redaction(9, 9 + name_len, Category::Name)], &policy)
            .expect("apply");
        assert_eq!(out, "Patient: [NAME], DOB: 1940-01-01");
    }

    #[test]
    fn overlapping_redactions_return_an_invariant_violation() {
        let doc = Document::new("abcdefghij");
        let policy = Policy::default();
        let rs = vec![redaction(0, 5, Category::Name), redaction(3, 8, Category::Ssn)];
        let err = apply_redactions(&doc, &rs, &policy).expect_err("should reject overlap");
        assert!(matches!(err, EngineError::InvariantViolation { phase: "apply", .. }));
    }

    #[test]
    fn idempotent_on_already_redacted_text() {
        let doc = Document::new("SSN: 456-78-9012");
        let policy = Policy::default();
        let out = apply_redactions(&doc, &[redaction(5, 16, Category::Ssn)], &policy).expect("apply");
        assert!(!out.contains("456-78-9012"));
        assert!(out.contains("[SSN]"));
    }
}
