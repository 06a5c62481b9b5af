//! DICOM anonymization trait stub (spec.md §6, SPEC_FULL.md supplement).
//! No DICOM byte-level parser lives here — this crate's core is the
//! text pipeline (§4.A-G). `DicomAnonymizer` names the contract an
//! external DICOM-tag-walker would implement to reuse this crate's
//! salted-hash correlation for UID/token anonymization, consistent with
//! spec.md §1 treating the DICOM subsystem as an out-of-scope external
//! collaborator.

use crate::crypto::Salt;

/// One DICOM data-element action decision, as an external tag-walker
/// would apply per spec.md §6's `{tag, action}` contract: exactly the
/// three named actions, no "keep" no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagAction {
    /// Remove the element entirely.
    Remove,
    /// Replace the element's value with a salted, non-reversible token.
    Replace,
    /// Replace the element's value with a salted hash preserving DICOM
    /// UID shape (numeric, dot-separated).
    Hash,
}

/// Implemented by an external DICOM tag-walker; this crate supplies only
/// the salted hashing primitives (`crypto::Salt`), not DICOM parsing.
pub trait DicomAnonymizer {
    /// Decide how to handle a single `(group, element)` tag.
    fn action_for_tag(&self, group: u16, element: u16) -> TagAction;
}

/// Token anonymization for a DICOM element value, reusing the engine's
/// per-process salt rather than a DICOM-specific one.
pub fn anonymize_token(salt: &Salt, value: &str) -> String {
    format!("ANON_{}", salt.correlate(value).to_ascii_uppercase())
}

/// UID anonymization: DICOM UIDs must remain syntactically valid
/// (numeric, dot-separated, `2.25.` root reserved for UUID-derived
/// UIDs per DICOM PS3.5), so the salted hash is rendered as a decimal
/// integer rather than hex.
pub fn anonymize_uid(salt: &Salt, value: &str) -> String {
    let correlated = salt.correlate(value);
    let numeric: String = correlated.chars().filter(|c| c.is_ascii_digit()).collect();
    let numeric = if numeric.is_empty() { "0".to_string() } else { numeric };
    format!("2.25.{}", numeric)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymize_token_is_deterministic_for_fixed_salt() {
        let salt = Salt::generate();
        assert_eq!(anonymize_token(&salt, "1.2.840"), anonymize_token(&salt, "1.2.840"));
    }

    #[test]
    fn anonymize_uid_keeps_dicom_uid_shape() {
        let salt = Salt::generate();
        let uid = anonymize_uid(&salt, "1.2.840.10008.1.1");
        assert!(uid.starts_with("2.25."));
        assert!(uid[5..].chars().all(|c| c.is_ascii_digit()));
    }
}
