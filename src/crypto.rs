//! Stable per-process salt and correlation hashing (SPEC_FULL.md
//! supplement to spec.md §1's Non-goals carve-out: "a stable per-process
//! salt" is explicitly allowed; reversible pseudonymization is not).
//! Ported from the teacher's `crypto.rs` HMAC/SHA-256 plumbing, with the
//! NAPI boundary and DICOM-specific hashing helpers dropped — this
//! crate has no JS host and no DICOM parser (see `dicom.rs`).

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;

/// 32 bytes of OS randomness generated once per engine instance, held
/// only for the process's lifetime and zeroized on drop. Never
/// persisted, never derivable from output (spec.md §1 Non-goals).
#[derive(Clone, ZeroizeOnDrop)]
pub struct Salt([u8; 32]);

impl Salt {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Salt(bytes)
    }

    /// A stable, non-reversible correlation id for `value`, for internal
    /// diagnostics (e.g. linking repeated occurrences of the same
    /// redacted surface text across `stats` without storing the text
    /// itself).
    pub fn correlate(&self, value: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.0).expect("HMAC accepts any key length");
        mac.update(value.as_bytes());
        let digest = mac.finalize().into_bytes();
        hex::encode(&digest[..12])
    }
}

impl Default for Salt {
    fn default() -> Self {
        Salt::generate()
    }
}

/// SHA-256 digest, used where only a one-way content hash is needed
/// (e.g. policy/document fingerprints in logs) rather than a keyed MAC.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Zeroizes `s` in place, for callers that need to scrub a PHI-bearing
/// buffer without dropping it immediately (mirrors the teacher's
/// zeroize-on-replace discipline in `apply.rs`).
pub fn scrub(s: &mut String) {
    s.zeroize();
}
