//! Remaining structured filters: VIN, license plate, age 90+,
//! biometric identifiers, device identifiers — ported from the
//! teacher's `scan.rs`.

use super::{push_captured, CharMap, Filter, FilterKind};
use crate::policy::Policy;
use crate::span::{CandidateSpan, Category};
use once_cell::sync::Lazy;
use regex::Regex;

fn push_matches(
    text: &str,
    map: &CharMap,
    re: &Regex,
    category: Category,
    filter_id: &'static str,
    confidence: f64,
    out: &mut Vec<CandidateSpan>,
) {
    for m in re.find_iter(text) {
        out.push(CandidateSpan::new(
            map.char_offset(m.start()),
            map.char_offset(m.end()),
            category,
            m.as_str(),
            filter_id,
            confidence,
        ));
    }
}

// ---------------------------------------------------------------- VIN

static VIN_LABELED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:VIN|Vehicle\s+Identification\s+Number|Vehicle\s+ID)[\s:#]*([A-HJ-NPR-Z0-9]{17})\b")
        .expect("invalid VIN_LABELED_RE")
});
static VIN_STANDALONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-HJ-NPR-Z0-9]{17})\b").expect("invalid VIN_STANDALONE_RE"));

fn is_valid_vin(vin: &str) -> bool {
    let cleaned: String = vin.chars().filter(|c| !c.is_whitespace()).collect();
    cleaned.len() == 17 && !cleaned.contains(['I', 'O', 'Q'])
}

pub struct VinFilter;

impl Filter for VinFilter {
    fn filter_id(&self) -> &'static str {
        "vin"
    }
    fn categories(&self) -> &'static [Category] {
        &[Category::Vin]
    }
    fn scan(&self, text: &str, _policy: &Policy) -> Vec<CandidateSpan> {
        let map = CharMap::build(text);
        let mut out = Vec::new();
        push_captured(text, &map, &VIN_LABELED_RE, Category::Vin, self.filter_id(), 0.95, &mut out);
        for m in VIN_STANDALONE_RE.find_iter(text) {
            if !is_valid_vin(m.as_str()) {
                continue;
            }
            out.push(CandidateSpan::new(
                map.char_offset(m.start()),
                map.char_offset(m.end()),
                Category::Vin,
                m.as_str(),
                self.filter_id(),
                0.7,
            ));
        }
        out
    }
}

// ---------------------------------------------------------------- LICENSE PLATE

static PLATE_LABELED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:license\s+plate|plate\s+number|registration|plate)[\s:#]*([A-Z]{2}[-\s]?[A-Z0-9]{5,7}|[A-Z0-9]{2,3}[-\s]?[A-Z0-9]{3,4})\b")
        .expect("invalid PLATE_LABELED_RE")
});

pub struct LicensePlateFilter;

impl Filter for LicensePlateFilter {
    fn filter_id(&self) -> &'static str {
        "license_plate"
    }
    fn categories(&self) -> &'static [Category] {
        &[Category::LicensePlate]
    }
    fn kind(&self) -> FilterKind {
        FilterKind::StructuredData
    }
    fn scan(&self, text: &str, _policy: &Policy) -> Vec<CandidateSpan> {
        let map = CharMap::build(text);
        let mut out = Vec::new();
        push_captured(text, &map, &PLATE_LABELED_RE, Category::LicensePlate, self.filter_id(), 0.88, &mut out);
        out
    }
}

// ---------------------------------------------------------------- AGE 90+

static AGE_EXPLICIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(9\d|1[0-2]\d)\s*(?:years?\s+old|y\.?o\.?|yr\.?s?\s+old|years?\s+of\s+age)\b")
        .expect("invalid AGE_EXPLICIT_RE")
});
static AGE_LABELED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:age|aged)\s*[:#]?\s*(9\d|1[0-2]\d)\b").expect("invalid AGE_LABELED_RE")
});
static AGE_COMPOUND_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(9\d|1[0-2]\d)[-\x{2013}]year[-\x{2013}]old\b").expect("invalid AGE_COMPOUND_RE")
});
static AGE_ORDINAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:in\s+)?(?:his|her|their|the)\s+(?:early\s+|mid[- ]?|late\s+)?(90|100|110)s\b")
        .expect("invalid AGE_ORDINAL_RE")
});
static AGE_DEMOGRAPHIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(9\d|1[0-2]\d)\s*([MF]|Male|Female)\b").expect("invalid AGE_DEMOGRAPHIC_RE")
});

fn is_age_90_plus(age_str: &str) -> bool {
    age_str.parse::<u32>().map(|a| (90..=125).contains(&a)).unwrap_or(false)
}

pub struct Age90PlusFilter;

impl Filter for Age90PlusFilter {
    fn filter_id(&self) -> &'static str {
        "age_90_plus"
    }
    fn categories(&self) -> &'static [Category] {
        &[Category::Age90Plus]
    }
    fn scan(&self, text: &str, _policy: &Policy) -> Vec<CandidateSpan> {
        let map = CharMap::build(text);
        let mut out = Vec::new();
        for re in [&*AGE_EXPLICIT_RE, &*AGE_LABELED_RE, &*AGE_COMPOUND_RE, &*AGE_DEMOGRAPHIC_RE] {
            for caps in re.captures_iter(text) {
                let m = caps.get(0).expect("group 0 always present");
                let digits = caps.get(1).map(|g| g.as_str()).unwrap_or("");
                if !is_age_90_plus(digits) {
                    continue;
                }
                out.push(CandidateSpan::new(
                    map.char_offset(m.start()),
                    map.char_offset(m.end()),
                    Category::Age90Plus,
                    m.as_str(),
                    self.filter_id(),
                    0.9,
                ));
            }
        }
        push_matches(text, &map, &AGE_ORDINAL_RE, Category::Age90Plus, self.filter_id(), 0.7, &mut out);
        out
    }
}

// ---------------------------------------------------------------- BIOMETRIC

static BIOMETRIC_LABELED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:fingerprint|retina|iris|voiceprint|facial\s*recognition|biometric)\s*(?:id|identifier|data|scan|template|hash|record|sample)\s*[:#]?\s*([A-Z0-9][A-Z0-9\-_]{5,})\b")
        .expect("invalid BIOMETRIC_LABELED_RE")
});
static BIOMETRIC_DNA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:dna|genetic|genome|genotype)\s*(?:id|identifier|profile|sample|marker|sequence)\s*[:#]?\s*([A-Z0-9][A-Z0-9\-_]{5,})\b")
        .expect("invalid BIOMETRIC_DNA_RE")
});

pub struct BiometricFilter;

impl Filter for BiometricFilter {
    fn filter_id(&self) -> &'static str {
        "biometric"
    }
    fn categories(&self) -> &'static [Category] {
        &[Category::Biometric]
    }
    fn kind(&self) -> FilterKind {
        FilterKind::StructuredData
    }
    fn scan(&self, text: &str, _policy: &Policy) -> Vec<CandidateSpan> {
        let map = CharMap::build(text);
        let mut out = Vec::new();
        push_captured(text, &map, &BIOMETRIC_LABELED_RE, Category::Biometric, self.filter_id(), 0.93, &mut out);
        push_captured(text, &map, &BIOMETRIC_DNA_RE, Category::Biometric, self.filter_id(), 0.93, &mut out);
        out
    }
}

// ---------------------------------------------------------------- DEVICE ID

static DEVICE_WITH_SERIAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:Pacemaker|Defibrillator|ICD|AICD|CRT|Implant|Device|Prosth|Stent|Catheter|Pump|Stimulator|Valve|Graft)\s+(?:Serial|SN|ID|Number|Model)\s*[#:]?\s*([A-Z0-9][A-Z0-9-]{6,24})\b")
        .expect("invalid DEVICE_WITH_SERIAL_RE")
});
static DEVICE_SERIAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:Serial|SN)(?:\s+(?:Number|No|#))?\s*[#:]?\s*([A-Z0-9][A-Z0-9-]{6,24})\b")
        .expect("invalid DEVICE_SERIAL_RE")
});
static DEVICE_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b((?:BS|TAN|PM|ICD|CRT|IPG|INS|CGM|VAD|LVAD|SCS|DBS|VNS|SNS|MDT|SJM|BIO|DEV|SER|MOD|REF|LOT|UDI)-[A-Z0-9]{5,})\b")
        .expect("invalid DEVICE_PREFIX_RE")
});

fn is_valid_device_identifier(identifier: &str) -> bool {
    let cleaned: String = identifier.chars().filter(|c| *c != '-').collect();
    if cleaned.len() < 7 || cleaned.len() > 25 {
        return false;
    }
    cleaned.chars().any(|c| c.is_ascii_digit()) && cleaned.chars().all(|c| c.is_ascii_alphanumeric())
}

pub struct DeviceIdFilter;

impl Filter for DeviceIdFilter {
    fn filter_id(&self) -> &'static str {
        "device_id"
    }
    fn categories(&self) -> &'static [Category] {
        &[Category::DeviceId]
    }
    fn kind(&self) -> FilterKind {
        FilterKind::StructuredData
    }
    fn scan(&self, text: &str, _policy: &Policy) -> Vec<CandidateSpan> {
        let map = CharMap::build(text);
        let mut out = Vec::new();
        for re in [&*DEVICE_WITH_SERIAL_RE, &*DEVICE_SERIAL_RE, &*DEVICE_PREFIX_RE] {
            for caps in re.captures_iter(text) {
                let whole = caps.get(0).expect("group 0 always present");
                let m = caps.get(1).unwrap_or(whole);
                if !is_valid_device_identifier(m.as_str()) {
                    continue;
                }
                out.push(CandidateSpan::new(
                    map.char_offset(m.start()),
                    map.char_offset(m.end()),
                    Category::DeviceId,
                    m.as_str(),
                    self.filter_id(),
                    0.85,
                ));
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
    fn vin_labeled_matches_seventeen_chars() {
        let spans = VinFilter.scan("VIN: 1HGCM82633A004352", &Policy::default());
        assert!(!spans.is_empty());
    }

    #[test]
    fn age_90_plus_flags_explicit_age() {
        let spans = Age90PlusFilter.scan("Patient is 92 years old.", &Policy::default());
        assert!(!spans.is_empty());
    }

    #[test]
    fn age_90_plus_ignores_ages_below_ninety() {
        let spans = Age90PlusFilter.scan("Patient is 45 years old.", &Policy::default());
        assert!(spans.is_empty());
    }

    #[test]
    fn device_id_matches_labeled_serial() {
        let spans = DeviceIdFilter.scan("Pacemaker Serial: ABC123456", &Policy::default());
        assert!(!spans.is_empty());
    }
}
