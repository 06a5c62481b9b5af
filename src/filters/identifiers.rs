//! Structured numeric/alphanumeric identifier filters (SSN, MRN, NPI,
//! DEA, credit card, account number, health plan ID), ported from the
//! teacher's `scan.rs` pattern libraries.

use super::{push_captured, CharMap, Filter, FilterKind};
use crate::policy::Policy;
use crate::span::{CandidateSpan, Category};
use once_cell::sync::Lazy;
use regex::Regex;

// ---------------------------------------------------------------- SSN

static SSN_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b(\d{3})-(\d{2})-(\d{4})\b",
        r"\b(\d{3})[ \t](\d{2})[ \t](\d{4})\b",
        r"\b\d{3}\s*[-.]\s*\d{2}\s*[-.]\s*\d{4}\b",
        r"\b\d{2}-\d{3}-\d{4}\b",
        r"[\*Xx]{3}-[\*Xx]{2}-(\d{4})\b",
        r"\b(\d{3})-(\d{2})-[\*Xx]{4}",
        r"\b[0-9BOSZIlGg|o]{3}-[0-9BOSZIlGg|o]{2}-[0-9BOSZIlGg|o]{3,4}\b",
    ]
    .into_iter()
    .map(|s| Regex::new(s).expect("invalid SSN pattern"))
    .collect()
});

/// Permissive validation: accepts masked SSNs and OCR-confused digits
/// (teacher's `is_valid_ssn`, `scan.rs`).
fn is_valid_ssn(raw: &str) -> bool {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let mask_count = compact.chars().filter(|c| matches!(c, '*' | 'X' | 'x')).count();
    if mask_count >= 2 {
        let digit_count = compact.chars().filter(|c| c.is_ascii_digit()).count();
        return digit_count >= 3;
    }
    let normalized: String = raw
        .chars()
        .map(|c| match c {
            'B' => '8',
            'O' => '0',
            'S' => '5',
            'Z' => '2',
            'I' | 'l' | '|' => '1',
            'g' | 'G' => '9',
            _ => c,
        })
        .collect();
    let digits: usize = normalized.chars().filter(|c| c.is_ascii_digit()).count();
    (8..=9).contains(&digits)
}

pub struct SsnFilter;

impl Filter for SsnFilter {
    fn filter_id(&self) -> &'static str {
        "ssn"
    }
    fn categories(&self) -> &'static [Category] {
        &[Category::Ssn]
    }
    fn scan(&self, text: &str, _policy: &Policy) -> Vec<CandidateSpan> {
        let map = CharMap::build(text);
        let mut out = Vec::new();
        for re in SSN_PATTERNS.iter() {
            for m in re.find_iter(text) {
                if !is_valid_ssn(m.as_str()) {
                    continue;
                }
                out.push(CandidateSpan::new(
                    map.char_offset(m.start()),
                    map.char_offset(m.end()),
                    Category::Ssn,
                    m.as_str(),
                    self.filter_id(),
                    0.95,
                ));
            }
        }
        out
    }
}

// ---------------------------------------------------------------- MRN

static MRN_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b(?:MRN?|Medical\s+Record(?:\s+Number)?)(?:\s*\([^)]+\))?\s*(?:[:#]\s*)?#?\s*([A-Z0-9][A-Z0-9-]{4,14})\b",
        r"\b(?:Chart)(?:\s+(?:Number|No|#))?\s*(?:[:#]\s*)?#?\s*([A-Z0-9][A-Z0-9-]{4,11})\b",
        r"\b(?:Patient)(?:\s+(?:ID|Number|#))?\s*(?:[:#]\s*)?#?\s*([A-Z0-9][A-Z0-9-]{4,14})\b",
        r"\b(?:Accession)(?:\s+(?:Number|No|#))?\s*(?:[:#]\s*)?#?\s*([A-Z0-9][A-Z0-9-]{4,14})\b",
        r"\b((?:PAT|PT|MRN|PATIENT|MR|REC|CHART|CASE|ACC)_[A-Z0-9_]{4,20})\b",
    ]
    .into_iter()
    .map(|s| Regex::new(&format!("(?i){}", s)).expect("invalid MRN pattern"))
    .collect()
});

pub struct MrnFilter;

impl Filter for MrnFilter {
    fn filter_id(&self) -> &'static str {
        "mrn"
    }
    fn categories(&self) -> &'static [Category] {
        &[Category::Mrn]
    }
    fn scan(&self, text: &str, _policy: &Policy) -> Vec<CandidateSpan> {
        let map = CharMap::build(text);
        let mut out = Vec::new();
        for re in MRN_PATTERNS.iter() {
            push_captured(text, &map, re, Category::Mrn, self.filter_id(), 0.9, &mut out);
        }
        out
    }
}

// ---------------------------------------------------------------- NPI

static NPI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bNPI(?:\s+(?:Number|No|#))?\s*[#:]*\s*([0-9]{10})\b").expect("invalid NPI_RE")
});

pub struct NpiFilter;

impl Filter for NpiFilter {
    fn filter_id(&self) -> &'static str {
        "npi"
    }
    fn categories(&self) -> &'static [Category] {
        &[Category::Npi]
    }
    fn scan(&self, text: &str, _policy: &Policy) -> Vec<CandidateSpan> {
        let map = CharMap::build(text);
        let mut out = Vec::new();
        push_captured(text, &map, &NPI_RE, Category::Npi, self.filter_id(), 0.95, &mut out);
        out
    }
}

// ---------------------------------------------------------------- DEA

static DEA_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\bDEA(?:\s+(?:Number|No|#))?\s*[:#]?\s*([A-Z]{2}\d{7})\b",
        r"\bDEA(?:\s+(?:Number|No|#))?\s*[:#]?\s*([A-Z]{2}[0-9OoIlBbSs]{7})\b",
    ]
    .into_iter()
    .map(|s| Regex::new(&format!("(?i){}", s)).expect("invalid DEA pattern"))
    .collect()
});

fn normalize_dea_alnum(dea: &str) -> String {
    dea.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn is_valid_dea(dea: &str) -> bool {
    normalize_dea_alnum(dea).len() == 9
}

pub struct DeaFilter;

impl Filter for DeaFilter {
    fn filter_id(&self) -> &'static str {
        "dea"
    }
    fn categories(&self) -> &'static [Category] {
        &[Category::Dea]
    }
    fn scan(&self, text: &str, _policy: &Policy) -> Vec<CandidateSpan> {
        let map = CharMap::build(text);
        let mut out = Vec::new();
        for re in DEA_PATTERNS.iter() {
            for caps in re.captures_iter(text) {
                let whole = caps.get(0).expect("group 0 always present");
                let m = caps.get(1).unwrap_or(whole);
                if !is_valid_dea(m.as_str()) {
                    continue;
                }
                out.push(CandidateSpan::new(
                    map.char_offset(m.start()),
                    map.char_offset(m.end()),
                    Category::Dea,
                    m.as_str(),
                    self.filter_id(),
                    0.9,
                ));
            }
        }
        out
    }
}

// ---------------------------------------------------------------- CREDIT CARD

static CREDITCARD_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b(?:card|cc|credit\s*card)\s*[:#]?\s*([\d\s-]{13,23})\b",
        r"\b\d{4}[\s-]?\d{4}[\s-]?\d{4}[\s-]?\d{1,7}\b",
        r"\b3[47]\d{13}\b",
        r"\b3[47]\d{2}[\s-]?\d{4}[\s-]?\d{4}[\s-]?\d{3}\b",
    ]
    .into_iter()
    .map(|s| Regex::new(&format!("(?i){}", s)).expect("invalid CREDITCARD pattern"))
    .collect()
});

fn luhn_ok(digits: &[u32]) -> bool {
    let mut sum = 0u32;
    let mut is_even = false;
    for d in digits.iter().rev() {
        let mut digit = *d;
        if is_even {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
        is_even = !is_even;
    }
    sum % 10 == 0
}

fn is_creditcard_like(card: &str) -> bool {
    let digits: Vec<u32> = card.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 13 || digits.len() > 19 {
        return false;
    }
    let is_amex = digits.len() == 15 && (card.contains("34") || card.contains("37"));
    is_amex || luhn_ok(&digits)
}

pub struct CreditCardFilter;

impl Filter for CreditCardFilter {
    fn filter_id(&self) -> &'static str {
        "credit_card"
    }
    fn categories(&self) -> &'static [Category] {
        &[Category::CreditCard]
    }
    fn scan(&self, text: &str, _policy: &Policy) -> Vec<CandidateSpan> {
        let map = CharMap::build(text);
        let mut out = Vec::new();
        for re in CREDITCARD_PATTERNS.iter() {
            for caps in re.captures_iter(text) {
                let whole = caps.get(0).expect("group 0 always present");
                let m = caps.get(1).unwrap_or(whole);
                if !is_creditcard_like(m.as_str()) {
                    continue;
                }
                out.push(CandidateSpan::new(
                    map.char_offset(m.start()),
                    map.char_offset(m.end()),
                    Category::CreditCard,
                    m.as_str(),
                    self.filter_id(),
                    0.92,
                ));
            }
        }
        out
    }
}

// ---------------------------------------------------------------- ACCOUNT NUMBER

static ACCOUNT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(?:Bank(?:ing)?|Checking|Savings)\s+(?:Account|Acct)(?:\s+(?:Number|No|#))?\s*[:#]?\s*([*\d][-*\d]{3,15})\b",
        r"(?i)\b(?:Account\s+Number|Patient\s+ID|Member\s+ID|Subscriber\s+ID|Accession\s+(?:Number|No)|Reference\s+(?:Number|No)|Confirmation\s+(?:Number|No))[\s:]+([A-Z]{2,5}-\d{4,12}(?:-\d{4,12})?)\b",
        r"\b([A-Z]{2,5}-\d{6,12})\b",
    ]
    .into_iter()
    .map(|s| Regex::new(s).expect("invalid ACCOUNT pattern"))
    .collect()
});

pub struct AccountNumberFilter;

impl Filter for AccountNumberFilter {
    fn filter_id(&self) -> &'static str {
        "account_number"
    }
    fn categories(&self) -> &'static [Category] {
        &[Category::AccountNumber]
    }
    fn scan(&self, text: &str, _policy: &Policy) -> Vec<CandidateSpan> {
        let map = CharMap::build(text);
        let mut out = Vec::new();
        for re in ACCOUNT_PATTERNS.iter() {
            push_captured(text, &map, re, Category::AccountNumber, self.filter_id(), 0.85, &mut out);
        }
        out
    }
}

// ---------------------------------------------------------------- HEALTH PLAN ID

static HEALTHPLAN_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(?:Insurance\s+)?Policy(?:\s+(?:Number|No|#))?\s*[:#]?\s*([A-Z]{2,4}-\d{4}-\d{4,8}|[A-Z]{3,4}-\d{5,8})\b",
        r"(?i)\b(?:Group\s+(?:Number|No|#))[\s:]+([A-Z]{3,5}-[A-Z0-9]{4,12}(?:-\d{4})?)\b",
        r"(?i)\bHealth\s+Plan(?:\s+ID)?\s*[:#]?\s*([A-Z0-9-]{5,20})\b",
    ]
    .into_iter()
    .map(|s| Regex::new(s).expect("invalid HEALTHPLAN pattern"))
    .collect()
});

pub struct HealthPlanIdFilter;

impl Filter for HealthPlanIdFilter {
    fn filter_id(&self) -> &'static str {
        "health_plan_id"
    }
    fn categories(&self) -> &'static [Category] {
        &[Category::HealthPlanId]
    }
    fn kind(&self) -> FilterKind {
        FilterKind::StructuredData
    }
    fn scan(&self, text: &str, _policy: &Policy) -> Vec<CandidateSpan> {
        let map = CharMap::build(text);
        let mut out = Vec::new();
        for re in HEALTHPLAN_PATTERNS.iter() {
            push_captured(text, &map, re, Category::HealthPlanId, self.filter_id(), 0.85, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Policy;

    #[test]
    fn ssn_matches_standard_format() {
        let policy = Policy::default();
        let spans = SsnFilter.scan("SSN: 456-78-9012", &policy);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].category, Category::Ssn);
    }

    #[test]
    fn mrn_matches_labeled_identifier() {
        let policy = Policy::default();
        let spans = MrnFilter.scan("MRN: AB12345", &policy);
        assert!(!spans.is_empty());
    }

    #[test]
    fn credit_card_rejects_non_luhn_sixteen_digits() {
        let policy = Policy::default();
        let spans = CreditCardFilter.scan("Account 1111222233334444", &policy);
        assert!(spans.is_empty());
    }

    #[test]
    fn credit_card_accepts_luhn_valid_number() {
        let policy = Policy::default();
        let spans = CreditCardFilter.scan("Card: 4111 1111 1111 1111", &policy);
        assert!(!spans.is_empty());
    }

    #[test]
    fn dea_requires_nine_alnum_after_prefix() {
        let policy = Policy::default();
        let spans = DeaFilter.scan("DEA: AB1234567", &policy);
        assert_eq!(spans.len(), 1);
    }
}
