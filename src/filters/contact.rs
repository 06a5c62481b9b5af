//! Contact-information filters (email, phone, fax, address, zip, IP,
//! URL), ported from the teacher's `scan.rs` pattern libraries.

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

// ---------------------------------------------------------------- EMAIL

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b").expect("invalid EMAIL_RE")
});

pub struct EmailFilter;

impl Filter for EmailFilter {
    fn filter_id(&self) -> &'static str {
        "email"
    }
    fn categories(&self) -> &'static [Category] {
        &[Category::Email]
    }
    fn scan(&self, text: &str, _policy: &Policy) -> Vec<CandidateSpan> {
        let map = CharMap::build(text);
        let mut out = Vec::new();
        push_matches(text, &map, &EMAIL_RE, Category::Email, self.filter_id(), 0.95, &mut out);
        out
    }
}

// ---------------------------------------------------------------- PHONE

static PHONE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(\+?1[-. \t]?)?\(?\d{3}\)?[-. \t]?\d{3}[-. \t]?\d{4}(?:[ \t]*(?:ext\.?|x|extension)[ \t]*[A-Z0-9]{1,6})?\b",
        r"\+44[ \t]*\(?0?\)?[ \t]*\d{2,4}[ \t.-]?\d{3,4}[ \t.-]?\d{3,4}(?:[ \t]*(?:ext\.?|x)[ \t]*[A-Z0-9]{1,6})?\b",
        r"\b0\d{2,4}[ \t.-]?\d{3,4}[ \t.-]?\d{3,4}(?:[ \t]*(?:ext\.?|x)[ \t]*[A-Z0-9]{1,6})?\b",
        r"\+49[ \t]*\(?0?\)?[ \t]*\d{2,5}[ \t.-]?\d{3,8}(?:[ \t]*(?:ext\.?|x)[ \t]*[A-Z0-9]{1,6})?\b",
        r"\+61[ \t]*\(?0?\)?[ \t]*[2-9][ \t.-]?\d{4}[ \t.-]?\d{4}(?:[ \t]*(?:ext\.?|x)[ \t]*[A-Z0-9]{1,6})?\b",
        r"\+[1-9]\d{0,2}[ \t.-]?\d{2,5}[ \t.-]?\d{3,5}[ \t.-]?\d{3,5}(?:[ \t]*(?:ext\.?|extn|x|extension)[ \t]*[A-Z0-9]{1,6})?\b",
    ]
    .into_iter()
    .map(|s| Regex::new(&format!("(?i){}", s)).expect("invalid PHONE pattern"))
    .collect()
});

fn phone_confidence(phone: &str) -> f64 {
    let mut conf = 0.9;
    if phone.starts_with('+') {
        conf = 0.95;
    }
    let lower = phone.to_ascii_lowercase();
    if lower.contains("ext") || lower.contains("extension") || lower.contains('x') {
        conf = 0.95;
    }
    conf
}

pub struct PhoneFilter;

impl Filter for PhoneFilter {
    fn filter_id(&self) -> &'static str {
        "phone"
    }
    fn categories(&self) -> &'static [Category] {
        &[Category::Phone]
    }
    fn scan(&self, text: &str, _policy: &Policy) -> Vec<CandidateSpan> {
        let map = CharMap::build(text);
        let mut out = Vec::new();
        for re in PHONE_PATTERNS.iter() {
            for m in re.find_iter(text) {
                let digits = m.as_str().chars().filter(|c| c.is_ascii_digit()).count();
                if digits < 7 {
                    continue;
                }
                out.push(CandidateSpan::new(
                    map.char_offset(m.start()),
                    map.char_offset(m.end()),
                    Category::Phone,
                    m.as_str(),
                    self.filter_id(),
                    phone_confidence(m.as_str()),
                ));
            }
        }
        out
    }
}

// ---------------------------------------------------------------- FAX

static FAX_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b(?:Fax|FAX)(?:\s+(?:Number|No|#))?\s*[#:]?\s*(\+?1?[-.\s]?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4})\b",
        r"\b(?:send|fax|transmit)(?:\s+(?:to|results))?\s+(?:fax)?\s*[#:]?\s*(\+?1?[-.\s]?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4})\b",
    ]
    .into_iter()
    .map(|s| Regex::new(&format!("(?i){}", s)).expect("invalid FAX pattern"))
    .collect()
});

pub struct FaxFilter;

impl Filter for FaxFilter {
    fn filter_id(&self) -> &'static str {
        "fax"
    }
    fn categories(&self) -> &'static [Category] {
        &[Category::Fax]
    }
    fn scan(&self, text: &str, _policy: &Policy) -> Vec<CandidateSpan> {
        let map = CharMap::build(text);
        let mut out = Vec::new();
        for re in FAX_PATTERNS.iter() {
            push_captured(text, &map, re, Category::Fax, self.filter_id(), 0.93, &mut out);
        }
        out
    }
}

// ---------------------------------------------------------------- ADDRESS

static ADDRESS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b\d+\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\s+(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Dr|Court|Ct|Place|Pl|Way),\s*[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*,\s*[A-Z]{2}\s+\d{5}(?:-\d{4})?\b",
        r"\b[A-Z]\d[A-Z]\s*\d[A-Z]\d\b",
        r"(?i)\b[A-Z]{1,2}\d[A-Z\d]?\s*\d[A-Z]{2}\b",
    ]
    .into_iter()
    .map(|s| Regex::new(s).expect("invalid ADDRESS pattern"))
    .collect()
});

static ADDRESS_HIGHWAY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(?:Highway|Hwy|US[-\s]?)\s*\d{1,3}[A-Z]?\b",
        r"(?i)\b(?:Interstate|I[-\s]?)\s*\d{1,3}\b",
        r"(?i)\b(?:State\s+)?(?:Route|SR)[-\s]?\d{1,4}\b",
    ]
    .into_iter()
    .map(|s| Regex::new(s).expect("invalid ADDRESS highway pattern"))
    .collect()
});

pub struct AddressFilter;

impl Filter for AddressFilter {
    fn filter_id(&self) -> &'static str {
        "address"
    }
    fn categories(&self) -> &'static [Category] {
        &[Category::Address]
    }
    fn scan(&self, text: &str, _policy: &Policy) -> Vec<CandidateSpan> {
        let map = CharMap::build(text);
        let mut out = Vec::new();
        for re in ADDRESS_PATTERNS.iter() {
            push_matches(text, &map, re, Category::Address, self.filter_id(), 0.85, &mut out);
        }
        for re in ADDRESS_HIGHWAY_PATTERNS.iter() {
            push_matches(text, &map, re, Category::Address, self.filter_id(), 0.8, &mut out);
        }
        out
    }
}

// ---------------------------------------------------------------- ZIPCODE

static ZIP_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"\b\d{5}-\d{4}\b", r"\b\d{5}\b"]
        .into_iter()
        .map(|s| Regex::new(s).expect("invalid ZIP pattern"))
        .collect()
});

pub struct ZipcodeFilter;

impl Filter for ZipcodeFilter {
    fn filter_id(&self) -> &'static str {
        "zipcode"
    }
    fn categories(&self) -> &'static [Category] {
        &[Category::Zipcode]
    }
    fn scan(&self, text: &str, _policy: &Policy) -> Vec<CandidateSpan> {
        let map = CharMap::build(text);
        let mut out = Vec::new();
        for re in ZIP_PATTERNS.iter() {
            push_matches(text, &map, re, Category::Zipcode, self.filter_id(), 0.6, &mut out);
        }
        out
    }
}

// ---------------------------------------------------------------- IP

static IPV4_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").expect("invalid IPV4_RE"));
static IPV6_FULL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:[0-9A-Fa-f]{1,4}:){7}[0-9A-Fa-f]{1,4}\b").expect("invalid IPV6_FULL_RE")
});
static IPV6_COMPRESSED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:[0-9A-Fa-f]{1,4}:){1,6}(?::[0-9A-Fa-f]{1,4}){1,6}\b")
        .expect("invalid IPV6_COMPRESSED_RE")
});

fn is_valid_ipv4(ip: &str) -> bool {
    let parts: Vec<&str> = ip.split('.').collect();
    if parts.len() != 4 {
        return false;
    }
    parts.iter().all(|p| {
        !p.is_empty() && p.len() <= 3 && p.parse::<u32>().map(|n| n <= 255).unwrap_or(false)
    })
}

pub struct IpFilter;

impl Filter for IpFilter {
    fn filter_id(&self) -> &'static str {
        "ip"
    }
    fn categories(&self) -> &'static [Category] {
        &[Category::Ip]
    }
    fn scan(&self, text: &str, _policy: &Policy) -> Vec<CandidateSpan> {
        let map = CharMap::build(text);
        let mut out = Vec::new();
        for m in IPV4_RE.find_iter(text) {
            if !is_valid_ipv4(m.as_str()) {
                continue;
            }
            out.push(CandidateSpan::new(
                map.char_offset(m.start()),
                map.char_offset(m.end()),
                Category::Ip,
                m.as_str(),
                self.filter_id(),
                0.9,
            ));
        }
        push_matches(text, &map, &IPV6_FULL_RE, Category::Ip, self.filter_id(), 0.9, &mut out);
        push_matches(text, &map, &IPV6_COMPRESSED_RE, Category::Ip, self.filter_id(), 0.75, &mut out);
        out
    }
}

// ---------------------------------------------------------------- URL

static URL_PATTERNS: Lazy<Vec<(Regex, f64)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r#"(?i)\b(?:https?://|ftp://|www\.)[^\s<>"{}|\\^`\[\]]+"#)
                .expect("invalid URL standard"),
            0.95,
        ),
        (
            Regex::new(r#"(?i)\b(?:mychart|myhealth|patient(?:portal)?|epic|cerner|athena)[.\-]?[a-z0-9.\-]+\.(?:com|org|net|edu|health|healthcare)[^\s<>"{}|\\^`\[\]]*"#)
                .expect("invalid URL patient portal"),
            0.92,
        ),
        (
            Regex::new(r#"(?i)\b(?:linkedin\.com/in/|facebook\.com/|twitter\.com/|instagram\.com/)[^\s<>"{}|\\^`\[\]]+"#)
                .expect("invalid URL social"),
            0.9,
        ),
    ]
});

pub struct UrlFilter;

impl Filter for UrlFilter {
    fn filter_id(&self) -> &'static str {
        "url"
    }
    fn categories(&self) -> &'static [Category] {
        &[Category::Url]
    }
    fn kind(&self) -> FilterKind {
        FilterKind::StructuredData
    }
    fn scan(&self, text: &str, _policy: &Policy) -> Vec<CandidateSpan> {
        let map = CharMap::build(text);
        let mut out = Vec::new();
        for (re, confidence) in URL_PATTERNS.iter() {
            push_matches(text, &map, re, Category::Url, self.filter_id(), *confidence, &mut out);
        }
        out
    }
}
