//! Span data model (spec.md §3): CandidateSpan, ScoredSpan, Redaction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The 18 HIPAA Safe Harbor identifier categories (spec.md §6), plus the
/// sentinel used internally when a filter declares no specific category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Name,
    Date,
    Ssn,
    Phone,
    Fax,
    Email,
    Address,
    Zipcode,
    Mrn,
    AccountNumber,
    HealthPlanId,
    CreditCard,
    Ip,
    Url,
    Vin,
    LicensePlate,
    Age90Plus,
    Npi,
    Dea,
    Biometric,
    DeviceId,
    Other,
}

impl Category {
    /// Placeholder tag text, e.g. `NAME`, used in `[CATEGORY]`-style
    /// replacement strings (spec.md §6).
    pub fn tag(self) -> &'static str {
        match self {
            Category::Name => "NAME",
            Category::Date => "DATE",
            Category::Ssn => "SSN",
            Category::Phone => "PHONE",
            Category::Fax => "FAX",
            Category::Email => "EMAIL",
            Category::Address => "ADDRESS",
            Category::Zipcode => "ZIPCODE",
            Category::Mrn => "MRN",
            Category::AccountNumber => "ACCOUNT_NUMBER",
            Category::HealthPlanId => "HEALTH_PLAN_ID",
            Category::CreditCard => "CREDIT_CARD",
            Category::Ip => "IP",
            Category::Url => "URL",
            Category::Vin => "VIN",
            Category::LicensePlate => "LICENSE_PLATE",
            Category::Age90Plus => "AGE_90_PLUS",
            Category::Npi => "NPI",
            Category::Dea => "DEA",
            Category::Biometric => "BIOMETRIC",
            Category::DeviceId => "DEVICE_ID",
            Category::Other => "OTHER",
        }
    }

    /// Specificity ranking used by the conflict resolver (spec.md §4.F
    /// rule 2), ported from the teacher's `get_type_specificity` table in
    /// `interval.rs`/`span.rs`. Higher is more specific/trustworthy.
    pub fn specificity(self) -> u32 {
        match self {
            Category::Ssn => 100,
            Category::Mrn => 95,
            Category::CreditCard => 90,
            Category::AccountNumber | Category::HealthPlanId | Category::LicensePlate => 85,
            Category::Email => 80,
            Category::Phone | Category::Fax | Category::Ip | Category::Url => 75,
            Category::Npi | Category::Dea => 78,
            Category::Vin | Category::DeviceId | Category::Biometric => 70,
            Category::Date => 60,
            Category::Zipcode => 55,
            Category::Address => 50,
            Category::Age90Plus => 40,
            Category::Name => 35,
            Category::Other => 20,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A half-open `[start, end)` code-point range over the source document
/// that a filter believes might be PHI (spec.md §3).
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSpan {
    pub start: usize,
    pub end: usize,
    pub category: Category,
    pub surface_text: String,
    pub filter_id: String,
    pub raw_score: f64,
}

impl CandidateSpan {
    pub fn new(
        start: usize,
        end: usize,
        category: Category,
        surface_text: impl Into<String>,
        filter_id: impl Into<String>,
        raw_score: f64,
    ) -> Self {
        CandidateSpan {
            start,
            end,
            category,
            surface_text: surface_text.into(),
            filter_id: filter_id.into(),
            raw_score: raw_score.clamp(0.0, 1.0),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn overlaps(&self, other: &CandidateSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, other: &CandidateSpan) -> bool {
        self.start <= other.start && self.end >= other.end
    }
}

/// A single scoring adjustment applied by the context scorer (spec.md
/// §4.D: "The scorer records every adjustment for diagnostic output").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSignal {
    pub source: &'static str,
    pub delta: f64,
    pub reason: String,
}

/// `CandidateSpan` plus the confidence/threshold/signal trail attached by
/// the context scorer and threshold service (spec.md §3).
#[derive(Debug, Clone)]
pub struct ScoredSpan {
    pub span: CandidateSpan,
    pub confidence: f64,
    pub threshold: f64,
    pub context_signals: Vec<ContextSignal>,
}

impl ScoredSpan {
    pub fn passes(&self) -> bool {
        self.confidence >= self.threshold
    }
}

/// A surviving, non-overlapping redaction (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Redaction {
    pub start: usize,
    pub end: usize,
    pub category: Category,
    pub replacement: String,
    pub original_length: usize,
    pub confidence: f64,
}
