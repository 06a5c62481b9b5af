//! Policy configuration (spec.md §3, §6).

use crate::document::PurposeOfUse;
use crate::span::Category;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaceholderStyle {
    #[serde(rename = "[CATEGORY]")]
    Brackets,
    #[serde(rename = "{{CATEGORY}}")]
    DoubleBrace,
    #[serde(rename = "***REDACTED***")]
    Redacted,
}

impl Default for PlaceholderStyle {
    fn default() -> Self {
        PlaceholderStyle::Brackets
    }
}

impl PlaceholderStyle {
    /// Render the placeholder text for a category. When
    /// `preserve_length` is set, pad with `-` to roughly match the
    /// original span length (spec.md §9 Open Question: left as a policy
    /// option, default left to the implementer — we default to off).
    pub fn render(self, category: Category, original_len: usize, preserve_length: bool) -> String {
        let base = match self {
            PlaceholderStyle::Brackets => format!("[{}]", category.tag()),
            PlaceholderStyle::DoubleBrace => format!("{{{{{}}}}}", category.tag()),
            PlaceholderStyle::Redacted => "***REDACTED***".to_string(),
        };
        if preserve_length && original_len > base.chars().count() {
            let pad = original_len - base.chars().count();
            format!("{}{}", base, "-".repeat(pad))
        } else {
            base
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default = "default_identifiers")]
    pub identifiers: HashMap<Category, bool>,
    #[serde(default)]
    pub purpose_of_use: PurposeOfUse,
    #[serde(default)]
    pub placeholder_style: PlaceholderStyle,
    #[serde(default)]
    pub min_confidence: f64,
    #[serde(default = "default_true")]
    pub preserve_vocabulary: bool,
    #[serde(default)]
    pub preserve_length: bool,
}

fn default_true() -> bool {
    true
}

fn default_identifiers() -> HashMap<Category, bool> {
    use Category::*;
    [
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
    ]
    .into_iter()
    .map(|c| (c, true))
    .collect()
}

impl Default for Policy {
    fn default() -> Self {
        Policy {
            identifiers: default_identifiers(),
            purpose_of_use: PurposeOfUse::Treatment,
            placeholder_style: PlaceholderStyle::Brackets,
            min_confidence: 0.0,
            preserve_vocabulary: true,
            preserve_length: false,
        }
    }
}

impl Policy {
    pub fn is_enabled(&self, category: Category) -> bool {
        *self.identifiers.get(&category).unwrap_or(&true)
    }

    /// Load a policy from a JSON file; unknown fields error, missing
    /// fields fall back to defaults (spec.md §7 ConfigurationError:
    /// "missing file -> treat as empty").
    pub fn from_json_str(s: &str) -> Result<Policy, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
