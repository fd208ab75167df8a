//! Safety gate.
//!
//! The pre-check scans raw input for emergency phrasing before anything else
//! runs. The post-checks only annotate a finished result: low confidence,
//! known interactions between recommended items, and the disclaimer.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::decision::{Advisory, AdvisoryKind};
use super::recommendations::RecommendationSet;

/// Below this final confidence a low-confidence advisory is attached
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.45;

pub const EMERGENCY_MESSAGE: &str = "MEDICAL EMERGENCY: your description matches symptoms that \
need immediate care. Call your local emergency number or go to the nearest emergency department \
now. Do not wait for online advice.";

pub const MEDICAL_DISCLAIMER: &str = "This is an informational tool only and does not replace \
professional medical advice, diagnosis or treatment. Herbal remedies can interact with \
medications. If symptoms persist or worsen, seek medical care.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyCategory {
    Cardiac,
    Respiratory,
    Neurological,
    Hemorrhagic,
    PsychiatricCrisis,
    Anaphylactic,
    Trauma,
    Gastrointestinal,
}

// NOTE: expect() is acceptable here, the patterns are compile-time constants
static EMERGENCY_PATTERNS: LazyLock<Vec<(EmergencyCategory, Regex)>> = LazyLock::new(|| {
    let rules: &[(EmergencyCategory, &str)] = &[
        // bare "chest pain" needs an intensity or onset qualifier
        (EmergencyCategory::Cardiac, r"(?i)\b(severe|crushing|sudden|radiating)\s+chest\s+pain\b"),
        (EmergencyCategory::Cardiac, r"(?i)\bheart\s+attack\b|\bcardiac\s+arrest\b"),
        (EmergencyCategory::Cardiac, r"(?i)\bchest\s+pressure\b|\bheart\s+feels\s+like\b"),
        (EmergencyCategory::Respiratory, r"(?i)\b(can[’']?t|cannot|unable\s+to)\s+breathe\b"),
        (EmergencyCategory::Respiratory, r"(?i)\bdifficulty\s+breathing\b|\bgasping\s+for\s+(air|breath)\b"),
        (EmergencyCategory::Respiratory, r"(?i)\bchoking\b|\b(lips|face)\s+turning\s+blue\b"),
        (EmergencyCategory::Neurological, r"(?i)\bstroke\b|\bseizures?\b|\bconvulsions?\b"),
        (EmergencyCategory::Neurological, r"(?i)\bunconscious\b|\bloss\s+of\s+consciousness\b|\bpassed\s+out\b"),
        (EmergencyCategory::Neurological, r"(?i)\bslurred\s+speech\b|\bsudden\s+(paralysis|vision\s+loss)\b|\bnumbness\s+on\s+one\s+side\b"),
        (EmergencyCategory::Neurological, r"(?i)\bworst\s+headache\s+of\s+my\s+life\b|\bsudden\s+severe\s+headache\b"),
        (EmergencyCategory::Neurological, r"(?i)\bstiff\s+neck\s+and\s+fever\b|\bconfusion\s+and\s+fever\b"),
        (EmergencyCategory::Neurological, r"(?i)\bhead\s+injur(y|ies|ed)\b|\bsevere\s+head\s+pain\b"),
        (EmergencyCategory::Hemorrhagic, r"(?i)\b(severe|heavy|uncontrolled)\s+bleeding\b|\bbleeding\s+heavily\b"),
        (EmergencyCategory::Hemorrhagic, r"(?i)\b(coughing|vomiting)\s+(up\s+)?blood\b|\bblood\s+in\s+(my\s+)?(vomit|stool)\b"),
        (EmergencyCategory::PsychiatricCrisis, r"(?i)\bsuicid(e|al)\b|\bkill\s+myself\b|\bend\s+my\s+life\b"),
        (EmergencyCategory::PsychiatricCrisis, r"(?i)\bwant\s+to\s+die\b|\bself[\s-]?harm\b"),
        (EmergencyCategory::Anaphylactic, r"(?i)\banaphyla(xis|ctic)\b|\bsevere\s+allergic\s+reaction\b"),
        (EmergencyCategory::Anaphylactic, r"(?i)\bthroat\s+(is\s+)?closing\b|\b(tongue|lips)\s+(is\s+|are\s+)?swelling\b|\bcan[’']?t\s+swallow\b"),
        (EmergencyCategory::Trauma, r"(?i)\bsevere\s+(burns?|trauma)\b"),
        (EmergencyCategory::Gastrointestinal, r"(?i)\bsevere\s+(abdominal|stomach)\s+pain\b"),
        (EmergencyCategory::Gastrointestinal, r"(?i)\bseverely\s+dehydrated\b|\bsevere\s+dehydration\b"),
    ];
    rules
        .iter()
        .map(|(category, pattern)| {
            (*category, Regex::new(pattern).expect("Invalid regex: emergency pattern"))
        })
        .collect()
});

/// Emergency phrase found in the input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyFinding {
    pub category: EmergencyCategory,
    pub matched: String,
}

/// Known interaction between two recommendable items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub first: String,
    pub second: String,
    pub effect: String,
}

/// Stateless checks around the pipeline
#[derive(Debug, Clone, Default)]
pub struct SafetyGate {
    interactions: Vec<Interaction>,
}

impl SafetyGate {
    pub fn new(interactions: Vec<Interaction>) -> Self {
        Self { interactions }
    }

    /// Every emergency phrase in the text, in catalog order.
    pub fn pre_check(&self, text: &str) -> Vec<EmergencyFinding> {
        EMERGENCY_PATTERNS
            .iter()
            .filter_map(|(category, pattern)| {
                pattern.find(text).map(|m| EmergencyFinding {
                    category: *category,
                    matched: m.as_str().to_lowercase(),
                })
            })
            .collect()
    }

    pub fn emergency_advisory(&self) -> Advisory {
        Advisory::new(AdvisoryKind::Emergency, EMERGENCY_MESSAGE)
    }

    /// Low-confidence advisory when `confidence` is under the threshold.
    pub fn post_check(&self, confidence: f64) -> Option<Advisory> {
        (confidence < LOW_CONFIDENCE_THRESHOLD).then(|| {
            Advisory::new(
                AdvisoryKind::LowConfidence,
                format!(
                    "Confidence in this result is low ({:.0}%). The description may be too vague \
                     or match an uncommon condition; please consult a healthcare professional.",
                    confidence * 100.0
                ),
            )
        })
    }

    /// One advisory per known interaction among the recommended items.
    pub fn interaction_advisories(&self, recommendations: &RecommendationSet) -> Vec<Advisory> {
        let names: Vec<String> = recommendations
            .herbal
            .iter()
            .map(|h| h.name.to_lowercase())
            .chain(recommendations.pharmaceuticals.iter().map(|p| p.name.to_lowercase()))
            .chain(recommendations.emergency_only.iter().map(|p| p.name.to_lowercase()))
            .collect();
        let present = |item: &str| {
            let item = item.to_lowercase();
            names.iter().any(|name| name.contains(&item))
        };

        self.interactions
            .iter()
            .filter(|i| present(&i.first) && present(&i.second))
            .map(|i| {
                Advisory::new(
                    AdvisoryKind::Interaction,
                    format!("{} + {}: {}", i.first, i.second, i.effect),
                )
            })
            .collect()
    }

    pub fn disclaimer(&self) -> Advisory {
        Advisory::new(AdvisoryKind::Disclaimer, MEDICAL_DISCLAIMER)
    }
}
