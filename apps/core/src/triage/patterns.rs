//! Symptom pattern matching.
//!
//! A fixed, ordered catalog of symptom clusters is checked against the
//! lowercase input by substring containment. The pattern with the most
//! keyword hits wins; on a tie the earlier pattern in the catalog wins, so
//! the catalog order is significant and localized complaints come before
//! generic ones.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Clinical severity attached to a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Moderate,
    Low,
    /// No pattern matched
    Unknown,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Moderate => "moderate",
            Severity::Low => "low",
            Severity::Unknown => "unknown",
        };
        write!(f, "{}", label)
    }
}

/// A named symptom cluster with its candidate conditions
#[derive(Debug, PartialEq)]
pub struct SymptomPattern {
    pub name: &'static str,
    /// 1 = checked first
    pub priority: u8,
    pub keywords: &'static [&'static str],
    /// Most likely first
    pub candidates: &'static [&'static str],
    pub severity: Severity,
    pub question: &'static str,
}

/// Catalog in priority order
pub static SYMPTOM_PATTERNS: &[SymptomPattern] = &[
    SymptomPattern {
        name: "joint_pain",
        priority: 1,
        keywords: &["joint", "knee", "swollen", "stiffness", "arthritis", "elbow", "wrist", "ankle"],
        candidates: &["Arthritis", "Osteoarthritis", "Gout"],
        severity: Severity::Moderate,
        question: "Which joints are affected, and are they swollen or stiff in the morning?",
    },
    SymptomPattern {
        name: "back_pain",
        priority: 2,
        keywords: &["back pain", "lower back", "backache", "spine", "sciatica", "slipped disc"],
        candidates: &["Back Pain", "Muscle Strain", "Sciatica"],
        severity: Severity::Moderate,
        question: "Did the pain start after lifting or an injury, and does it travel down a leg?",
    },
    SymptomPattern {
        name: "menstrual",
        priority: 3,
        keywords: &["period", "menstrua", "cramps", "pelvic", "missed cycle", "irregular cycle"],
        candidates: &["Dysmenorrhea", "PCOS", "Endometriosis"],
        severity: Severity::Moderate,
        question: "How regular is your cycle, and how heavy is the bleeding?",
    },
    SymptomPattern {
        name: "urinary",
        priority: 4,
        keywords: &["urin", "burning sensation", "bladder", "kidney", "peeing", "flank"],
        candidates: &["Urinary Tract Infection", "Kidney Stones", "Cystitis"],
        severity: Severity::Moderate,
        question: "Is there burning when passing urine, blood in the urine, or pain in your side?",
    },
    SymptomPattern {
        name: "skin",
        priority: 5,
        keywords: &["rash", "itch", "hives", "skin", "blister", "red spots", "sores"],
        candidates: &["Allergic Reaction", "Fungal Infection", "Impetigo"],
        severity: Severity::Low,
        question: "Where is the rash, is it spreading, and did you use any new product or food?",
    },
    SymptomPattern {
        name: "headache",
        priority: 6,
        keywords: &["headache", "migraine", "head pain", "head hurts", "throbbing", "light sensitivity"],
        candidates: &["Migraine", "Tension Headache", "Sinusitis"],
        severity: Severity::Moderate,
        question: "Is the headache one-sided or throbbing, and does light or noise make it worse?",
    },
    SymptomPattern {
        name: "asthma",
        priority: 7,
        keywords: &["wheez", "asthma", "inhaler", "tight chest", "chest tightness", "short of breath"],
        candidates: &["Asthma", "Bronchitis", "Allergic Reaction"],
        severity: Severity::High,
        question: "Do you hear wheezing, and is it worse at night or after exercise?",
    },
    SymptomPattern {
        name: "respiratory",
        priority: 8,
        keywords: &["cough", "throat", "respiratory", "breathing", "chest", "phlegm"],
        candidates: &["Bronchitis", "Pneumonia", "Tuberculosis", "Asthma"],
        severity: Severity::Moderate,
        question: "Are you coughing up phlegm, and do you have a high fever or shortness of breath?",
    },
    SymptomPattern {
        name: "cough_cold",
        priority: 9,
        keywords: &["cold", "runny nose", "sneez", "blocked nose", "stuffy nose", "congestion", "sore throat"],
        candidates: &["Common Cold", "Influenza", "Sinusitis"],
        severity: Severity::Low,
        question: "Do you have a fever or body aches along with the cold symptoms?",
    },
    SymptomPattern {
        name: "traveller_diarrhea",
        priority: 10,
        keywords: &["diarrhea", "loose motion", "loose stool", "toilet", "bathroom", "watery stool"],
        candidates: &["Traveller's Diarrhea", "Gastroenteritis", "Typhoid"],
        severity: Severity::High,
        question: "How many times a day, and is there blood or mucus in the stool?",
    },
    SymptomPattern {
        name: "digestive_issues",
        priority: 11,
        keywords: &["stomach", "abdominal", "acidity", "heartburn", "bloat", "indigestion", "gastric"],
        candidates: &["Gastroenteritis", "GERD", "Peptic Ulcer"],
        severity: Severity::Moderate,
        question: "Is the discomfort burning, cramping or bloating, and is it linked to meals?",
    },
    SymptomPattern {
        name: "food_poisoning",
        priority: 12,
        keywords: &["food", "ate something", "vomit", "nausea", "street food", "undercooked"],
        candidates: &["Food Poisoning", "Gastroenteritis", "Typhoid"],
        severity: Severity::High,
        question: "When did you eat the suspected food, and did anyone who shared it fall ill?",
    },
    SymptomPattern {
        name: "malaria_dengue",
        priority: 13,
        keywords: &["fever", "chills", "sweating", "shivering", "mosquito", "high temperature"],
        candidates: &["Malaria", "Dengue", "Typhoid", "Typhus"],
        severity: Severity::Critical,
        question: "Is the fever cyclical with chills, and have you been bitten by mosquitoes recently?",
    },
    SymptomPattern {
        name: "body_ache",
        priority: 14,
        keywords: &["body ache", "aching", "muscle pain", "muscle ache", "sore muscles", "body pain"],
        candidates: &["Influenza", "Viral Fever", "Muscle Strain"],
        severity: Severity::Moderate,
        question: "Is the aching all over, and do you also have a fever or chills?",
    },
    SymptomPattern {
        name: "general_malaise",
        priority: 15,
        keywords: &[
            "feel weird",
            "feeling weird",
            "not feeling",
            "not well",
            "unwell",
            "tired",
            "weak",
            "exhausted",
            "fatigue",
        ],
        candidates: &["Typhoid", "Malaria", "Dengue", "Tuberculosis"],
        severity: Severity::High,
        question: "Do you have a fever, headache, body aches, nausea or a cough, and when did it start?",
    },
];

/// Phrases indicating recent travel
const TRAVEL_PHRASES: &[&str] = &[
    "travel",
    "trip",
    "trek",
    "vacation",
    "holiday",
    "abroad",
    "flight",
    "came back from",
    "coming back from",
    "returned from",
    "tour",
];

/// Best pattern for one input
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch {
    pub pattern: &'static SymptomPattern,
    pub match_count: usize,
    pub matched_keywords: Vec<&'static str>,
}

impl PatternMatch {
    pub fn top_candidate(&self) -> &'static str {
        self.pattern.candidates.first().copied().unwrap_or_default()
    }

    /// Candidates after the top one, at most `limit`
    pub fn remaining_candidates(&self, limit: usize) -> Vec<String> {
        self.pattern
            .candidates
            .iter()
            .skip(1)
            .take(limit)
            .map(|c| c.to_string())
            .collect()
    }
}

/// Read-only matcher over a pattern catalog
#[derive(Debug, Clone, Copy)]
pub struct PatternMatcher {
    patterns: &'static [SymptomPattern],
}

impl Default for PatternMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternMatcher {
    pub fn new() -> Self {
        Self {
            patterns: SYMPTOM_PATTERNS,
        }
    }

    pub fn with_patterns(patterns: &'static [SymptomPattern]) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &'static [SymptomPattern] {
        self.patterns
    }

    /// Pattern with the highest keyword hit count. Only a strictly higher
    /// count displaces the current best, so ties go to the earlier pattern.
    pub fn best_match(&self, text: &str) -> Option<PatternMatch> {
        let text = text.to_lowercase();
        let mut best: Option<PatternMatch> = None;

        for pattern in self.patterns {
            let matched: Vec<&'static str> = pattern
                .keywords
                .iter()
                .copied()
                .filter(|keyword| text.contains(keyword))
                .collect();

            let current = best.as_ref().map_or(0, |b| b.match_count);
            if matched.len() > current {
                best = Some(PatternMatch {
                    pattern,
                    match_count: matched.len(),
                    matched_keywords: matched,
                });
            }
        }

        best
    }

    /// Whether the text mentions recent travel. Independent of pattern
    /// selection.
    pub fn detects_travel(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        TRAVEL_PHRASES.iter().any(|phrase| text.contains(phrase))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn best_name(text: &str) -> Option<&'static str> {
        PatternMatcher::new().best_match(text).map(|m| m.pattern.name)
    }

    #[test]
    fn test_catalog_priorities_are_ordered() {
        let priorities: Vec<u8> = SYMPTOM_PATTERNS.iter().map(|p| p.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort_unstable();
        assert_eq!(priorities, sorted);
        assert_eq!(SYMPTOM_PATTERNS.first().map(|p| p.name), Some("joint_pain"));
        assert_eq!(SYMPTOM_PATTERNS.last().map(|p| p.name), Some("general_malaise"));
        assert!(SYMPTOM_PATTERNS.iter().all(|p| !p.candidates.is_empty()));
    }

    #[test]
    fn test_pattern_detection() {
        let cases = [
            ("My knee joint is swollen", "joint_pain"),
            ("sharp lower back pain since monday", "back_pain"),
            ("wheezing and I need my inhaler", "asthma"),
            ("runny nose and sneezing", "cough_cold"),
            ("loose motion, running to the toilet", "traveller_diarrhea"),
            ("chills and sweating every evening", "malaria_dengue"),
            ("I feel weird", "general_malaise"),
        ];
        for (text, expected) in cases {
            assert_eq!(best_name(text), Some(expected), "Expected {} for '{}'", expected, text);
        }
    }

    #[test]
    fn test_higher_count_beats_priority() {
        // one joint keyword vs three malaise keywords
        let m = PatternMatcher::new()
            .best_match("tired, weak and exhausted, my wrist too")
            .expect("should match");
        assert_eq!(m.pattern.name, "general_malaise");
        assert_eq!(m.match_count, 3);
    }

    #[test]
    fn test_tie_goes_to_earlier_pattern() {
        // "knee" (joint_pain) and "tired" (general_malaise): one hit each
        assert_eq!(best_name("knee hurts and tired"), Some("joint_pain"));
    }

    #[test]
    fn test_substring_matching() {
        // "urin" matches inside "urinating"
        assert_eq!(best_name("Burning when URINATING"), Some("urinary"));
    }

    #[test]
    fn test_no_match() {
        assert!(PatternMatcher::new().best_match("hello there").is_none());
        assert!(PatternMatcher::new().best_match("").is_none());
    }

    #[test]
    fn test_travel_detection() {
        let matcher = PatternMatcher::new();
        assert!(matcher.detects_travel("I have been travelling for a long time"));
        assert!(matcher.detects_travel("Just came back from Kenya"));
        assert!(!matcher.detects_travel("stomach ache since yesterday"));
    }

    #[test]
    fn test_remaining_candidates() {
        let m = PatternMatcher::new().best_match("I feel weird").expect("should match");
        assert_eq!(m.top_candidate(), "Typhoid");
        assert_eq!(m.remaining_candidates(2), vec!["Malaria", "Dengue"]);
    }
}
