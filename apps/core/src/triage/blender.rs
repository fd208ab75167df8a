//! Decision blending.
//!
//! Combines the classifier's prediction with the best symptom pattern. The
//! branches are mutually exclusive and checked in a fixed order; the first
//! one that applies decides the outcome.

use serde::{Deserialize, Serialize};

use super::classifier::CalibratedPrediction;
use super::patterns::{PatternMatch, Severity};

/// Below this classifier confidence a matching pattern takes over
pub const OVERRIDE_THRESHOLD: f64 = 0.75;
/// Confidence reported for a pattern-driven condition
pub const OVERRIDE_CONFIDENCE: f64 = 0.75;
/// Applied to classifier confidence when travel context reinforces a pattern
pub const TRAVEL_DAMPING: f64 = 0.9;
const MAX_ALTERNATIVES: usize = 2;

/// Labels the classifier emits too readily to trust when a pattern disagrees
const GENERIC_LABELS: &[&str] = &[
    "Fever",
    "Viral Fever",
    "Chest Pain",
    "Diabetes",
    "Hypertension",
    "General Condition",
    "General Symptom",
    "Allergy",
];

/// Whether any component of a (possibly compound) label is generic
pub fn is_generic_label(label: &str) -> bool {
    label
        .split('/')
        .map(str::trim)
        .any(|part| GENERIC_LABELS.iter().any(|g| g.eq_ignore_ascii_case(part)))
}

/// Which rule produced the final decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendKind {
    LowConfidenceOverride,
    TravelReinforcement,
    GenericRefinement,
    Supplemented,
    Passthrough,
}

/// Selected branch, carrying the pattern it acts on
#[derive(Debug, Clone, Copy)]
pub enum BlendBranch<'a> {
    /// Classifier unsure and a pattern matched
    LowConfidenceOverride(&'a PatternMatch),
    /// Travel context plus a pattern, regardless of confidence
    TravelReinforcement(&'a PatternMatch),
    /// Confident but generic classifier label
    GenericRefinement(&'a PatternMatch),
    /// Classifier stands, pattern contributes alternatives
    Supplemented(&'a PatternMatch),
    /// No pattern matched
    Passthrough,
}

impl BlendBranch<'_> {
    pub fn kind(&self) -> BlendKind {
        match self {
            BlendBranch::LowConfidenceOverride(_) => BlendKind::LowConfidenceOverride,
            BlendBranch::TravelReinforcement(_) => BlendKind::TravelReinforcement,
            BlendBranch::GenericRefinement(_) => BlendKind::GenericRefinement,
            BlendBranch::Supplemented(_) => BlendKind::Supplemented,
            BlendBranch::Passthrough => BlendKind::Passthrough,
        }
    }
}

/// Picks the branch. Order of the arms is the precedence order.
pub fn select_branch<'a>(
    prediction: &CalibratedPrediction,
    pattern: Option<&'a PatternMatch>,
    travel_context: bool,
) -> BlendBranch<'a> {
    match pattern {
        Some(m) if prediction.confidence < OVERRIDE_THRESHOLD => BlendBranch::LowConfidenceOverride(m),
        Some(m) if travel_context => BlendBranch::TravelReinforcement(m),
        Some(m) if is_generic_label(&prediction.label) => BlendBranch::GenericRefinement(m),
        Some(m) => BlendBranch::Supplemented(m),
        None => BlendBranch::Passthrough,
    }
}

/// Outcome of blending, before recommendations are attached
#[derive(Debug, Clone, PartialEq)]
pub struct BlendedDecision {
    pub kind: BlendKind,
    pub condition: String,
    pub confidence: f64,
    pub alternatives: Vec<String>,
    pub severity: Severity,
    pub clarification_needed: bool,
    pub clarifying_question: Option<String>,
    pub pattern_overrode: bool,
    pub pattern_name: Option<String>,
    pub rationale: String,
}

/// Applies the selected branch to produce one decision.
pub fn blend(
    prediction: &CalibratedPrediction,
    pattern: Option<&PatternMatch>,
    travel_context: bool,
) -> BlendedDecision {
    let branch = select_branch(prediction, pattern, travel_context);
    let kind = branch.kind();

    match branch {
        BlendBranch::LowConfidenceOverride(m) => BlendedDecision {
            kind,
            condition: m.top_candidate().to_string(),
            confidence: OVERRIDE_CONFIDENCE,
            alternatives: m.remaining_candidates(MAX_ALTERNATIVES),
            severity: m.pattern.severity,
            clarification_needed: true,
            clarifying_question: Some(m.pattern.question.to_string()),
            pattern_overrode: true,
            pattern_name: Some(m.pattern.name.to_string()),
            rationale: format!(
                "Classifier was unsure ({:.0}% for {}); symptoms match the {} pattern ({} keyword(s))",
                prediction.confidence * 100.0,
                prediction.label,
                m.pattern.name,
                m.match_count
            ),
        },
        BlendBranch::TravelReinforcement(m) => BlendedDecision {
            kind,
            condition: m.top_candidate().to_string(),
            confidence: OVERRIDE_CONFIDENCE.max(prediction.confidence * TRAVEL_DAMPING),
            alternatives: m.remaining_candidates(MAX_ALTERNATIVES),
            severity: m.pattern.severity,
            clarification_needed: false,
            clarifying_question: None,
            pattern_overrode: true,
            pattern_name: Some(m.pattern.name.to_string()),
            rationale: format!(
                "Recent travel with symptoms matching the {} pattern ({} keyword(s))",
                m.pattern.name, m.match_count
            ),
        },
        BlendBranch::GenericRefinement(m) => BlendedDecision {
            kind,
            condition: m.top_candidate().to_string(),
            confidence: OVERRIDE_CONFIDENCE,
            alternatives: m.remaining_candidates(MAX_ALTERNATIVES),
            severity: m.pattern.severity,
            clarification_needed: true,
            clarifying_question: Some(m.pattern.question.to_string()),
            pattern_overrode: true,
            pattern_name: Some(m.pattern.name.to_string()),
            rationale: format!(
                "'{}' is too general; the {} pattern ({} keyword(s)) is more specific",
                prediction.label, m.pattern.name, m.match_count
            ),
        },
        BlendBranch::Supplemented(m) => BlendedDecision {
            kind,
            condition: prediction.label.clone(),
            confidence: prediction.confidence,
            alternatives: m
                .pattern
                .candidates
                .iter()
                .filter(|c| !c.eq_ignore_ascii_case(&prediction.label))
                .take(MAX_ALTERNATIVES)
                .map(|c| c.to_string())
                .collect(),
            severity: m.pattern.severity,
            clarification_needed: false,
            clarifying_question: None,
            pattern_overrode: false,
            pattern_name: Some(m.pattern.name.to_string()),
            rationale: format!(
                "Classifier is confident ({:.0}%); the {} pattern adds alternatives",
                prediction.confidence * 100.0,
                m.pattern.name
            ),
        },
        BlendBranch::Passthrough => BlendedDecision {
            kind,
            condition: prediction.label.clone(),
            confidence: prediction.confidence,
            alternatives: prediction.runners_up(MAX_ALTERNATIVES),
            severity: Severity::Unknown,
            clarification_needed: false,
            clarifying_question: None,
            pattern_overrode: false,
            pattern_name: None,
            rationale: format!(
                "Classifier prediction ({:.0}%); no symptom pattern matched",
                prediction.confidence * 100.0
            ),
        },
    }
}
