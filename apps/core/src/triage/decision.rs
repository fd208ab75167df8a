//! Decision Result - Output structures of one triage evaluation.
//!
//! Everything here is built once per request and never mutated afterwards.
//! No timestamps are recorded so that identical input against the same model
//! yields an identical evaluation.

use serde::{Deserialize, Serialize};

use super::blender::{BlendKind, BlendedDecision};
use super::patterns::Severity;
use super::recommendations::RecommendationSet;
use super::resolver::Resolution;
use super::safety::EmergencyCategory;

/// Overall outcome of the safety gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Emergency phrase detected; nothing else was run
    Emergency,
    Normal,
}

/// Kind of advisory attached to an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryKind {
    Emergency,
    LowConfidence,
    Interaction,
    Disclaimer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub kind: AdvisoryKind,
    pub message: String,
}

impl Advisory {
    pub fn new(kind: AdvisoryKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Final condition decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    /// Primary condition (may be compound, e.g. "A / B")
    pub condition: String,

    /// Confidence score (0.0 - 1.0)
    pub confidence: f64,

    /// Up to two alternative conditions
    pub alternatives: Vec<String>,

    pub severity: Severity,

    /// User should be asked `clarifying_question`
    pub clarification_needed: bool,

    pub clarifying_question: Option<String>,

    /// A symptom pattern replaced the classifier's label
    pub pattern_overrode: bool,

    /// Pattern that matched, if any
    pub pattern_name: Option<String>,

    /// Blending rule that produced this decision
    pub branch: BlendKind,

    pub rationale: String,
}

impl From<BlendedDecision> for DecisionResult {
    fn from(blended: BlendedDecision) -> Self {
        Self {
            condition: blended.condition,
            confidence: blended.confidence.clamp(0.0, 1.0),
            alternatives: blended.alternatives,
            severity: blended.severity,
            clarification_needed: blended.clarification_needed,
            clarifying_question: blended.clarifying_question,
            pattern_overrode: blended.pattern_overrode,
            pattern_name: blended.pattern_name,
            branch: blended.kind,
            rationale: blended.rationale,
        }
    }
}

/// Everything `evaluate` returns for one input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub verdict: Verdict,

    /// Absent for emergencies
    pub decision: Option<DecisionResult>,

    /// How the decided condition mapped to store keys
    pub resolution: Option<Resolution>,

    pub recommendations: Option<RecommendationSet>,

    /// Emergency categories that fired (empty for normal verdicts)
    pub emergency_categories: Vec<EmergencyCategory>,

    pub advisories: Vec<Advisory>,

    /// Model that produced the decision
    pub model_id: Option<String>,
}

impl Evaluation {
    /// Short-circuit result for an emergency
    pub fn emergency(categories: Vec<EmergencyCategory>, advisory: Advisory) -> Self {
        Self {
            verdict: Verdict::Emergency,
            decision: None,
            resolution: None,
            recommendations: None,
            emergency_categories: categories,
            advisories: vec![advisory],
            model_id: None,
        }
    }

    pub fn is_emergency(&self) -> bool {
        self.verdict == Verdict::Emergency
    }

    pub fn has_advisory(&self, kind: AdvisoryKind) -> bool {
        self.advisories.iter().any(|a| a.kind == kind)
    }

    /// One-line summary for logs; contains no input text
    pub fn summary(&self) -> String {
        match &self.decision {
            Some(decision) => format!(
                "Verdict: {:?}, Condition: {} ({:.0}%), Branch: {:?}, Advisories: {}",
                self.verdict,
                decision.condition,
                decision.confidence * 100.0,
                decision.branch,
                self.advisories.len()
            ),
            None => format!(
                "Verdict: {:?}, Categories: {:?}",
                self.verdict, self.emergency_categories
            ),
        }
    }
}
