//! # Triage Module
//!
//! Maps a free-text symptom description to a condition decision with
//! herbal and pharmaceutical recommendations, gated by safety checks.
//!
//! ## Components
//! - `features`: text normalization and TF-IDF features
//! - `classifier`: softmax model with per-label calibration
//! - `calibration`: Platt sigmoids, stratified folds, reliability report
//! - `training`: offline training into a model artifact
//! - `patterns`: keyword symptom patterns and travel context
//! - `blender`: combines classifier and pattern into one decision
//! - `resolver`: compound labels and aliases to store keys
//! - `recommendations`: curated store with heuristic and generic fallback
//! - `catalog`: built-in aliases, stores and interactions
//! - `safety`: emergency pre-check and advisory post-checks
//! - `decision`: output structures
//! - `pipeline`: main orchestrator

pub mod blender;
pub mod calibration;
pub mod catalog;
pub mod classifier;
pub mod decision;
pub mod features;
pub mod patterns;
pub mod pipeline;
pub mod recommendations;
pub mod resolver;
pub mod safety;
pub mod training;

pub use blender::{blend, BlendKind, BlendedDecision};
pub use calibration::{reliability_report, PlattCalibrator, ReliabilityReport};
pub use catalog::StoreCatalog;
pub use classifier::{CalibratedClassifier, CalibratedPrediction, LabelProbability, SymptomClassifier};
pub use decision::{Advisory, AdvisoryKind, DecisionResult, Evaluation, Verdict};
pub use features::FeatureExtractor;
pub use patterns::{PatternMatch, PatternMatcher, Severity};
pub use pipeline::TriagePipeline;
pub use recommendations::{Availability, RecommendationSet, RecommendationStore};
pub use resolver::{ConditionResolver, Resolution};
pub use safety::{EmergencyCategory, SafetyGate};
pub use training::train;
