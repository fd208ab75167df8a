//! Calibrated multi-class text classifier.
//!
//! A softmax logistic model produces one raw probability per label; per-label
//! Platt sigmoids turn those into calibrated probabilities that are then
//! renormalized into a distribution.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use super::calibration::PlattCalibrator;
use super::features::{FeatureExtractor, FeatureVector};
use crate::artifact::ModelArtifact;
use crate::error::PipelineError;

/// Seam between the pipeline and whatever produces predictions
pub trait SymptomClassifier: Send + Sync {
    /// Top label plus the full calibrated distribution
    fn predict(&self, text: &str) -> Result<CalibratedPrediction, PipelineError>;

    /// Closed label vocabulary, in model order
    fn labels(&self) -> &[String];

    /// Identifier of the loaded model, reported with every evaluation
    fn model_id(&self) -> String;
}

/// One entry of a calibrated distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelProbability {
    pub label: String,
    pub probability: f64,
}

/// Classifier output for one input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibratedPrediction {
    /// Most probable label
    pub label: String,
    /// Calibrated probability of `label` (0.0 - 1.0)
    pub confidence: f64,
    /// All labels, most probable first; sums to 1.0
    pub distribution: Vec<LabelProbability>,
}

impl CalibratedPrediction {
    /// Builds a prediction from unnormalized per-label scores.
    pub fn from_scores(labels: &[String], scores: &[f64]) -> Self {
        let total: f64 = scores.iter().sum();
        let uniform = 1.0 / labels.len().max(1) as f64;

        let mut distribution: Vec<LabelProbability> = labels
            .iter()
            .zip(scores)
            .map(|(label, &score)| LabelProbability {
                label: label.clone(),
                probability: if total > 0.0 { score / total } else { uniform },
            })
            .collect();
        // stable: equal probabilities keep model order
        distribution.sort_by(|a, b| b.probability.total_cmp(&a.probability));

        let (label, confidence) = distribution
            .first()
            .map(|top| (top.label.clone(), top.probability))
            .unwrap_or_default();

        Self {
            label,
            confidence,
            distribution,
        }
    }

    /// Labels ranked after the top one
    pub fn runners_up(&self, count: usize) -> Vec<String> {
        self.distribution
            .iter()
            .skip(1)
            .take(count)
            .map(|entry| entry.label.clone())
            .collect()
    }
}

/// Multinomial logistic regression over sparse features
#[derive(Debug, Clone)]
pub struct LogisticModel {
    /// labels x features
    pub(crate) weights: Vec<Vec<f64>>,
    pub(crate) bias: Vec<f64>,
}

impl LogisticModel {
    pub fn new(weights: Vec<Vec<f64>>, bias: Vec<f64>) -> Self {
        Self { weights, bias }
    }

    pub fn zeros(labels: usize, features: usize) -> Self {
        Self {
            weights: vec![vec![0.0; features]; labels],
            bias: vec![0.0; labels],
        }
    }

    pub fn num_labels(&self) -> usize {
        self.bias.len()
    }

    /// Linear score per label
    pub fn logits(&self, x: &FeatureVector) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, bias)| x.dot(row) + bias)
            .collect()
    }

    /// Softmax over the logits
    pub fn probabilities(&self, x: &FeatureVector) -> Vec<f64> {
        softmax(&self.logits(x))
    }
}

pub(crate) fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Trained classifier loaded from a [`ModelArtifact`]
#[derive(Debug, Clone)]
pub struct CalibratedClassifier {
    id: Uuid,
    labels: Vec<String>,
    extractor: FeatureExtractor,
    model: LogisticModel,
    calibrators: Vec<PlattCalibrator>,
}

impl CalibratedClassifier {
    /// Builds the classifier, rejecting artifacts whose parts disagree on
    /// label count or feature dimensionality.
    pub fn from_artifact(artifact: &ModelArtifact) -> Result<Self, PipelineError> {
        artifact.validate()?;
        let extractor = FeatureExtractor::from_parts(
            artifact.vocabulary.clone(),
            artifact.idf.clone(),
            artifact.ngram_max,
        )?;

        debug!(
            "Classifier {} has {} labels over {} features",
            artifact.id,
            artifact.labels.len(),
            extractor.dim()
        );

        Ok(Self {
            id: artifact.id,
            labels: artifact.labels.clone(),
            extractor,
            model: LogisticModel::new(artifact.weights.clone(), artifact.bias.clone()),
            calibrators: artifact.calibrators.clone(),
        })
    }

    /// Reads and validates an artifact from disk.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let artifact = ModelArtifact::load(path)?;
        let classifier = Self::from_artifact(&artifact)?;
        info!(
            "Loaded model {} ({} labels) from {}",
            classifier.id,
            classifier.labels.len(),
            path.display()
        );
        Ok(classifier)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Uncalibrated softmax distribution, in model label order
    pub fn raw_probabilities(&self, text: &str) -> Vec<f64> {
        self.model.probabilities(&self.extractor.transform(text))
    }
}

impl SymptomClassifier for CalibratedClassifier {
    fn predict(&self, text: &str) -> Result<CalibratedPrediction, PipelineError> {
        let features = self.extractor.transform(text);
        let raw = self.model.probabilities(&features);
        let calibrated: Vec<f64> = raw
            .iter()
            .zip(&self.calibrators)
            .map(|(&score, calibrator)| calibrator.apply(score))
            .collect();

        Ok(CalibratedPrediction::from_scores(&self.labels, &calibrated))
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn model_id(&self) -> String {
        self.id.to_string()
    }
}
