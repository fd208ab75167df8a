//! Shared test fixtures.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::artifact::{LabeledDataset, LabeledExample};
use crate::config::TrainingConfig;
use crate::error::PipelineError;
use crate::triage::{
    CalibratedPrediction, LabelProbability, StoreCatalog, SymptomClassifier, TriagePipeline,
};

/// Classifier that always answers the same label with the same confidence
pub struct MockClassifier {
    id: String,
    labels: Vec<String>,
    label: String,
    confidence: f64,
    calls: AtomicUsize,
}

impl MockClassifier {
    pub fn new(label: &str, confidence: f64) -> Self {
        Self::with_id("mock", label, confidence)
    }

    pub fn with_id(id: &str, label: &str, confidence: f64) -> Self {
        let mut labels = vec![label.to_string()];
        labels.extend(
            ["Bronchitis", "GERD", "Cold"]
                .iter()
                .filter(|l| **l != label)
                .map(|l| l.to_string()),
        );
        Self {
            id: id.to_string(),
            labels,
            label: label.to_string(),
            confidence,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `predict` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SymptomClassifier for MockClassifier {
    fn predict(&self, _text: &str) -> Result<CalibratedPrediction, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let rest = (1.0 - self.confidence) / (self.labels.len() - 1) as f64;
        let distribution = self
            .labels
            .iter()
            .map(|l| LabelProbability {
                label: l.clone(),
                probability: if *l == self.label { self.confidence } else { rest },
            })
            .collect();
        Ok(CalibratedPrediction {
            label: self.label.clone(),
            confidence: self.confidence,
            distribution,
        })
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn model_id(&self) -> String {
        self.id.clone()
    }
}

/// Built-in catalog pipeline around a mock; the mock is returned for call counting
pub fn pipeline_with(label: &str, confidence: f64) -> (TriagePipeline, Arc<MockClassifier>) {
    let mock = Arc::new(MockClassifier::new(label, confidence));
    let pipeline = TriagePipeline::new(StoreCatalog::builtin()).with_classifier(mock.clone());
    (pipeline, mock)
}

/// Input that matches no symptom pattern, travel phrase or emergency phrase
pub const NEUTRAL_INPUT: &str = "something is off since yesterday evening";

/// Four well separated conditions, six descriptions each
pub fn symptom_dataset() -> LabeledDataset {
    let rows: &[(&str, &str)] = &[
        ("high fever with chills and heavy sweating", "Malaria"),
        ("fever comes and goes with shivering chills", "Malaria"),
        ("chills every evening then fever and sweating", "Malaria"),
        ("mosquito bites and now fever with chills", "Malaria"),
        ("shivering and sweating with a recurring fever", "Malaria"),
        ("fever chills sweating for three days", "Malaria"),
        ("burning in my chest after meals and sour taste", "GERD"),
        ("acid reflux and heartburn after eating", "GERD"),
        ("heartburn at night with sour burps", "GERD"),
        ("acid comes up into throat after meals", "GERD"),
        ("indigestion heartburn and bloating after food", "GERD"),
        ("sour acid taste and burning heartburn", "GERD"),
        ("runny nose sneezing and blocked nose", "Cold"),
        ("sneezing all day with runny nose", "Cold"),
        ("stuffy nose sneezing and mild sore throat", "Cold"),
        ("blocked nose and sneezing since morning", "Cold"),
        ("runny nose watery eyes and sneezing", "Cold"),
        ("nasal congestion runny nose sneezing", "Cold"),
        ("swollen knee joint with morning stiffness", "Arthritis"),
        ("stiff painful joints in hands and knees", "Arthritis"),
        ("knee joint swelling and stiffness when walking", "Arthritis"),
        ("aching swollen joints worse in the morning", "Arthritis"),
        ("joint stiffness in fingers and swollen knuckles", "Arthritis"),
        ("painful knee joint and stiffness climbing stairs", "Arthritis"),
    ];
    rows.iter()
        .map(|(text, label)| LabeledExample::new(*text, *label))
        .collect()
}

/// Small, fast configuration for tests
pub fn test_training_config() -> TrainingConfig {
    TrainingConfig {
        max_features: 2000,
        cv_folds: 3,
        epochs: 400,
        learning_rate: 1.0,
        l2: 1e-4,
        seed: 7,
        ngram_max: 2,
    }
}
