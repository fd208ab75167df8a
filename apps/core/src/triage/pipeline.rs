//! Triage Pipeline - Main orchestrator for the triage module.
//!
//! Per request:
//! 1. Safety pre-check (emergency phrasing short-circuits everything)
//! 2. Calibrated classification
//! 3. Pattern matching + travel context, blended into one decision
//! 4. Condition resolution and recommendation lookup
//! 5. Safety post-checks (low confidence, interactions, disclaimer)
//!
//! Lookup data is read-only after construction. The classifier sits in a slot that
//! can be swapped while requests are in flight; each request works against
//! the snapshot it took at the start.

use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, instrument, warn};

use super::blender::blend;
use super::catalog::StoreCatalog;
use super::classifier::{CalibratedClassifier, SymptomClassifier};
use super::decision::{DecisionResult, Evaluation, Verdict};
use super::patterns::PatternMatcher;
use super::recommendations::RecommendationStore;
use super::resolver::ConditionResolver;
use super::safety::SafetyGate;
use crate::config::PipelineConfig;
use crate::error::PipelineError;

type ModelSlot = RwLock<Option<Arc<dyn SymptomClassifier>>>;

pub struct TriagePipeline {
    model: ModelSlot,
    matcher: PatternMatcher,
    resolver: ConditionResolver,
    store: RecommendationStore,
    safety: SafetyGate,
}

impl TriagePipeline {
    /// Pipeline over `catalog` with an empty model slot
    pub fn new(catalog: StoreCatalog) -> Self {
        let (resolver, store, safety) = catalog.into_parts();
        Self {
            model: RwLock::new(None),
            matcher: PatternMatcher::new(),
            resolver,
            store,
            safety,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn SymptomClassifier>) -> Self {
        self.model = RwLock::new(Some(classifier));
        self
    }

    /// Loads stores (built-in unless `stores_path` is set) and the model artifact.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, PipelineError> {
        let catalog = match &config.stores_path {
            Some(path) => StoreCatalog::from_path(path)?,
            None => StoreCatalog::builtin(),
        };
        let classifier = CalibratedClassifier::load(&config.model_path)?;
        Ok(Self::new(catalog).with_classifier(Arc::new(classifier)))
    }

    /// Replaces the classifier and returns the previous one.
    pub fn swap_model(
        &self,
        classifier: Arc<dyn SymptomClassifier>,
    ) -> Result<Option<Arc<dyn SymptomClassifier>>, PipelineError> {
        let mut slot = self
            .model
            .write()
            .map_err(|_| PipelineError::ModelUnavailable("Model slot lock poisoned".into()))?;
        let previous = slot.replace(classifier);
        info!(
            previous = ?previous.as_ref().map(|m| m.model_id()),
            current = ?slot.as_ref().map(|m| m.model_id()),
            "Model swapped"
        );
        Ok(previous)
    }

    /// Loads an artifact from disk and swaps it in.
    pub fn reload(&self, path: &Path) -> Result<(), PipelineError> {
        let classifier = CalibratedClassifier::load(path)?;
        self.swap_model(Arc::new(classifier))?;
        Ok(())
    }

    fn snapshot(&self) -> Result<Arc<dyn SymptomClassifier>, PipelineError> {
        let slot = self
            .model
            .read()
            .map_err(|_| PipelineError::ModelUnavailable("Model slot lock poisoned".into()))?;
        slot.clone()
            .ok_or_else(|| PipelineError::ModelUnavailable("No trained model is loaded".into()))
    }

    pub fn model_id(&self) -> Option<String> {
        self.snapshot().ok().map(|m| m.model_id())
    }

    pub fn store(&self) -> &RecommendationStore {
        &self.store
    }

    pub fn resolver(&self) -> &ConditionResolver {
        &self.resolver
    }

    pub fn safety(&self) -> &SafetyGate {
        &self.safety
    }

    /// Runs one symptom description through the full pipeline.
    ///
    /// An emergency is reported as `Verdict::Emergency`, not as an error; the
    /// classifier is never consulted for such input.
    #[instrument(skip(self, text), fields(len = text.len()))]
    pub fn evaluate(&self, text: &str) -> Result<Evaluation, PipelineError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PipelineError::MalformedInput("Symptom description is empty".into()));
        }
        if !text.chars().any(char::is_alphabetic) {
            return Err(PipelineError::MalformedInput(
                "Symptom description contains no words".into(),
            ));
        }

        let findings = self.safety.pre_check(text);
        if !findings.is_empty() {
            let mut categories: Vec<_> = findings.iter().map(|f| f.category).collect();
            categories.dedup();
            warn!(?categories, "Emergency phrasing detected, classification skipped");
            return Ok(Evaluation::emergency(categories, self.safety.emergency_advisory()));
        }

        let classifier = self.snapshot()?;
        let prediction = classifier.predict(text)?;
        debug!(label = %prediction.label, confidence = prediction.confidence, "Classifier prediction");

        let pattern = self.matcher.best_match(text);
        let travel = self.matcher.detects_travel(text);
        let blended = blend(&prediction, pattern.as_ref(), travel);

        let resolution = self.resolver.resolve(&blended.condition, &self.store);
        let recommendations = self.store.recommend(&resolution, &blended.condition);
        let decision = DecisionResult::from(blended);

        let mut advisories = Vec::new();
        advisories.extend(self.safety.post_check(decision.confidence));
        advisories.extend(self.safety.interaction_advisories(&recommendations));
        advisories.push(self.safety.disclaimer());

        let evaluation = Evaluation {
            verdict: Verdict::Normal,
            decision: Some(decision),
            resolution: Some(resolution),
            recommendations: Some(recommendations),
            emergency_categories: Vec::new(),
            advisories,
            model_id: Some(classifier.model_id()),
        };
        info!("{}", evaluation.summary());
        Ok(evaluation)
    }
}
