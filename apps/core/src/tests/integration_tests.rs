//! Integration Tests
//!
//! End-to-end: train on a small corpus, persist the artifact, build the
//! pipeline from configuration and evaluate real input.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::tempdir;

use super::fixtures::{symptom_dataset, test_training_config};
use crate::artifact::LabeledDataset;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::triage::{
    train, AdvisoryKind, BlendKind, CalibratedClassifier, StoreCatalog, TriagePipeline, Verdict,
};

fn write_model(dir: &std::path::Path) -> PathBuf {
    let path = dir.join("models").join("symptom_model.json");
    let artifact = train(&symptom_dataset(), &test_training_config()).expect("training");
    artifact.save(&path).expect("save");
    path
}

fn config_for(model_path: PathBuf) -> PipelineConfig {
    PipelineConfig {
        model_path,
        stores_path: None,
        training: test_training_config(),
    }
}

#[test]
fn test_train_save_load_evaluate() {
    let dir = tempdir().expect("Failed to create temp dir");
    let pipeline = TriagePipeline::from_config(&config_for(write_model(dir.path())))
        .expect("pipeline");

    let eval = pipeline
        .evaluate("high fever with chills and sweating every evening")
        .expect("evaluation");
    let decision = eval.decision.as_ref().expect("decision");

    assert_eq!(eval.verdict, Verdict::Normal);
    assert_eq!(decision.condition, "Malaria");
    assert!(eval.model_id.is_some());
    let recs = eval.recommendations.as_ref().expect("recommendations");
    assert_eq!(recs.condition_key.as_deref(), Some("Malaria"));
    assert!(!recs.herbal.is_empty());
    assert!(eval.has_advisory(AdvisoryKind::Disclaimer));
}

#[test]
fn test_trained_pipeline_still_honours_emergencies() {
    let dir = tempdir().expect("Failed to create temp dir");
    let pipeline = TriagePipeline::from_config(&config_for(write_model(dir.path())))
        .expect("pipeline");

    let eval = pipeline
        .evaluate("crushing chest pain spreading to my arm")
        .expect("evaluation");
    assert!(eval.is_emergency());
    assert!(eval.decision.is_none());
}

#[test]
fn test_missing_artifact_fails_startup() {
    let dir = tempdir().expect("Failed to create temp dir");
    let result = TriagePipeline::from_config(&config_for(dir.path().join("absent.json")));
    assert!(matches!(result, Err(PipelineError::ModelUnavailable(_))));
}

#[test]
fn test_reload_swaps_in_new_artifact() {
    let dir = tempdir().expect("Failed to create temp dir");
    let first = write_model(dir.path());
    let pipeline = TriagePipeline::from_config(&config_for(first)).expect("pipeline");
    let before = pipeline.model_id();

    let second = dir.path().join("next.json");
    train(&symptom_dataset(), &test_training_config())
        .expect("training")
        .save(&second)
        .expect("save");
    pipeline.reload(&second).expect("reload");

    assert!(pipeline.model_id().is_some());
    assert_ne!(pipeline.model_id(), before);
}

#[test]
fn test_custom_stores_from_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let stores_path = dir.path().join("stores.json");
    let mut file = std::fs::File::create(&stores_path).expect("create");
    write!(
        file,
        r#"{{
            "herbal": {{"Malaria": [{{"name": "Cinchona Bark", "relevance": 0.9}}]}},
            "pharmaceuticals": {{"Malaria": [{{
                "name": "Artemether", "dosage": "3.2 mg/kg", "purpose": "First-line",
                "availability": "prescription"
            }}]}}
        }}"#
    )
    .expect("write");

    let mut config = config_for(write_model(dir.path()));
    config.stores_path = Some(stores_path);
    let pipeline = TriagePipeline::from_config(&config).expect("pipeline");

    let eval = pipeline
        .evaluate("fever chills and sweating for days")
        .expect("evaluation");
    let recs = eval.recommendations.expect("recommendations");
    assert_eq!(recs.herbal[0].name, "Cinchona Bark");
    assert_eq!(recs.pharmaceuticals[0].name, "Artemether");
    assert!(recs.pharmaceuticals[0].brand_names.is_empty());
}

#[test]
fn test_dataset_file_to_pipeline() {
    let dir = tempdir().expect("Failed to create temp dir");
    let dataset_path = dir.path().join("train.jsonl");
    let mut file = std::fs::File::create(&dataset_path).expect("create");
    for example in symptom_dataset().examples() {
        writeln!(file, "{}", serde_json::to_string(example).expect("json")).expect("write");
    }
    drop(file);

    let dataset = LabeledDataset::from_jsonl(&dataset_path).expect("dataset");
    assert_eq!(dataset.len(), 24);

    let artifact = train(&dataset, &test_training_config()).expect("training");
    let classifier = CalibratedClassifier::from_artifact(&artifact).expect("classifier");
    let pipeline = TriagePipeline::new(StoreCatalog::builtin()).with_classifier(Arc::new(classifier));

    // vague input: whatever the model says, the decision stays well formed
    let eval = pipeline.evaluate("I feel weird").expect("evaluation");
    let decision = eval.decision.expect("decision");
    assert!(matches!(
        decision.branch,
        BlendKind::LowConfidenceOverride | BlendKind::Supplemented
    ));
    assert!((0.0..=1.0).contains(&decision.confidence));
    let recs = eval.recommendations.expect("recommendations");
    assert!(!recs.herbal.is_empty() && !recs.pharmaceuticals.is_empty());
}
