//! Training Tests
//!
//! Offline training, calibration quality and artifact persistence.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tempfile::tempdir;

use super::fixtures::{symptom_dataset, test_training_config};
use crate::artifact::{LabeledDataset, LabeledExample, ModelArtifact};
use crate::config::TrainingConfig;
use crate::error::PipelineError;
use crate::triage::{reliability_report, train, CalibratedClassifier, SymptomClassifier};

fn trained_classifier() -> CalibratedClassifier {
    let artifact = train(&symptom_dataset(), &test_training_config()).expect("training");
    CalibratedClassifier::from_artifact(&artifact).expect("classifier")
}

/// Same four words in both classes; only their order differs
fn word_order_dataset() -> LabeledDataset {
    let angina = [
        "chest pain shortness breath climbing stairs",
        "chest pain shortness breath walking uphill",
        "chest pain shortness breath during exercise",
        "chest pain shortness breath carrying heavy bags",
        "chest pain shortness breath running bus",
        "chest pain shortness breath big meal",
    ];
    let pleurisy = [
        "breath shortness pain chest worse lying flat",
        "pain chest breath shortness sharp deep inhale",
        "breath shortness pain chest sharp coughing",
        "pain chest breath shortness worse twisting",
        "breath shortness pain chest stabbing inhale",
        "pain chest breath shortness hurts lying flat",
    ];
    angina
        .iter()
        .map(|t| LabeledExample::new(*t, "Angina"))
        .chain(pleurisy.iter().map(|t| LabeledExample::new(*t, "Pleurisy")))
        .collect()
}

/// Four conditions with their own symptom words. Each row carries two of its
/// condition's words plus one neutral word; one row in five is relabelled to
/// a different condition, so the true accuracy ceiling is about 0.8.
fn noisy_corpus(rows: usize, seed: u64) -> LabeledDataset {
    const CONDITIONS: [(&str, [&str; 5]); 4] = [
        ("Malaria", ["chills", "shivering", "sweating", "mosquito", "rigors"]),
        ("GERD", ["heartburn", "reflux", "acid", "indigestion", "belching"]),
        ("Cold", ["sneezing", "runny", "congestion", "sniffles", "stuffy"]),
        ("Arthritis", ["stiffness", "swollen", "knuckles", "joints", "aching"]),
    ];
    const NEUTRAL: [&str; 8] = [
        "lately", "evening", "morning", "constantly", "tired", "weekend", "yesterday", "recently",
    ];

    let mut rng = StdRng::seed_from_u64(seed);
    (0..rows)
        .map(|row| {
            let (condition, words) = CONDITIONS[row % CONDITIONS.len()];
            let picked: Vec<&str> = words.choose_multiple(&mut rng, 2).copied().collect();
            let neutral = NEUTRAL.choose(&mut rng).copied().expect("neutral word");
            let label = if rng.gen_bool(0.8) {
                condition
            } else {
                CONDITIONS[(row + rng.gen_range(1..CONDITIONS.len())) % CONDITIONS.len()].0
            };
            LabeledExample::new(format!("{} {} {}", picked[0], picked[1], neutral), label)
        })
        .collect()
}

#[cfg(test)]
mod model_tests {
    use super::*;

    #[test]
    fn test_trained_model_predicts_clear_cases() {
        let classifier = trained_classifier();
        let cases = [
            ("fever with chills and sweating at night", "Malaria"),
            ("runny nose and constant sneezing", "Cold"),
            ("heartburn and acid after meals", "GERD"),
            ("swollen knee joint and stiffness", "Arthritis"),
        ];

        for (text, expected) in cases {
            let prediction = classifier.predict(text).expect("prediction");
            assert_eq!(prediction.label, expected, "Expected {} for '{}'", expected, text);
        }
    }

    #[test]
    fn test_distribution_is_normalized() {
        let classifier = trained_classifier();
        let prediction = classifier.predict("fever and a runny nose").expect("prediction");

        assert_eq!(prediction.distribution.len(), 4);
        let total: f64 = prediction.distribution.iter().map(|p| p.probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(prediction
            .distribution
            .windows(2)
            .all(|w| w[0].probability >= w[1].probability));
        assert_eq!(prediction.confidence, prediction.distribution[0].probability);
    }

    #[test]
    fn test_unseen_vocabulary_still_predicts() {
        let classifier = trained_classifier();
        let prediction = classifier.predict("zzz qqq").expect("prediction");
        assert!(classifier.labels().contains(&prediction.label));
        assert!((0.0..=1.0).contains(&prediction.confidence));
    }

    #[test]
    fn test_bigrams_capture_word_order() {
        let dataset = word_order_dataset();
        let text = "chest pain and shortness of breath";

        let with_pairs = train(&dataset, &test_training_config()).expect("training");
        let unigrams_only = train(
            &dataset,
            &TrainingConfig {
                ngram_max: 1,
                ..test_training_config()
            },
        )
        .expect("training");

        assert!(with_pairs.vocabulary.iter().any(|t| t == "shortness breath"));
        assert!(!unigrams_only.vocabulary.iter().any(|t| t.contains(' ')));

        // labels are sorted: Angina, Pleurisy
        let paired = CalibratedClassifier::from_artifact(&with_pairs)
            .expect("classifier")
            .raw_probabilities(text);
        let single = CalibratedClassifier::from_artifact(&unigrams_only)
            .expect("classifier")
            .raw_probabilities(text);

        assert!(paired[0] > paired[1], "Expected Angina with word pairs: {:?}", paired);
        assert!(paired[0] > single[0]);
    }

    #[test]
    fn test_only_bigrams_separate_reordered_text() {
        let dataset = word_order_dataset();
        let forward = "chest pain and shortness of breath";
        let reversed = "breath shortness, pain in the chest";

        let paired = CalibratedClassifier::from_artifact(
            &train(&dataset, &test_training_config()).expect("training"),
        )
        .expect("classifier");
        let single = CalibratedClassifier::from_artifact(
            &train(
                &dataset,
                &TrainingConfig {
                    ngram_max: 1,
                    ..test_training_config()
                },
            )
            .expect("training"),
        )
        .expect("classifier");

        // labels are sorted: Angina, Pleurisy
        let paired_forward = paired.raw_probabilities(forward);
        let paired_reversed = paired.raw_probabilities(reversed);
        assert!(paired_forward[0] > paired_forward[1], "{:?}", paired_forward);
        assert!(paired_reversed[1] > paired_reversed[0], "{:?}", paired_reversed);

        // same bag of words, so the unigram model cannot tell the two apart
        let single_forward = single.raw_probabilities(forward);
        let single_reversed = single.raw_probabilities(reversed);
        assert_eq!(single_forward, single_reversed);
        assert_eq!(
            single.predict(forward).expect("prediction").label,
            single.predict(reversed).expect("prediction").label
        );
    }
}

#[cfg(test)]
mod calibration_tests {
    use super::*;

    #[test]
    fn test_calibrators_are_monotonic() {
        let artifact = train(&symptom_dataset(), &test_training_config()).expect("training");
        assert_eq!(artifact.calibrators.len(), artifact.labels.len());
        assert!(artifact.calibrators.iter().all(|c| c.a >= 0.0 && c.b.is_finite()));
    }

    #[test]
    fn test_reliability_report_on_training_data() {
        let classifier = trained_classifier();
        let dataset = symptom_dataset();
        let report = reliability_report(&classifier, &dataset, 10).expect("report");

        assert_eq!(report.examples, 24);
        assert_eq!(report.buckets.iter().map(|b| b.count).sum::<usize>(), 24);
        assert!(report.accuracy >= 0.9, "accuracy {}", report.accuracy);
        assert!((0.0..=1.0).contains(&report.expected_calibration_error));
        assert!(report.max_bucket_gap >= report.expected_calibration_error - 1e-12);
        assert_eq!(report.model_id, classifier.model_id());
    }

    #[test]
    fn test_held_out_buckets_track_accuracy() {
        let artifact = train(&noisy_corpus(600, 11), &test_training_config()).expect("training");
        let classifier = CalibratedClassifier::from_artifact(&artifact).expect("classifier");
        let report = reliability_report(&classifier, &noisy_corpus(1500, 12), 10).expect("report");

        assert!(
            (0.7..=0.9).contains(&report.accuracy),
            "accuracy {}",
            report.accuracy
        );
        let populated: Vec<_> = report.buckets.iter().filter(|b| b.count >= 100).collect();
        assert!(!populated.is_empty());
        for bucket in populated {
            assert!(
                bucket.gap <= 0.10,
                "bucket {:.1}-{:.1}: confidence {:.3}, accuracy {:.3} over {} rows",
                bucket.lower,
                bucket.upper,
                bucket.mean_confidence,
                bucket.accuracy,
                bucket.count
            );
        }
    }

    #[test]
    fn test_training_is_deterministic() {
        let first = train(&symptom_dataset(), &test_training_config()).expect("training");
        let second = train(&symptom_dataset(), &test_training_config()).expect("training");

        assert_ne!(first.id, second.id);
        assert_eq!(first.vocabulary, second.vocabulary);
        assert_eq!(first.weights, second.weights);
        assert_eq!(first.calibrators, second.calibrators);
    }

    #[test]
    fn test_skewed_dataset_trains() {
        let mut examples: Vec<LabeledExample> = (0..60)
            .map(|i| LabeledExample::new(format!("runny nose and sneezing day {}", i), "Cold"))
            .collect();
        examples.push(LabeledExample::new("wheezing and tight chest at night", "Asthma"));
        examples.push(LabeledExample::new("wheezing, I needed my inhaler", "Asthma"));
        let dataset = LabeledDataset::new(examples);

        let artifact = train(&dataset, &test_training_config()).expect("training");
        assert_eq!(artifact.labels, vec!["Asthma", "Cold"]);
        assert!(artifact
            .calibrators
            .iter()
            .all(|c| c.a.is_finite() && c.b.is_finite()));
    }
}

#[cfg(test)]
mod dataset_tests {
    use super::*;

    #[test]
    fn test_rejects_unusable_datasets() {
        let empty = LabeledDataset::default();
        assert!(matches!(
            train(&empty, &test_training_config()),
            Err(PipelineError::InvalidDataset(_))
        ));

        let mut examples = symptom_dataset().examples().to_vec();
        examples.push(LabeledExample::new("itchy red rash on arms", "Eczema"));
        assert!(matches!(
            train(&LabeledDataset::new(examples), &test_training_config()),
            Err(PipelineError::InvalidDataset(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = TrainingConfig {
            cv_folds: 1,
            ..test_training_config()
        };
        assert!(matches!(
            train(&symptom_dataset(), &config),
            Err(PipelineError::Config(_))
        ));
    }
}

#[cfg(test)]
mod persistence_tests {
    use super::*;

    #[test]
    fn test_artifact_round_trip_preserves_predictions() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("models").join("symptom_model.json");

        let artifact = train(&symptom_dataset(), &test_training_config()).expect("training");
        artifact.save(&path).expect("save");

        let in_memory = CalibratedClassifier::from_artifact(&artifact).expect("classifier");
        let loaded = CalibratedClassifier::load(&path).expect("load");
        assert_eq!(loaded.model_id(), artifact.id.to_string());

        for text in ["fever and chills", "acid reflux", "blocked nose", "stiff knee"] {
            let a = in_memory.predict(text).expect("prediction");
            let b = loaded.predict(text).expect("prediction");
            assert_eq!(a.label, b.label);
            assert!((a.confidence - b.confidence).abs() < 1e-9);
        }
    }

    #[test]
    fn test_tampered_artifact_is_unavailable() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("model.json");

        let mut artifact = train(&symptom_dataset(), &test_training_config()).expect("training");
        artifact.calibrators.pop();
        artifact.save(&path).expect("save");

        assert!(matches!(
            ModelArtifact::load(&path).and_then(|a| CalibratedClassifier::from_artifact(&a)),
            Err(PipelineError::ModelUnavailable(_))
        ));
        assert!(matches!(
            CalibratedClassifier::load(&dir.path().join("missing.json")),
            Err(PipelineError::ModelUnavailable(_))
        ));
    }
}
