//! Offline training: TF-IDF vocabulary, class-balanced softmax regression and
//! cross-validated Platt calibration, bundled into one [`ModelArtifact`].

use chrono::Utc;
use std::collections::BTreeMap;
use std::thread;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::calibration::{stratified_folds, PlattCalibrator};
use super::classifier::LogisticModel;
use super::features::{FeatureExtractor, FeatureVector};
use crate::artifact::{LabeledDataset, ModelArtifact, ARTIFACT_FORMAT_VERSION};
use crate::config::TrainingConfig;
use crate::error::PipelineError;

/// Minimum examples per label: calibration needs at least two folds.
const MIN_EXAMPLES_PER_LABEL: usize = 2;

/// Sample weight per label: `n_samples / (n_labels * count(label))`.
///
/// Every label present in `targets` gets a strictly positive weight, so rare
/// labels are boosted rather than ignored.
pub fn balanced_class_weights(targets: &[usize], num_labels: usize) -> Vec<f64> {
    let mut counts = vec![0usize; num_labels];
    for &target in targets {
        counts[target] += 1;
    }
    let present = counts.iter().filter(|&&c| c > 0).count().max(1);
    counts
        .iter()
        .map(|&count| {
            if count == 0 {
                0.0
            } else {
                targets.len() as f64 / (present as f64 * count as f64)
            }
        })
        .collect()
}

/// Full-batch gradient descent on the weighted, L2-regularized softmax loss.
pub fn fit_logistic(
    rows: &[&FeatureVector],
    targets: &[usize],
    num_labels: usize,
    dim: usize,
    config: &TrainingConfig,
) -> LogisticModel {
    let class_weights = balanced_class_weights(targets, num_labels);
    let total_weight: f64 = targets.iter().map(|&t| class_weights[t]).sum::<f64>().max(1e-12);
    let mut model = LogisticModel::zeros(num_labels, dim);

    for _ in 0..config.epochs {
        let mut grad_w = vec![vec![0.0; dim]; num_labels];
        let mut grad_b = vec![0.0; num_labels];

        for (x, &target) in rows.iter().zip(targets) {
            let sample_weight = class_weights[target];
            let probs = model.probabilities(x);
            for (label, p) in probs.iter().enumerate() {
                let indicator = if label == target { 1.0 } else { 0.0 };
                let err = sample_weight * (p - indicator);
                grad_b[label] += err;
                for &(column, value) in x.entries() {
                    grad_w[label][column] += err * value;
                }
            }
        }

        for label in 0..num_labels {
            for column in 0..dim {
                let g = grad_w[label][column] / total_weight
                    + config.l2 * model.weights[label][column];
                model.weights[label][column] -= config.learning_rate * g;
            }
            model.bias[label] -= config.learning_rate * grad_b[label] / total_weight;
        }
    }

    model
}

/// Trains a calibrated classifier from a labeled dataset.
///
/// Fails with `InvalidDataset` when the data cannot support calibration:
/// no rows, a single label, or a label with fewer than two examples.
#[instrument(skip(dataset, config), fields(examples = dataset.len()))]
pub fn train(dataset: &LabeledDataset, config: &TrainingConfig) -> Result<ModelArtifact, PipelineError> {
    config.validate()?;

    if dataset.is_empty() {
        return Err(PipelineError::InvalidDataset("dataset is empty".to_string()));
    }
    let counts = dataset.label_counts();
    if counts.len() < 2 {
        return Err(PipelineError::InvalidDataset(format!(
            "need at least 2 labels, found {}",
            counts.len()
        )));
    }
    if let Some((label, count)) = counts.iter().find(|(_, &c)| c < MIN_EXAMPLES_PER_LABEL) {
        return Err(PipelineError::InvalidDataset(format!(
            "label '{}' has {} example(s), need at least {}",
            label, count, MIN_EXAMPLES_PER_LABEL
        )));
    }

    let labels: Vec<String> = counts.keys().cloned().collect();
    let label_index: BTreeMap<&str, usize> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| (label.as_str(), i))
        .collect();
    let targets: Vec<usize> = dataset
        .examples()
        .iter()
        .map(|e| label_index[e.label.as_str()])
        .collect();

    let smallest = counts.values().copied().min().unwrap_or(0);
    let max_count = counts.values().copied().max().unwrap_or(0);
    if max_count >= smallest * 50 {
        warn!(
            "Label frequencies are heavily skewed ({}:{}), relying on class weights",
            max_count, smallest
        );
    }

    let texts: Vec<&str> = dataset.examples().iter().map(|e| e.text.as_str()).collect();
    let extractor = FeatureExtractor::fit(&texts, config.max_features, config.ngram_max);
    let rows: Vec<FeatureVector> = texts.iter().map(|t| extractor.transform(t)).collect();
    let dim = extractor.dim();
    info!(
        "Vocabulary of {} terms over {} labels",
        dim,
        labels.len()
    );

    let k = config.cv_folds.min(smallest);
    let folds = stratified_folds(&targets, k, config.seed);
    let out_of_fold = cross_validated_scores(&rows, &targets, &folds, labels.len(), dim, config)?;

    let calibrators: Vec<PlattCalibrator> = (0..labels.len())
        .map(|label| {
            let samples: Vec<(f64, bool)> = out_of_fold
                .iter()
                .zip(&targets)
                .map(|(scores, &target)| (scores[label], target == label))
                .collect();
            PlattCalibrator::fit(&samples)
        })
        .collect();
    debug!("Fitted {} calibrators from {} folds", calibrators.len(), k);

    let all_rows: Vec<&FeatureVector> = rows.iter().collect();
    let model = fit_logistic(&all_rows, &targets, labels.len(), dim, config);

    let artifact = ModelArtifact {
        format_version: ARTIFACT_FORMAT_VERSION,
        id: Uuid::new_v4(),
        trained_at: Utc::now(),
        ngram_max: extractor.ngram_max(),
        vocabulary: extractor.terms().to_vec(),
        idf: extractor.idf().to_vec(),
        labels,
        weights: model.weights,
        bias: model.bias,
        calibrators,
    };
    info!("Trained model {}", artifact.id);
    Ok(artifact)
}

/// Raw per-label probabilities for every row, each produced by a model that
/// did not see that row. Folds train concurrently on scoped threads.
fn cross_validated_scores(
    rows: &[FeatureVector],
    targets: &[usize],
    folds: &[Vec<usize>],
    num_labels: usize,
    dim: usize,
    config: &TrainingConfig,
) -> Result<Vec<Vec<f64>>, PipelineError> {
    let fold_results: Vec<Result<Vec<(usize, Vec<f64>)>, PipelineError>> = thread::scope(|scope| {
        let handles: Vec<_> = folds
            .iter()
            .enumerate()
            .map(|(fold_no, held_out)| {
                scope.spawn(move || {
                    let mut in_fold = vec![false; rows.len()];
                    for &row in held_out {
                        in_fold[row] = true;
                    }
                    let (train_rows, train_targets): (Vec<&FeatureVector>, Vec<usize>) = rows
                        .iter()
                        .zip(targets)
                        .enumerate()
                        .filter(|(row, _)| !in_fold[*row])
                        .map(|(_, (x, &t))| (x, t))
                        .unzip();

                    debug!("Fold {}: {} train / {} held out", fold_no, train_rows.len(), held_out.len());
                    let model = fit_logistic(&train_rows, &train_targets, num_labels, dim, config);
                    held_out
                        .iter()
                        .map(|&row| (row, model.probabilities(&rows[row])))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(fold_no, handle)| {
                handle.join().map_err(|_| {
                    PipelineError::InvalidDataset(format!("cross-validation fold {} failed", fold_no))
                })
            })
            .collect()
    });

    let mut scores = vec![Vec::new(); rows.len()];
    for result in fold_results {
        for (row, probs) in result? {
            scores[row] = probs;
        }
    }
    Ok(scores)
}
