//! Probability calibration.
//!
//! One Platt sigmoid per label maps raw scores to probabilities. The sigmoids
//! are fitted on out-of-fold scores produced by stratified k-fold
//! cross-validation, so the calibrator never sees scores from a model that
//! was trained on the same rows.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::classifier::SymptomClassifier;
use crate::artifact::LabeledDataset;
use crate::error::PipelineError;

const MAX_NEWTON_ITERATIONS: usize = 100;
const MIN_STEP: f64 = 1e-10;
const HESSIAN_RIDGE: f64 = 1e-12;
const GRADIENT_TOLERANCE: f64 = 1e-5;

/// `p = 1 / (1 + exp(-(a * s + b)))` with `a >= 0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattCalibrator {
    pub a: f64,
    pub b: f64,
}

impl Default for PlattCalibrator {
    fn default() -> Self {
        Self { a: 1.0, b: 0.0 }
    }
}

impl PlattCalibrator {
    pub fn apply(&self, score: f64) -> f64 {
        sigmoid(self.a * score + self.b)
    }

    /// Fits the sigmoid on `(score, is_positive)` pairs using Newton's method
    /// with backtracking line search and Platt's smoothed targets.
    ///
    /// A negative slope would invert the ranking of scores for this label,
    /// so it is clamped to zero and the intercept refitted to the prior.
    pub fn fit(samples: &[(f64, bool)]) -> Self {
        let positives = samples.iter().filter(|(_, y)| *y).count() as f64;
        let negatives = samples.len() as f64 - positives;

        let hi_target = (positives + 1.0) / (positives + 2.0);
        let lo_target = 1.0 / (negatives + 2.0);
        let targets: Vec<f64> = samples
            .iter()
            .map(|(_, y)| if *y { hi_target } else { lo_target })
            .collect();

        // Internally p = 1 / (1 + exp(big_a * f + big_b)), i.e. a = -big_a.
        let mut big_a = 0.0;
        let mut big_b = ((negatives + 1.0) / (positives + 1.0)).ln();
        let mut fval = objective(samples, &targets, big_a, big_b);

        for _ in 0..MAX_NEWTON_ITERATIONS {
            let (mut h11, mut h22, mut h21) = (HESSIAN_RIDGE, HESSIAN_RIDGE, 0.0);
            let (mut g1, mut g2) = (0.0, 0.0);

            for ((score, _), target) in samples.iter().zip(&targets) {
                let f_apb = score * big_a + big_b;
                let (p, q) = if f_apb >= 0.0 {
                    let e = (-f_apb).exp();
                    (e / (1.0 + e), 1.0 / (1.0 + e))
                } else {
                    let e = f_apb.exp();
                    (1.0 / (1.0 + e), e / (1.0 + e))
                };
                let d2 = p * q;
                h11 += score * score * d2;
                h22 += d2;
                h21 += score * d2;
                let d1 = target - p;
                g1 += score * d1;
                g2 += d1;
            }

            if g1.abs() < GRADIENT_TOLERANCE && g2.abs() < GRADIENT_TOLERANCE {
                break;
            }

            let det = h11 * h22 - h21 * h21;
            let d_a = -(h22 * g1 - h21 * g2) / det;
            let d_b = -(-h21 * g1 + h11 * g2) / det;
            let gd = g1 * d_a + g2 * d_b;

            let mut step = 1.0;
            while step >= MIN_STEP {
                let new_a = big_a + step * d_a;
                let new_b = big_b + step * d_b;
                let new_f = objective(samples, &targets, new_a, new_b);
                if new_f < fval + 1e-4 * step * gd {
                    big_a = new_a;
                    big_b = new_b;
                    fval = new_f;
                    break;
                }
                step /= 2.0;
            }

            if step < MIN_STEP {
                break;
            }
        }

        let a = -big_a;
        if a.is_finite() && a >= 0.0 && big_b.is_finite() {
            return Self { a, b: -big_b };
        }

        // Flat sigmoid at the smoothed prior
        let prior = (positives + 1.0) / (samples.len() as f64 + 2.0);
        Self {
            a: 0.0,
            b: (prior / (1.0 - prior)).ln(),
        }
    }
}

fn objective(samples: &[(f64, bool)], targets: &[f64], big_a: f64, big_b: f64) -> f64 {
    samples
        .iter()
        .zip(targets)
        .map(|((score, _), t)| {
            let f_apb = score * big_a + big_b;
            if f_apb >= 0.0 {
                t * f_apb + (1.0 + (-f_apb).exp()).ln()
            } else {
                (t - 1.0) * f_apb + (1.0 + f_apb.exp()).ln()
            }
        })
        .sum()
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Splits row indices into `k` folds, keeping each label's share roughly
/// equal across folds. Rows of one label are shuffled with a seeded RNG and
/// dealt round-robin, continuing where the previous label stopped.
pub fn stratified_folds(labels: &[usize], k: usize, seed: u64) -> Vec<Vec<usize>> {
    let mut by_label: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (row, &label) in labels.iter().enumerate() {
        by_label.entry(label).or_default().push(row);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let fold_count = k.max(1);
    let mut folds = vec![Vec::new(); fold_count];
    let mut next = 0;
    for rows in by_label.values_mut() {
        rows.shuffle(&mut rng);
        for &row in rows.iter() {
            folds[next % fold_count].push(row);
            next += 1;
        }
    }
    for fold in &mut folds {
        fold.sort_unstable();
    }
    folds
}

/// One probability bucket of a reliability diagram
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityBucket {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
    pub mean_confidence: f64,
    pub accuracy: f64,
    pub gap: f64,
}

/// How closely predicted confidence tracks observed accuracy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityReport {
    pub model_id: String,
    pub examples: usize,
    pub accuracy: f64,
    /// Count-weighted mean of bucket gaps
    pub expected_calibration_error: f64,
    pub max_bucket_gap: f64,
    pub buckets: Vec<ReliabilityBucket>,
}

/// Buckets the top prediction of every example by its confidence and
/// compares each bucket's mean confidence with its accuracy. Empty buckets
/// are omitted.
pub fn reliability_report(
    classifier: &dyn SymptomClassifier,
    dataset: &LabeledDataset,
    buckets: usize,
) -> Result<ReliabilityReport, PipelineError> {
    if dataset.is_empty() {
        return Err(PipelineError::InvalidDataset(
            "cannot evaluate calibration on an empty dataset".to_string(),
        ));
    }
    let buckets = buckets.max(1);
    let mut sums = vec![(0usize, 0.0f64, 0usize); buckets];

    for example in dataset.examples() {
        let prediction = classifier.predict(&example.text)?;
        let slot = ((prediction.confidence * buckets as f64) as usize).min(buckets - 1);
        let entry = &mut sums[slot];
        entry.0 += 1;
        entry.1 += prediction.confidence;
        if prediction.label == example.label {
            entry.2 += 1;
        }
    }

    let total = dataset.len() as f64;
    let mut report = ReliabilityReport {
        model_id: classifier.model_id(),
        examples: dataset.len(),
        accuracy: sums.iter().map(|s| s.2).sum::<usize>() as f64 / total,
        expected_calibration_error: 0.0,
        max_bucket_gap: 0.0,
        buckets: Vec::new(),
    };

    for (slot, (count, confidence_sum, correct)) in sums.into_iter().enumerate() {
        if count == 0 {
            continue;
        }
        let mean_confidence = confidence_sum / count as f64;
        let accuracy = correct as f64 / count as f64;
        let gap = (mean_confidence - accuracy).abs();
        report.expected_calibration_error += gap * count as f64 / total;
        report.max_bucket_gap = report.max_bucket_gap.max(gap);
        report.buckets.push(ReliabilityBucket {
            lower: slot as f64 / buckets as f64,
            upper: (slot + 1) as f64 / buckets as f64,
            count,
            mean_confidence,
            accuracy,
            gap,
        });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_is_monotonic_for_separable_scores() {
        let mut samples = Vec::new();
        for i in 0..20 {
            samples.push((0.6 + i as f64 * 0.02, true));
            samples.push((0.1 + i as f64 * 0.02, false));
        }
        let calibrator = PlattCalibrator::fit(&samples);

        assert!(calibrator.a > 0.0);
        assert!(calibrator.apply(0.9) > calibrator.apply(0.2));
        assert!(calibrator.apply(0.9) < 1.0);
    }

    #[test]
    fn test_anti_correlated_scores_are_clamped_flat() {
        let mut samples = Vec::new();
        for i in 0..10 {
            samples.push((0.1 + i as f64 * 0.01, true));
            samples.push((0.8 + i as f64 * 0.01, false));
        }
        let calibrator = PlattCalibrator::fit(&samples);

        assert_eq!(calibrator.a, 0.0);
        assert!((calibrator.apply(0.0) - calibrator.apply(1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_sigmoid_is_stable_at_extremes() {
        assert!(sigmoid(1000.0) <= 1.0);
        assert!(sigmoid(-1000.0) >= 0.0);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_stratified_folds_cover_every_row_once() {
        let labels = vec![0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 2, 2, 2];
        let folds = stratified_folds(&labels, 3, 42);

        assert_eq!(folds.len(), 3);
        let mut all: Vec<usize> = folds.iter().flatten().copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..labels.len()).collect::<Vec<_>>());

        // every label with >= k rows appears in every fold
        for fold in &folds {
            assert!(fold.iter().any(|&r| labels[r] == 1));
            assert!(fold.iter().any(|&r| labels[r] == 2));
        }
    }

    #[test]
    fn test_stratified_folds_are_seeded() {
        let labels = vec![0, 1, 0, 1, 0, 1, 0, 1, 0, 1];
        assert_eq!(stratified_folds(&labels, 2, 7), stratified_folds(&labels, 2, 7));
    }
}
