use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use validator::Validate;

use crate::error::PipelineError;

const DEFAULT_MODEL_PATH: &str = "data/models/symptom_model.json";

/// Hyper-parameters for the offline training run.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate)]
pub struct TrainingConfig {
    /// Upper bound on vocabulary size (unigrams + bigrams combined).
    #[validate(range(min = 1, max = 200000))]
    pub max_features: usize,
    /// Number of stratified folds used to fit the calibrators.
    #[validate(range(min = 2, max = 20))]
    pub cv_folds: usize,
    /// Full-batch gradient descent iterations.
    #[validate(range(min = 1, max = 100000))]
    pub epochs: usize,
    #[validate(range(min = 0.000001, max = 10.0))]
    pub learning_rate: f64,
    /// L2 penalty applied to the weight matrix (bias is not penalized).
    #[validate(range(min = 0.0, max = 1.0))]
    pub l2: f64,
    /// Seed for fold assignment.
    pub seed: u64,
    /// 1 = unigrams only, 2 = unigrams + adjacent pairs.
    #[validate(range(min = 1, max = 2))]
    pub ngram_max: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            max_features: 8000,
            cv_folds: 5,
            epochs: 300,
            learning_rate: 0.5,
            l2: 1e-4,
            seed: 42,
            ngram_max: 2,
        }
    }
}

/// Runtime configuration for the triage pipeline.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate)]
pub struct PipelineConfig {
    /// Location of the trained model artifact (JSON).
    pub model_path: PathBuf,
    /// Optional JSON file replacing the built-in alias table and stores.
    #[serde(default)]
    pub stores_path: Option<PathBuf>,
    #[validate(nested)]
    pub training: TrainingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            stores_path: None,
            training: TrainingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Builds the configuration from `REMEDIA_*` environment variables.
    ///
    /// A `.env` file in the working directory is honoured if present. Unset
    /// variables keep their defaults; unparsable or out-of-range values are
    /// reported as `PipelineError::Config`.
    pub fn from_env() -> Result<Self, PipelineError> {
        dotenv::dotenv().ok();

        let defaults = TrainingConfig::default();
        let training = TrainingConfig {
            max_features: read_var("REMEDIA_MAX_FEATURES", defaults.max_features)?,
            cv_folds: read_var("REMEDIA_CV_FOLDS", defaults.cv_folds)?,
            epochs: read_var("REMEDIA_EPOCHS", defaults.epochs)?,
            learning_rate: read_var("REMEDIA_LEARNING_RATE", defaults.learning_rate)?,
            l2: read_var("REMEDIA_L2", defaults.l2)?,
            seed: read_var("REMEDIA_SEED", defaults.seed)?,
            ngram_max: read_var("REMEDIA_NGRAM_MAX", defaults.ngram_max)?,
        };

        let model_path = env::var("REMEDIA_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_MODEL_PATH));
        let stores_path = env::var("REMEDIA_STORES_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let config = Self {
            model_path,
            stores_path,
            training,
        };
        config.validate()?;
        Ok(config)
    }
}

fn read_var<T: FromStr>(name: &str, default: T) -> Result<T, PipelineError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| PipelineError::Config(format!("{} has an invalid value: '{}'", name, raw))),
        Err(_) => Ok(default),
    }
}
