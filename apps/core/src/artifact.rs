//! Model artifact and labeled dataset persistence.
//!
//! Artifacts are single JSON documents written atomically: the bytes go to a
//! temporary file next to the target which is then renamed over it, so a
//! reader never observes a half-written model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::PipelineError;
use crate::triage::calibration::PlattCalibrator;

/// Bumped whenever the artifact layout changes incompatibly
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Everything inference needs, produced by one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub id: Uuid,
    pub trained_at: DateTime<Utc>,
    /// 1 = unigrams, 2 = unigrams + adjacent pairs
    pub ngram_max: usize,
    pub vocabulary: Vec<String>,
    pub idf: Vec<f64>,
    pub labels: Vec<String>,
    /// labels x vocabulary
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    /// One per label, same order as `labels`
    pub calibrators: Vec<PlattCalibrator>,
}

impl ModelArtifact {
    /// Checks that every part agrees on label count and dimensionality.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let incompatible = |reason: String| Err(PipelineError::ModelUnavailable(reason));

        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return incompatible(format!(
                "artifact format {} is not supported (expected {})",
                self.format_version, ARTIFACT_FORMAT_VERSION
            ));
        }
        if self.labels.is_empty() {
            return incompatible("artifact has no labels".to_string());
        }
        let unique: HashSet<&String> = self.labels.iter().collect();
        if unique.len() != self.labels.len() {
            return incompatible("artifact has duplicate labels".to_string());
        }
        if self.idf.len() != self.vocabulary.len() {
            return incompatible(format!(
                "{} idf weights for {} vocabulary terms",
                self.idf.len(),
                self.vocabulary.len()
            ));
        }
        if self.weights.len() != self.labels.len() || self.bias.len() != self.labels.len() {
            return incompatible(format!(
                "weights/bias cover {}/{} labels, expected {}",
                self.weights.len(),
                self.bias.len(),
                self.labels.len()
            ));
        }
        if let Some(row) = self.weights.iter().find(|row| row.len() != self.vocabulary.len()) {
            return incompatible(format!(
                "weight row has {} features, vocabulary has {}",
                row.len(),
                self.vocabulary.len()
            ));
        }
        if self.calibrators.len() != self.labels.len() {
            return incompatible(format!(
                "{} calibrators for {} labels",
                self.calibrators.len(),
                self.labels.len()
            ));
        }
        Ok(())
    }

    /// Writes the artifact as JSON, replacing any previous file atomically.
    pub fn save(&self, path: &Path) -> Result<(), PipelineError> {
        let parent_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent_dir)?;

        let temp_file = NamedTempFile::new_in(parent_dir)?;
        {
            let mut writer = BufWriter::new(&temp_file);
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }
        temp_file.persist(path)?;

        info!("Saved model {} to {}", self.id, path.display());
        Ok(())
    }

    /// Loads and validates an artifact. A missing or unreadable file is
    /// reported as `ModelUnavailable`, never replaced by a default model.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let file = File::open(path).map_err(|e| {
            PipelineError::ModelUnavailable(format!("cannot open {}: {}", path.display(), e))
        })?;
        let artifact: ModelArtifact = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            PipelineError::ModelUnavailable(format!("cannot parse {}: {}", path.display(), e))
        })?;
        artifact.validate()?;
        debug!("Artifact {} trained at {}", artifact.id, artifact.trained_at);
        Ok(artifact)
    }
}

/// One training row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledExample {
    pub text: String,
    pub label: String,
}

impl LabeledExample {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// Labeled corpus, read from JSON Lines (`{"text": ..., "label": ...}` per line)
#[derive(Debug, Clone, Default)]
pub struct LabeledDataset {
    examples: Vec<LabeledExample>,
}

impl LabeledDataset {
    pub fn new(examples: Vec<LabeledExample>) -> Self {
        Self { examples }
    }

    /// Parses a JSONL file. Blank lines are skipped; a malformed line fails
    /// the whole load with its line number.
    pub fn from_jsonl(path: &Path) -> Result<Self, PipelineError> {
        let reader = BufReader::new(File::open(path)?);
        let mut examples = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let example: LabeledExample = serde_json::from_str(&line).map_err(|e| {
                PipelineError::InvalidDataset(format!("line {}: {}", line_no + 1, e))
            })?;
            examples.push(example);
        }

        info!("Read {} examples from {}", examples.len(), path.display());
        Ok(Self { examples })
    }

    pub fn examples(&self) -> &[LabeledExample] {
        &self.examples
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Examples per label, sorted by label
    pub fn label_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for example in &self.examples {
            *counts.entry(example.label.clone()).or_insert(0) += 1;
        }
        counts
    }
}

impl FromIterator<LabeledExample> for LabeledDataset {
    fn from_iter<I: IntoIterator<Item = LabeledExample>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
