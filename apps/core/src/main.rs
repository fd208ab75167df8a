// Remedia command-line entry point
// Trains models, evaluates symptom descriptions, reports calibration

use anyhow::{bail, Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use remedia_core::artifact::LabeledDataset;
use remedia_core::config::PipelineConfig;
use remedia_core::triage::{reliability_report, train, CalibratedClassifier, TriagePipeline};

const USAGE: &str = "Usage:
  remedia train <dataset.jsonl> [output.json]
  remedia evaluate <symptom text...>
  remedia calibration <dataset.jsonl> [buckets]";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if env::var("REMEDIA_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = PipelineConfig::from_env().context("Invalid configuration")?;

    match args.first().map(String::as_str) {
        Some("train") => {
            let dataset = args.get(1).context(USAGE)?;
            let output = args
                .get(2)
                .map(PathBuf::from)
                .unwrap_or_else(|| config.model_path.clone());
            run_train(Path::new(dataset), &output, &config)
        }
        Some("evaluate") => {
            let text = args[1..].join(" ");
            run_evaluate(&text, &config)
        }
        Some("calibration") => {
            let dataset = args.get(1).context(USAGE)?;
            let buckets = match args.get(2) {
                Some(raw) => raw.parse().context("Bucket count must be a positive integer")?,
                None => 10,
            };
            run_calibration(Path::new(dataset), buckets, &config)
        }
        _ => bail!(USAGE),
    }
}

fn run_train(dataset_path: &Path, output: &Path, config: &PipelineConfig) -> Result<()> {
    let dataset = LabeledDataset::from_jsonl(dataset_path)
        .with_context(|| format!("Failed to read dataset {}", dataset_path.display()))?;
    let artifact = train(&dataset, &config.training)?;
    artifact
        .save(output)
        .with_context(|| format!("Failed to write model to {}", output.display()))?;
    info!(id = %artifact.id, labels = artifact.labels.len(), "Model written to {}", output.display());

    println!(
        "{}",
        serde_json::json!({
            "model_id": artifact.id,
            "labels": artifact.labels,
            "vocabulary": artifact.vocabulary.len(),
            "output": output,
        })
    );
    Ok(())
}

fn run_evaluate(text: &str, config: &PipelineConfig) -> Result<()> {
    let pipeline = TriagePipeline::from_config(config)?;
    let evaluation = pipeline.evaluate(text)?;
    println!("{}", serde_json::to_string_pretty(&evaluation)?);
    Ok(())
}

fn run_calibration(dataset_path: &Path, buckets: usize, config: &PipelineConfig) -> Result<()> {
    let classifier = CalibratedClassifier::load(&config.model_path)?;
    let dataset = LabeledDataset::from_jsonl(dataset_path)
        .with_context(|| format!("Failed to read dataset {}", dataset_path.display()))?;
    let report = reliability_report(&classifier, &dataset, buckets)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
