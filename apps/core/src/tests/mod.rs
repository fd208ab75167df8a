//! Test Module
//!
//! Cross-module test suite for the triage pipeline.
//!
//! ## Test Categories
//! - `fixtures`: mock classifiers and small labeled datasets
//! - `triage_tests`: pipeline branches, safety precedence, resolution, model swap
//! - `training_tests`: training, calibration quality, artifact persistence
//! - `integration_tests`: train, save, load and evaluate end to end

pub mod fixtures;
pub mod integration_tests;
pub mod training_tests;
