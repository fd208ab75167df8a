//! Remedia Core - symptom triage and remedy recommendation pipeline.

pub mod artifact;
pub mod config;
pub mod error;
pub mod triage;

#[cfg(test)]
mod tests;
