//! Condition resolution: compound labels and aliases to store keys.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::recommendations::RecommendationStore;
use crate::error::PipelineError;

/// Separator joining co-occurring conditions in one label
pub const COMPOUND_SEPARATOR: char = '/';

/// Result of resolving a condition label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    /// `component` of the label mapped to store key `key`
    Resolved { key: String, component: String },
    /// No component has a store entry; callers fall back
    Unresolved { original: String },
}

impl Resolution {
    /// Store key, or `UnresolvedCondition` for the sentinel.
    pub fn key(&self) -> Result<&str, PipelineError> {
        match self {
            Resolution::Resolved { key, .. } => Ok(key.as_str()),
            Resolution::Unresolved { original } => {
                Err(PipelineError::UnresolvedCondition(original.clone()))
            }
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }
}

/// Maps historical and synonymous condition names onto canonical keys.
#[derive(Debug, Clone, Default)]
pub struct ConditionResolver {
    /// lowercase alias -> canonical key
    aliases: HashMap<String, String>,
}

impl ConditionResolver {
    pub fn new(aliases: &BTreeMap<String, String>) -> Self {
        Self {
            aliases: aliases
                .iter()
                .map(|(alias, key)| (alias.trim().to_lowercase(), key.clone()))
                .collect(),
        }
    }

    /// Splits a label into its trimmed, non-empty components.
    pub fn components(label: &str) -> Vec<&str> {
        label
            .split(COMPOUND_SEPARATOR)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect()
    }

    /// Alias target for one component, or the component itself
    pub fn canonical_name<'a>(&'a self, component: &'a str) -> &'a str {
        self.aliases
            .get(&component.to_lowercase())
            .map(String::as_str)
            .unwrap_or(component)
    }

    /// Resolves each component in order and returns the first one the
    /// store knows. Never fails; see [`Resolution::Unresolved`].
    pub fn resolve(&self, label: &str, store: &RecommendationStore) -> Resolution {
        for component in Self::components(label) {
            let name = self.canonical_name(component);
            if let Some(key) = store.canonical_key(name) {
                return Resolution::Resolved {
                    key: key.to_string(),
                    component: component.to_string(),
                };
            }
        }
        Resolution::Unresolved {
            original: label.to_string(),
        }
    }
}
