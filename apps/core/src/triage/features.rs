//! Feature extraction using smoothed TF-IDF.
//!
//! Text is normalized (lowercase, letters only, common misspellings fixed),
//! stop words are removed, and the remaining tokens produce unigram and
//! adjacent-pair terms. The vocabulary is fixed at training time; terms that
//! were never seen contribute nothing.

use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use crate::error::PipelineError;

/// English stop words, removed before pair formation
const STOPWORDS_EN: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "nor", "so", "yet", "for", "of", "i", "you", "he",
    "she", "it", "we", "they", "me", "him", "her", "us", "them", "my", "your", "his", "its",
    "our", "their", "mine", "yours", "hers", "ours", "theirs", "myself", "yourself", "itself",
    "this", "that", "these", "those", "who", "whom", "which", "what", "whose", "is", "am",
    "are", "was", "were", "be", "been", "being", "have", "has", "had", "having", "do", "does",
    "did", "doing", "will", "would", "shall", "should", "can", "could", "may", "might", "must",
    "in", "on", "at", "to", "from", "by", "with", "about", "against", "between", "into",
    "through", "during", "before", "after", "above", "below", "up", "down", "out", "over",
    "under", "again", "further", "here", "there", "where", "when", "why", "how", "all", "each",
    "every", "both", "few", "more", "most", "other", "some", "any", "no", "not", "only", "own",
    "same", "than", "too", "very", "just", "also", "now", "then", "once", "always", "never",
    "if", "because", "as", "until", "while", "although", "though", "yes", "maybe", "im", "ive",
    "dont", "get", "got", "getting", "since", "really", "quite", "lot", "lots", "bit",
];

/// Frequent misspellings mapped to the spelling used in training data
const SPELLING_FIXES: &[(&str, &str)] = &[
    ("fevr", "fever"),
    ("feaver", "fever"),
    ("fevar", "fever"),
    ("astma", "asthma"),
    ("asthama", "asthma"),
    ("diarea", "diarrhea"),
    ("diarrhoea", "diarrhea"),
    ("diarhea", "diarrhea"),
    ("diahrrea", "diarrhea"),
    ("migrane", "migraine"),
    ("migrain", "migraine"),
    ("diabities", "diabetes"),
    ("diabetis", "diabetes"),
    ("headach", "headache"),
    ("stomache", "stomach"),
    ("vomitting", "vomiting"),
    ("coughing", "cough"),
    ("nausia", "nausea"),
    ("breathe", "breath"),
    ("breathing", "breath"),
    ("dizzyness", "dizziness"),
    ("tierd", "tired"),
];

static NON_ALPHA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z\s]+").expect("Invalid regex: non-alphabetic run"));

static STOPWORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOPWORDS_EN.iter().copied().collect());

static SPELLING: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| SPELLING_FIXES.iter().copied().collect());

/// Lowercases, strips everything but `a-z` and whitespace, collapses
/// whitespace and applies the spelling table token by token.
pub fn normalize(text: &str) -> String {
    let lower = text.to_lowercase();
    let letters = NON_ALPHA.replace_all(&lower, " ");
    letters
        .split_whitespace()
        .map(|token| SPELLING.get(token).copied().unwrap_or(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized tokens with stop words and single letters removed
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .filter(|token| token.len() >= 2 && !STOPWORDS.contains(token))
        .map(str::to_string)
        .collect()
}

/// Unigrams followed by adjacent pairs (when `ngram_max >= 2`).
pub fn extract_terms(text: &str, ngram_max: usize) -> Vec<String> {
    let tokens = tokenize(text);
    let mut terms = tokens.clone();
    if ngram_max >= 2 {
        terms.extend(tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
    }
    terms
}

fn smoothed_idf(documents: usize, document_frequency: usize) -> f64 {
    ((1.0 + documents as f64) / (1.0 + document_frequency as f64)).ln() + 1.0
}

/// Sparse, L2-normalized feature vector over a fixed vocabulary
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    dim: usize,
    /// (column, weight) pairs sorted by column
    entries: Vec<(usize, f64)>,
}

impl FeatureVector {
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    /// True when no vocabulary term was present
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn weight(&self, column: usize) -> f64 {
        self.entries
            .binary_search_by_key(&column, |&(c, _)| c)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    /// Dot product against a dense row of the same dimensionality
    pub fn dot(&self, dense: &[f64]) -> f64 {
        self.entries
            .iter()
            .map(|&(column, value)| dense.get(column).map_or(0.0, |w| value * w))
            .sum()
    }
}

/// Vocabulary + IDF weights learned from a training corpus
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    terms: Vec<String>,
    index: HashMap<String, usize>,
    idf: Vec<f64>,
    ngram_max: usize,
}

impl FeatureExtractor {
    /// Learns the vocabulary from `documents`.
    ///
    /// Terms are ranked by total corpus frequency (ties broken
    /// lexicographically) and the top `max_features` are kept. Columns are
    /// then laid out in lexicographic order.
    pub fn fit<S: AsRef<str>>(documents: &[S], max_features: usize, ngram_max: usize) -> Self {
        let mut corpus_frequency: HashMap<String, usize> = HashMap::new();
        let mut document_frequency: HashMap<String, usize> = HashMap::new();

        for document in documents {
            let mut seen = HashSet::new();
            for term in extract_terms(document.as_ref(), ngram_max) {
                *corpus_frequency.entry(term.clone()).or_insert(0) += 1;
                if seen.insert(term.clone()) {
                    *document_frequency.entry(term).or_insert(0) += 1;
                }
            }
        }

        let mut ranked: Vec<(String, usize)> = corpus_frequency.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(max_features);

        let mut terms: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        terms.sort();

        let idf = terms
            .iter()
            .map(|term| {
                let df = document_frequency.get(term).copied().unwrap_or(0);
                smoothed_idf(documents.len(), df)
            })
            .collect();

        let index = terms
            .iter()
            .enumerate()
            .map(|(column, term)| (term.clone(), column))
            .collect();

        Self {
            terms,
            index,
            idf,
            ngram_max,
        }
    }

    /// Rebuilds an extractor from persisted parts, checking their shapes.
    pub fn from_parts(
        terms: Vec<String>,
        idf: Vec<f64>,
        ngram_max: usize,
    ) -> Result<Self, PipelineError> {
        if terms.len() != idf.len() {
            return Err(PipelineError::ModelUnavailable(format!(
                "vocabulary has {} terms but {} idf weights",
                terms.len(),
                idf.len()
            )));
        }
        if !(1..=2).contains(&ngram_max) {
            return Err(PipelineError::ModelUnavailable(format!(
                "unsupported n-gram range: {}",
                ngram_max
            )));
        }
        let mut index = HashMap::with_capacity(terms.len());
        for (column, term) in terms.iter().enumerate() {
            if index.insert(term.clone(), column).is_some() {
                return Err(PipelineError::ModelUnavailable(format!(
                    "duplicate vocabulary term '{}'",
                    term
                )));
            }
        }
        Ok(Self {
            terms,
            index,
            idf,
            ngram_max,
        })
    }

    /// Maps text onto the fixed vocabulary. Never fails: unknown text yields
    /// an all-zero vector of the same dimensionality. Term frequency is
    /// sublinear, `1 + ln(tf)`.
    pub fn transform(&self, text: &str) -> FeatureVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in extract_terms(text, self.ngram_max) {
            if let Some(&column) = self.index.get(&term) {
                *counts.entry(column).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(column, tf)| (column, (1.0 + tf.ln()) * self.idf[column]))
            .collect();

        let norm = entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for entry in &mut entries {
                entry.1 /= norm;
            }
        }

        FeatureVector {
            dim: self.terms.len(),
            entries,
        }
    }

    pub fn dim(&self) -> usize {
        self.terms.len()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    pub fn ngram_max(&self) -> usize {
        self.ngram_max
    }

    pub fn column(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }
}
