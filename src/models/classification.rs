//! Classifier request and response models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of classifying a piece of text
///
/// Probabilities are taken as the classifier reports them; they are not
/// renormalised and need not sum to exactly one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Predicted category label
    #[serde(default)]
    pub prediction: String,

    /// Probability per category label
    #[serde(default)]
    pub probabilities: BTreeMap<String, f64>,

    /// Human-readable failure message
    #[serde(default, rename = "error", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ClassificationResult {
    /// A successful classification
    pub fn new(prediction: impl Into<String>, probabilities: BTreeMap<String, f64>) -> Self {
        Self {
            prediction: prediction.into(),
            probabilities,
            error_message: None,
        }
    }

    /// A failed classification carrying only a message
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Whether this result represents a failure
    pub fn is_error(&self) -> bool {
        self.error_message.is_some()
    }

    /// Labels ordered by descending probability, ties broken by label
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .probabilities
            .iter()
            .map(|(label, p)| (label.as_str(), *p))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}

/// Request body for the classify endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyRequest<'a> {
    pub text: &'a str,
}

/// Sample text for a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleText {
    pub sample: String,
}

/// Character and word counts of classifier input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextStats {
    pub chars: usize,
    pub words: usize,
}

impl TextStats {
    pub fn of(text: &str) -> Self {
        Self {
            chars: text.chars().count(),
            words: text.split_whitespace().count(),
        }
    }
}
