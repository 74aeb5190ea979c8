// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Image classifiers and the findings they produce

pub mod mock;
pub mod vision;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::config::{AppConfig, Backend};
use crate::upload::SelectedInput;
use crate::Result;

pub use mock::MockClassifier;
pub use vision::OllamaClassifier;

/// How serious a finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding of a classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationEntry {
    pub label: String,
    /// Confidence in percent (0-100)
    pub confidence_score: u8,
    pub severity: Severity,
    pub note: String,
}

impl ClassificationEntry {
    /// Build an entry, clamping the score into 0-100
    pub fn new(label: impl Into<String>, confidence_score: u8, severity: Severity, note: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            confidence_score: confidence_score.min(100),
            severity,
            note: note.into(),
        }
    }
}

/// Complete output of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResultSet {
    pub entries: Vec<ClassificationEntry>,
    /// Name of the classifier that produced the entries
    pub classifier: String,
    pub completed_at: DateTime<Utc>,
}

impl AnalysisResultSet {
    pub fn new(classifier: impl Into<String>, entries: Vec<ClassificationEntry>) -> Self {
        Self {
            entries,
            classifier: classifier.into(),
            completed_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Something that can look at an image and report findings.
///
/// Implementations return the whole result set or an error; there are no
/// partial results.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Name of this classifier
    fn name(&self) -> &'static str;

    /// Analyze an image
    async fn analyze(&self, input: &SelectedInput) -> Result<AnalysisResultSet>;
}

/// Build the classifier selected in the configuration
pub fn build_classifier(config: &AppConfig) -> Result<Arc<dyn Classifier>> {
    let classifier: Arc<dyn Classifier> = match config.analysis.backend {
        Backend::Mock => Arc::new(MockClassifier::new(config.analysis.delay())),
        Backend::Ollama => Arc::new(OllamaClassifier::new(&config.ai_engine)?),
    };
    tracing::info!("Using classifier: {}", classifier.name());
    Ok(classifier)
}
